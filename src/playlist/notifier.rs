use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    error::GatewayError,
    spotify::{Gateway, MAX_PLAYLIST_ITEMS, SpotifyApi},
    types::PlaylistTarget,
    utils,
};

/// Marker prefixed to the title of a playlist with unheard additions.
pub const NEW_GLYPH: &str = "🆕";
pub const DISCOVERY_PREFIX: &str = "Last Discovery: ";

/// Drives the "new content" indicator of the managed playlists.
///
/// A target is either off (`last_new_marker == None`) or new. A successful
/// write turns it new; it turns off again once the marker is older than the
/// timeout, or when the user is found listening to one of the recently added
/// tracks.
pub struct Notifier {
    api: Arc<dyn SpotifyApi>,
    gateway: Gateway,
    timeout: chrono::Duration,
}

impl Notifier {
    pub fn new(api: Arc<dyn SpotifyApi>, gateway: Gateway, timeout: chrono::Duration) -> Self {
        Self {
            api,
            gateway,
            timeout,
        }
    }

    /// Restores the marker of a target from its playlist after a restart.
    ///
    /// Only a title carrying the glyph together with a parseable discovery
    /// stamp counts as new.
    pub async fn seed(&self, target: &mut PlaylistTarget) -> Result<(), GatewayError> {
        let Some(playlist_id) = target.playlist_id.as_deref() else {
            return Ok(());
        };

        let api = self.api.as_ref();
        let playlist = self.gateway.call(|| api.get_playlist(playlist_id)).await?;
        target.last_new_marker = if has_glyph(&playlist.name) {
            discovery_stamp(&playlist.description)
        } else {
            None
        };
        Ok(())
    }

    /// Off → New, or a stamp refresh of a target that is already new.
    pub async fn mark_new(
        &self,
        target: &mut PlaylistTarget,
        now: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let Some(playlist_id) = target.playlist_id.as_deref() else {
            return Ok(());
        };

        let api = self.api.as_ref();
        let playlist = self.gateway.call(|| api.get_playlist(playlist_id)).await?;
        let name = with_glyph(&playlist.name);
        let description = stamp_description(&playlist.description, now);
        self.gateway
            .call(|| api.change_playlist_details(playlist_id, Some(&name), Some(&description)))
            .await?;

        target.last_new_marker = Some(now);
        Ok(())
    }

    /// New → Off. The discovery stamp stays in the description.
    pub async fn clear(&self, target: &mut PlaylistTarget) -> Result<(), GatewayError> {
        if let Some(playlist_id) = target.playlist_id.as_deref() {
            let api = self.api.as_ref();
            let playlist = self.gateway.call(|| api.get_playlist(playlist_id)).await?;
            if has_glyph(&playlist.name) {
                let name = without_glyph(&playlist.name);
                self.gateway
                    .call(|| api.change_playlist_details(playlist_id, Some(&name), None))
                    .await?;
            }
        }

        target.last_new_marker = None;
        Ok(())
    }

    /// Turns off every target that should no longer show the marker.
    ///
    /// Expired targets are cleared first. The currently playing track is only
    /// looked up when a marker is left after that. Returns the number of
    /// targets cleared.
    pub async fn sweep(
        &self,
        targets: &mut [PlaylistTarget],
        now: DateTime<Utc>,
    ) -> Result<usize, GatewayError> {
        let mut cleared = 0;

        for target in targets.iter_mut() {
            if target
                .last_new_marker
                .is_some_and(|marker| now - marker > self.timeout)
            {
                self.clear(target).await?;
                cleared += 1;
            }
        }

        if !targets.iter().any(PlaylistTarget::is_new) {
            return Ok(cleared);
        }

        let api = self.api.as_ref();
        let Some(playing) = self.gateway.call(|| api.get_currently_playing()).await? else {
            return Ok(cleared);
        };

        let window_start = now - self.timeout;
        for target in targets.iter_mut().filter(|t| t.is_new()) {
            let Some(playlist_id) = target.playlist_id.clone() else {
                continue;
            };
            if self.recently_added(&playlist_id, window_start).await?.contains(&playing) {
                self.clear(target).await?;
                cleared += 1;
            }
        }

        Ok(cleared)
    }

    /// Track ids added to the playlist at or after `since`.
    ///
    /// New tracks are inserted at the top, so paging from the start stops at
    /// the first page reaching past the window.
    async fn recently_added(
        &self,
        playlist_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<String>, GatewayError> {
        let api = self.api.as_ref();
        let mut ids = Vec::new();
        let mut offset = 0;

        loop {
            let page = self
                .gateway
                .call(|| api.get_playlist_items(playlist_id, MAX_PLAYLIST_ITEMS as u32, offset))
                .await?;
            let mut reached_older = false;
            for item in &page.items {
                match item.added_at {
                    Some(added_at) if added_at >= since => {
                        ids.extend(item.track_id.clone());
                    }
                    _ => reached_older = true,
                }
            }

            offset += page.items.len() as u32;
            if reached_older || page.next.is_none() || page.items.is_empty() {
                break;
            }
        }

        Ok(ids)
    }
}

pub fn has_glyph(name: &str) -> bool {
    name.starts_with(NEW_GLYPH)
}

pub fn with_glyph(name: &str) -> String {
    if has_glyph(name) {
        name.to_string()
    } else {
        format!("{} {}", NEW_GLYPH, name)
    }
}

pub fn without_glyph(name: &str) -> String {
    name.trim_start_matches(NEW_GLYPH).trim_start().to_string()
}

/// Replaces the discovery stamp of a description, or appends one.
pub fn stamp_description(description: &str, now: DateTime<Utc>) -> String {
    let base = match description.find(DISCOVERY_PREFIX) {
        Some(index) => description[..index].trim_end(),
        None => description.trim_end(),
    };
    let stamp = format!(
        "{}{}",
        DISCOVERY_PREFIX,
        utils::format_discovery_timestamp(now)
    );

    if base.is_empty() {
        stamp
    } else {
        format!("{} {}", base, stamp)
    }
}

pub fn discovery_stamp(description: &str) -> Option<DateTime<Utc>> {
    let index = description.find(DISCOVERY_PREFIX)?;
    let rest = &description[index + DISCOVERY_PREFIX.len()..];
    let end = rest.find(" UTC")? + " UTC".len();
    utils::parse_discovery_timestamp(&rest[..end])
}
