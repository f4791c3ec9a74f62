use std::{sync::Arc, time::Duration};

use crate::{
    error::GatewayError,
    spotify::{Gateway, MAX_PLAYLIST_ITEMS, SpotifyApi},
    types::PositionedItem,
    warning,
};

/// Maximum number of items Spotify allows in a playlist.
pub const PLAYLIST_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written { tracks: usize, evicted: usize },
    /// Nothing to insert.
    Skipped,
    /// The tracks do not fit: circular fitting is disabled or the eviction
    /// fell short.
    Rejected { current: usize, incoming: usize },
}

/// Inserts new tracks at the top of a playlist.
///
/// When the playlist would grow beyond [`PLAYLIST_CAPACITY`] the oldest items
/// at the bottom are evicted first, or the write is rejected as a whole if
/// circular fitting is disabled. Nothing is inserted before enough room has
/// been made.
pub struct PlaylistWriter {
    api: Arc<dyn SpotifyApi>,
    gateway: Gateway,
    circular_fitting: bool,
    insert_cooldown: Duration,
}

impl PlaylistWriter {
    pub fn new(
        api: Arc<dyn SpotifyApi>,
        gateway: Gateway,
        circular_fitting: bool,
        insert_cooldown: Duration,
    ) -> Self {
        Self {
            api,
            gateway,
            circular_fitting,
            insert_cooldown,
        }
    }

    pub async fn write(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<WriteOutcome, GatewayError> {
        if uris.is_empty() {
            return Ok(WriteOutcome::Skipped);
        }

        let api = self.api.as_ref();
        let playlist = self.gateway.call(|| api.get_playlist(playlist_id)).await?;
        let current = playlist.total_tracks as usize;
        let mut uris = uris;
        let mut evicted = 0;

        if current + uris.len() > PLAYLIST_CAPACITY {
            if !self.circular_fitting {
                warning!(
                    "Playlist {} holds {} tracks, {} more do not fit",
                    playlist_id,
                    current,
                    uris.len()
                );
                return Ok(WriteOutcome::Rejected {
                    current,
                    incoming: uris.len(),
                });
            }

            if uris.len() > PLAYLIST_CAPACITY {
                warning!(
                    "Only the first {} of {} tracks fit into playlist {}",
                    PLAYLIST_CAPACITY,
                    uris.len(),
                    playlist_id
                );
                uris = &uris[..PLAYLIST_CAPACITY];
            }

            let excess = current + uris.len() - PLAYLIST_CAPACITY;
            let (removed, remaining) = self
                .evict_bottom(playlist_id, current, excess, playlist.snapshot_id)
                .await?;
            if remaining > 0 {
                warning!(
                    "Could only evict {} of {} items from playlist {}, not inserting",
                    removed,
                    excess,
                    playlist_id
                );
                return Ok(WriteOutcome::Rejected {
                    current: current - removed,
                    incoming: uris.len(),
                });
            }
            evicted = removed;
        }

        for (index, batch) in uris.chunks(MAX_PLAYLIST_ITEMS).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.insert_cooldown).await;
            }
            let position = (index * MAX_PLAYLIST_ITEMS) as u32;
            self.gateway
                .call(|| api.add_playlist_items(playlist_id, batch, position))
                .await?;
        }

        Ok(WriteOutcome::Written {
            tracks: uris.len(),
            evicted,
        })
    }

    /// Removes `excess` items from the bottom, at most 100 per request.
    ///
    /// Returns the number of evicted items and the excess still left when the
    /// playlist ran out of items before enough room was made.
    async fn evict_bottom(
        &self,
        playlist_id: &str,
        mut total: usize,
        mut excess: usize,
        mut snapshot_id: String,
    ) -> Result<(usize, usize), GatewayError> {
        let api = self.api.as_ref();
        let mut evicted = 0;

        while excess > 0 && total > 0 {
            let count = excess.min(MAX_PLAYLIST_ITEMS).min(total);
            let offset = total - count;
            let page = self
                .gateway
                .call(|| api.get_playlist_items(playlist_id, count as u32, offset as u32))
                .await?;
            if page.items.is_empty() {
                break;
            }

            let items = page
                .items
                .into_iter()
                .enumerate()
                .map(|(i, item)| PositionedItem {
                    uri: item.uri,
                    positions: vec![(offset + i) as u32],
                })
                .collect::<Vec<_>>();
            let next_snapshot = self
                .gateway
                .call(|| api.remove_playlist_items(playlist_id, &items, Some(&snapshot_id)))
                .await?;
            snapshot_id = next_snapshot;

            total -= items.len();
            excess = excess.saturating_sub(items.len());
            evicted += items.len();
        }

        Ok((evicted, excess))
    }
}
