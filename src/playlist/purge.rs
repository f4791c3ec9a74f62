use chrono::{DateTime, Utc};

use crate::{
    error::GatewayError,
    spotify::{Gateway, MAX_PLAYLIST_ITEMS, SpotifyApi},
    types::PositionedItem,
};

/// Removes every item added to the playlist before `older_than`.
///
/// Items without an `added_at` are kept. Positions are removed from the
/// bottom up in chunks of 100 so the remaining positions stay valid. Returns
/// the number of removed items.
pub async fn purge_expired(
    api: &dyn SpotifyApi,
    gateway: &Gateway,
    playlist_id: &str,
    older_than: DateTime<Utc>,
) -> Result<usize, GatewayError> {
    let items = gateway
        .page_all(|offset| api.get_playlist_items(playlist_id, MAX_PLAYLIST_ITEMS as u32, offset))
        .await?;

    let mut expired = items
        .into_iter()
        .enumerate()
        .filter(|(_, item)| item.added_at.is_some_and(|added_at| added_at < older_than))
        .map(|(position, item)| PositionedItem {
            uri: item.uri,
            positions: vec![position as u32],
        })
        .collect::<Vec<_>>();
    if expired.is_empty() {
        return Ok(0);
    }
    expired.sort_by(|a, b| b.positions.cmp(&a.positions));

    let playlist = gateway.call(|| api.get_playlist(playlist_id)).await?;
    let mut snapshot_id = playlist.snapshot_id;
    for chunk in expired.chunks(MAX_PLAYLIST_ITEMS) {
        let next_snapshot = gateway
            .call(|| api.remove_playlist_items(playlist_id, chunk, Some(&snapshot_id)))
            .await?;
        snapshot_id = next_snapshot;
    }

    Ok(expired.len())
}
