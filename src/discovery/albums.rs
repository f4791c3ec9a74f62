use std::{collections::HashSet, sync::Arc};

use crate::{
    error::GatewayError,
    executor::FetchExecutor,
    spotify::{Gateway, SpotifyApi},
    types::{AlbumGroup, ArtistCredit, Page, ReleaseCandidate},
};

const ALBUMS_PAGE_SIZE: u32 = 50;

/// Lists the releases of every artist, fanned out over the executor.
///
/// The same album found through several artists is kept once, at its first
/// occurrence in artist order.
pub async fn discover_releases(
    api: Arc<dyn SpotifyApi>,
    gateway: &Gateway,
    executor: &FetchExecutor,
    artist_ids: &[String],
    market: Option<&str>,
) -> Vec<ReleaseCandidate> {
    let tasks = artist_ids
        .iter()
        .map(|artist_id| {
            let api = Arc::clone(&api);
            let gateway = gateway.clone();
            let artist_id = artist_id.clone();
            let market = market.map(str::to_string);
            async move { artist_releases(api.as_ref(), &gateway, &artist_id, market.as_deref()).await }
        })
        .collect::<Vec<_>>();

    let per_artist = executor.submit_all("album discovery", tasks).await;

    let mut seen = HashSet::new();
    per_artist
        .into_iter()
        .flatten()
        .filter(|release| seen.insert(release.id.clone()))
        .collect()
}

/// Pages through one artist's releases across all album groups.
///
/// Spotify sorts the listing by group with appears-on last. Once a page opens
/// with an appears-on release, that page is kept and paging stops; any
/// appears-on releases further down are not fetched.
///
/// Appears-on releases get a provenance placeholder naming `artist_id` as
/// their last artist credit.
pub async fn artist_releases(
    api: &dyn SpotifyApi,
    gateway: &Gateway,
    artist_id: &str,
    market: Option<&str>,
) -> Result<Vec<ReleaseCandidate>, GatewayError> {
    let releases = gateway
        .page_until(
            0,
            |offset| {
                api.get_artist_albums(artist_id, &AlbumGroup::ALL, market, ALBUMS_PAGE_SIZE, offset)
            },
            |page: &Page<ReleaseCandidate>| {
                page.items
                    .first()
                    .is_some_and(|r| r.group == AlbumGroup::AppearsOn)
            },
        )
        .await?
        .into_iter()
        .map(|mut release| {
            if release.group == AlbumGroup::AppearsOn {
                release.artists.push(ArtistCredit::placeholder(artist_id));
            }
            release
        })
        .collect();

    Ok(releases)
}
