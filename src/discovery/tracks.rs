use std::{collections::HashMap, sync::Arc};

use crate::{
    error::GatewayError,
    executor::FetchExecutor,
    spotify::{Gateway, MAX_ALBUM_IDS, SpotifyApi},
    types::{ReleaseBundle, ReleaseCandidate, Track},
    warning,
};

const TRACKS_PAGE_SIZE: u32 = 50;

/// Expands releases into bundles with their full track lists.
///
/// Albums are requested 20 at a time on the executor. Albums with more tracks
/// than the first page holds are paged individually. Bundles come back in the
/// order of `releases`; a release whose album could not be fetched is left out.
pub async fn resolve_tracks(
    api: Arc<dyn SpotifyApi>,
    gateway: &Gateway,
    executor: &FetchExecutor,
    releases: Vec<ReleaseCandidate>,
) -> Vec<ReleaseBundle> {
    let tasks = releases
        .chunks(MAX_ALBUM_IDS)
        .map(|chunk| {
            let api = Arc::clone(&api);
            let gateway = gateway.clone();
            let ids = chunk.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
            async move { album_tracks(api.as_ref(), &gateway, ids).await }
        })
        .collect::<Vec<_>>();

    let mut tracks_by_album = executor
        .submit_all("track resolution", tasks)
        .await
        .into_iter()
        .flatten()
        .collect::<HashMap<_, _>>();

    let mut missing = 0;
    let bundles = releases
        .into_iter()
        .filter_map(|release| match tracks_by_album.remove(&release.id) {
            Some(tracks) => Some(ReleaseBundle::new(release, tracks)),
            None => {
                missing += 1;
                None
            }
        })
        .collect();

    if missing > 0 {
        warning!("{} releases could not be resolved to tracks", missing);
    }

    bundles
}

async fn album_tracks(
    api: &dyn SpotifyApi,
    gateway: &Gateway,
    ids: Vec<String>,
) -> Result<Vec<(String, Vec<Track>)>, GatewayError> {
    let albums = gateway.call(|| api.get_several_albums(&ids)).await?;

    let mut resolved = Vec::with_capacity(albums.len());
    for album in albums {
        let mut tracks = album.tracks.items;
        if album.tracks.next.is_some() {
            let rest = gateway
                .page_until(
                    tracks.len() as u32,
                    |offset| api.get_album_tracks(&album.id, TRACKS_PAGE_SIZE, offset),
                    |_| false,
                )
                .await?;
            tracks.extend(rest);
        }
        resolved.push((album.id, tracks));
    }

    Ok(resolved)
}
