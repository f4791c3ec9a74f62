//! Release candidate filters, applied in a fixed order by the crawler:
//!
//! 1. [`drop_cached`] - releases seen by an earlier crawl
//! 2. [`drop_duplicates`] - the same release under several album ids
//! 3. [`drop_outdated`] - releases older than the lookback window
//! 4. [`resolve_provenance`] - turns appears-on placeholders into `(via Name)` credits
//! 5. [`filter_appears_on`] - optional, after track resolution

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;

use crate::{
    error::GatewayError,
    spotify::{Gateway, MAX_ARTIST_IDS, SpotifyApi},
    types::{AlbumGroup, ArtistCredit, ReleaseBundle, ReleaseCandidate},
    utils,
};

pub const VARIOUS_ARTISTS_ID: &str = "0LyfQWJT6nXafLPZqxe9Of";
pub const VARIOUS_ARTISTS_NAME: &str = "Various Artists";

/// Drops candidates whose id is in the release id cache.
///
/// The ids of the survivors are appended to `seen`, whatever later filters
/// decide, so the same album is never evaluated twice.
pub fn drop_cached(
    candidates: Vec<ReleaseCandidate>,
    cached_ids: &BTreeSet<String>,
    seen: &mut Vec<String>,
) -> Vec<ReleaseCandidate> {
    candidates
        .into_iter()
        .filter(|c| !cached_ids.contains(&c.id))
        .inspect(|c| seen.push(c.id.clone()))
        .collect()
}

/// Keeps the first candidate per duplicate key.
///
/// Keys already in the release name cache are dropped as well. Surviving keys
/// are appended to `seen`.
pub fn drop_duplicates(
    candidates: Vec<ReleaseCandidate>,
    cached_names: &BTreeSet<String>,
    seen: &mut Vec<String>,
) -> Vec<ReleaseCandidate> {
    let mut keys = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| {
            let key = c.dedup_key();
            if cached_names.contains(&key) || !keys.insert(key.clone()) {
                return false;
            }
            seen.push(key);
            true
        })
        .collect()
}

/// Drops candidates released before the lookback window.
///
/// With re-release separation enabled albums pass unchecked; the re-release
/// classifier needs to see old albums to route them.
pub fn drop_outdated(
    candidates: Vec<ReleaseCandidate>,
    today: NaiveDate,
    lookback_days: u32,
    separate_rereleases: bool,
) -> Vec<ReleaseCandidate> {
    candidates
        .into_iter()
        .filter(|c| {
            (separate_rereleases && c.group == AlbumGroup::Album)
                || utils::is_within_lookback(&c.release_date, c.date_precision, today, lookback_days)
        })
        .collect()
}

/// Resolves the provenance placeholders of appears-on releases.
///
/// Origin artist ids are looked up 50 at a time; each placeholder becomes
/// `{id: origin, name: "(via Name)"}`. Placeholders whose artist cannot be
/// found are removed from the credit list.
pub async fn resolve_provenance(
    api: &dyn SpotifyApi,
    gateway: &Gateway,
    mut candidates: Vec<ReleaseCandidate>,
) -> Result<Vec<ReleaseCandidate>, GatewayError> {
    let origin_ids = candidates
        .iter()
        .flat_map(|c| c.artists.iter())
        .filter_map(|a| a.via.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();

    let mut names = HashMap::new();
    for batch in origin_ids.chunks(MAX_ARTIST_IDS) {
        let artists = gateway.call(|| api.get_several_artists(batch)).await?;
        names.extend(artists.into_iter().map(|a| (a.id, a.name)));
    }

    for candidate in candidates.iter_mut() {
        candidate.artists = std::mem::take(&mut candidate.artists)
            .into_iter()
            .filter_map(|credit| {
                if !credit.is_placeholder() {
                    return Some(credit);
                }
                credit.via.and_then(|origin| {
                    names
                        .get(&origin)
                        .map(|name| ArtistCredit::new(&origin, &format!("(via {})", name)))
                })
            })
            .collect();
    }

    Ok(candidates)
}

/// Narrows appears-on bundles to the tracks of followed artists.
///
/// Releases whose primary artist is "Various Artists" are dropped entirely.
/// Other bundles keep only tracks crediting a followed artist; a bundle left
/// without tracks stays as an empty no-op.
pub fn filter_appears_on(
    bundles: Vec<ReleaseBundle>,
    followed: &HashSet<String>,
) -> Vec<ReleaseBundle> {
    bundles
        .into_iter()
        .filter(|b| !is_various_artists(&b.release))
        .map(|mut bundle| {
            bundle.tracks.retain(|track| {
                track
                    .artists
                    .iter()
                    .filter_map(|a| a.id.as_ref())
                    .any(|id| followed.contains(id))
            });
            bundle
        })
        .collect()
}

fn is_various_artists(release: &ReleaseCandidate) -> bool {
    release.credited_artists().next().is_some_and(|primary| {
        primary.id.as_deref() == Some(VARIOUS_ARTISTS_ID) || primary.name == VARIOUS_ARTISTS_NAME
    })
}
