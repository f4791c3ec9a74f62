use std::{collections::BTreeSet, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use sporlradar::config::Config;
use sporlradar::discovery::ArtistCache;
use sporlradar::error::CrawlError;
use sporlradar::management::{
    ArtistStore, CacheWriter, PlaylistState, PlaylistStore, ReleaseStore, StateFile, targets_from,
};
use sporlradar::spotify::Gateway;
use sporlradar::types::{ArtistCacheSnapshot, ExtendedCategory};
use tempfile::TempDir;

mod common;

use common::{FakeSpotify, artist, at};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Sample {
    name: String,
    count: u32,
}

fn spawn_writer(dir: &TempDir) -> CacheWriter {
    CacheWriter::spawn(
        ReleaseStore::new(dir.path()),
        ArtistStore::new(dir.path()),
        PlaylistStore::new(dir.path()),
    )
}

#[tokio::test]
async fn test_state_file_missing_reads_none() {
    let dir = TempDir::new().unwrap();
    let file = StateFile::new(dir.path(), "state/missing.json");

    let loaded: Option<Sample> = file.load().await.unwrap();

    assert!(loaded.is_none());
}

#[tokio::test]
async fn test_state_file_creates_directories() {
    let dir = TempDir::new().unwrap();
    let file = StateFile::new(dir.path(), "deeply/nested/sample.json");
    let sample = Sample {
        name: "radar".to_string(),
        count: 3,
    };

    file.persist(&sample).await.unwrap();

    assert!(file.path().is_file());
    assert_eq!(file.load::<Sample>().await.unwrap(), Some(sample));
}

#[tokio::test]
async fn test_state_file_corrupt_is_an_error() {
    let dir = TempDir::new().unwrap();
    let file = StateFile::new(dir.path(), "broken.json");
    std::fs::write(file.path(), "{ not json").unwrap();

    assert!(file.load::<Sample>().await.is_err());
}

#[tokio::test]
async fn test_release_store_appends_as_union() {
    let dir = TempDir::new().unwrap();
    let store = ReleaseStore::new(dir.path());

    store
        .append_ids(&["b".to_string(), "a".to_string()])
        .await
        .unwrap();
    store
        .append_ids(&["a".to_string(), "c".to_string()])
        .await
        .unwrap();
    store.append_names(&["single|x|y".to_string()]).await.unwrap();

    assert_eq!(
        store.load_ids().await.unwrap(),
        BTreeSet::from(["a".to_string(), "b".to_string(), "c".to_string()])
    );
    assert_eq!(
        store.load_names().await.unwrap(),
        BTreeSet::from(["single|x|y".to_string()])
    );
}

#[tokio::test]
async fn test_release_store_empty_append_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = ReleaseStore::new(dir.path());

    store.append_ids(&[]).await.unwrap();

    assert!(!dir.path().join("state/release_ids.json").exists());
    assert!(store.load_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cache_writer_applies_queued_writes_on_flush() {
    let dir = TempDir::new().unwrap();
    let writer = spawn_writer(&dir);
    let now = at(2024, 1, 10, 12);

    writer.release_ids(vec!["r1".to_string()]);
    writer.release_names(vec!["album|a|b".to_string()]);
    writer.artists(ArtistCacheSnapshot {
        ids: BTreeSet::from(["a1".to_string()]),
        fetched_at: now,
    });
    writer.playlist_updated(ExtendedCategory::Single, "p1", now);
    writer.flush().await;

    let releases = ReleaseStore::new(dir.path());
    assert!(releases.load_ids().await.unwrap().contains("r1"));
    assert!(releases.load_names().await.unwrap().contains("album|a|b"));

    let artists = ArtistStore::new(dir.path()).load().await.unwrap().unwrap();
    assert_eq!(artists.fetched_at, now);

    let playlists = PlaylistStore::new(dir.path()).load().await.unwrap();
    assert_eq!(
        playlists[&ExtendedCategory::Single],
        PlaylistState {
            playlist_id: "p1".to_string(),
            last_update: Some(now),
        }
    );
}

#[tokio::test]
async fn test_playlist_targets_prefer_configuration() {
    let dir = TempDir::new().unwrap();
    let store = PlaylistStore::new(dir.path());
    let now = at(2024, 1, 10, 12);
    store
        .record_update(ExtendedCategory::Single, "remembered_single", now)
        .await
        .unwrap();
    store
        .record_update(ExtendedCategory::Album, "remembered_album", now)
        .await
        .unwrap();

    let mut config = Config::new(dir.path().to_path_buf());
    config
        .playlists
        .insert(ExtendedCategory::Album, "configured_album".to_string());

    let targets = store.targets(&config).await.unwrap();
    let playlist_of = |category: ExtendedCategory| {
        targets
            .iter()
            .find(|t| t.category == category)
            .and_then(|t| t.playlist_id.clone())
    };

    assert_eq!(targets.len(), ExtendedCategory::ALL.len());
    assert_eq!(playlist_of(ExtendedCategory::Album).as_deref(), Some("configured_album"));
    assert_eq!(playlist_of(ExtendedCategory::Single).as_deref(), Some("remembered_single"));
    assert_eq!(playlist_of(ExtendedCategory::Live), None);
    assert!(targets.iter().all(|t| !t.is_new()));
}

#[test]
fn test_targets_from_empty_state() {
    let config = Config::new(std::env::temp_dir());

    let targets = targets_from(&config, &Default::default());

    assert!(targets.iter().all(|t| t.playlist_id.is_none()));
}

fn artist_cache(dir: &TempDir, writer: CacheWriter) -> ArtistCache {
    ArtistCache::new(
        ArtistStore::new(dir.path()),
        writer,
        chrono::Duration::hours(24),
    )
}

#[tokio::test]
async fn test_artist_cache_respects_ttl() {
    let dir = TempDir::new().unwrap();
    let fake = Arc::new(FakeSpotify::new());
    fake.follow(artist("a1", "One"));
    fake.follow(artist("a2", "Two"));
    let gateway = Gateway::new(Duration::from_secs(1));
    let cache = artist_cache(&dir, spawn_writer(&dir));
    let now = at(2024, 1, 10, 12);

    let first = cache.followed_artists(fake.as_ref(), &gateway, now).await.unwrap();
    assert_eq!(first.all_ids, vec!["a1", "a2"]);
    assert_eq!(first.newly_added_ids, vec!["a1", "a2"]);

    // Within the TTL the cached list is served without a remote call
    fake.follow(artist("a3", "Three"));
    let cached = cache
        .followed_artists(fake.as_ref(), &gateway, now + chrono::Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(cached.all_ids, vec!["a1", "a2"]);
    assert!(cached.newly_added_ids.is_empty());
    assert_eq!(fake.calls("get_followed_artists"), 1);

    // After the TTL only the difference counts as newly followed
    let refreshed = cache
        .followed_artists(fake.as_ref(), &gateway, now + chrono::Duration::hours(25))
        .await
        .unwrap();
    assert_eq!(refreshed.all_ids, vec!["a1", "a2", "a3"]);
    assert_eq!(refreshed.newly_added_ids, vec!["a3"]);
}

#[tokio::test]
async fn test_artist_cache_survives_restart() {
    let dir = TempDir::new().unwrap();
    let fake = Arc::new(FakeSpotify::new());
    fake.follow(artist("a1", "One"));
    let gateway = Gateway::new(Duration::from_secs(1));
    let now = at(2024, 1, 10, 12);

    let writer = spawn_writer(&dir);
    let cache = artist_cache(&dir, writer.clone());
    cache.followed_artists(fake.as_ref(), &gateway, now).await.unwrap();
    writer.flush().await;

    let restarted = artist_cache(&dir, spawn_writer(&dir));
    let followed = restarted
        .followed_artists(fake.as_ref(), &gateway, now + chrono::Duration::hours(2))
        .await
        .unwrap();

    assert_eq!(followed.all_ids, vec!["a1"]);
    assert_eq!(fake.calls("get_followed_artists"), 1);
}

#[tokio::test]
async fn test_artist_cache_empty_follow_list() {
    let dir = TempDir::new().unwrap();
    let fake = FakeSpotify::new();
    let cache = artist_cache(&dir, spawn_writer(&dir));

    let result = cache
        .followed_artists(&fake, &Gateway::new(Duration::from_secs(1)), at(2024, 1, 10, 12))
        .await;

    assert!(matches!(result, Err(CrawlError::EmptyResult(_))));
}
