use std::{collections::BTreeSet, sync::Arc, time::Duration};

use chrono::NaiveDate;
use sporlradar::config::Config;
use sporlradar::remap::*;
use sporlradar::spotify::{Gateway, SpotifyApi};
use sporlradar::types::{AlbumGroup, ExtendedCategory, PlaylistTarget, ReleaseBundle};

mod common;

use common::{FakeSpotify, bundle, release, tracks};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
}

fn single(name: &str, track_count: usize, minutes: u64) -> ReleaseBundle {
    bundle(
        release(name, name, AlbumGroup::Single, "2024-01-09", "Artist"),
        tracks(name, track_count, minutes),
    )
}

fn album(name: &str, date: &str) -> ReleaseBundle {
    bundle(
        release(name, name, AlbumGroup::Album, date, "Artist"),
        tracks(name, 10, 4),
    )
}

fn fake_api() -> Arc<dyn SpotifyApi> {
    Arc::new(FakeSpotify::new())
}

#[test]
fn test_ep_by_title() {
    assert!(EpRemapper::is_ep(&single("Night Moves EP", 1, 3)));
    assert!(EpRemapper::is_ep(&single("Night Moves (E.P.)", 1, 3)));
    assert!(EpRemapper::is_ep(&single("Night Moves - E P", 1, 3)));

    // Case-sensitive and bound to whole words
    assert!(!EpRemapper::is_ep(&single("Night Moves ep", 1, 3)));
    assert!(!EpRemapper::is_ep(&single("STEP", 1, 3)));
}

#[test]
fn test_ep_by_shape() {
    // Five short tracks
    assert!(EpRemapper::is_ep(&single("a", 5, 1)));
    // One long track
    assert!(EpRemapper::is_ep(&single("b", 1, 20)));
    // Three tracks reaching ten minutes
    assert!(EpRemapper::is_ep(&single("c", 3, 4)));

    assert!(!EpRemapper::is_ep(&single("d", 4, 2)));
    assert!(!EpRemapper::is_ep(&single("e", 2, 9)));
    assert!(!EpRemapper::is_ep(&single("f", 3, 3)));
}

#[test]
fn test_live_titles() {
    for title in [
        "Songs (Live)",
        "Songs [Live]",
        "Live at Wembley",
        "Live from Berlin",
        "Songs - Live",
        "MTV Unplugged",
        "The Live Sessions",
    ] {
        assert!(LiveRemapper::has_live_title(title), "{}", title);
    }

    for title in ["Alive", "Live Forever", "Oliver", "Lively"] {
        assert!(!LiveRemapper::has_live_title(title), "{}", title);
    }
}

#[test]
fn test_remix_titles() {
    for title in [
        "Song (Remix)",
        "The Remixes",
        "Remixed",
        "Song (RMX)",
        "Song (Reworked)",
        "Song (Re-Edit)",
        "Song (VIP Mix)",
        "Song (Flip)",
    ] {
        assert!(RemixRemapper::has_remix_title(title), "{}", title);
    }

    assert!(!RemixRemapper::has_remix_title("Original Mix"));
    assert!(!RemixRemapper::has_remix_title("Remixology"));
}

#[test]
fn test_remix_by_track_titles() {
    let mut remixes = single("Song", 2, 3);
    remixes.tracks[0].name = "Song (Artist Remix)".to_string();
    remixes.tracks[1].name = "Song (Other Remix)".to_string();
    assert!(RemixRemapper::is_remix(&remixes));

    let mut mixed = remixes.clone();
    mixed.tracks[1].name = "Song".to_string();
    assert!(!RemixRemapper::is_remix(&mixed));

    // An empty bundle is judged by its title only
    let empty = bundle(
        release("e", "Song", AlbumGroup::Single, "2024-01-09", "Artist"),
        vec![],
    );
    assert!(!RemixRemapper::is_remix(&empty));
}

#[test]
fn test_rerelease_titles() {
    for title in [
        "Album (20th Anniversary Edition)",
        "Album (Reissue)",
        "Album (Remastered)",
        "Album (Re-Recorded)",
        "Album (Taylor's Version) Rerecorded",
        "Album - 10 Years",
    ] {
        assert!(ReReleaseRemapper::has_rerelease_title(title), "{}", title);
    }
    assert!(!ReReleaseRemapper::has_rerelease_title("Album"));
}

#[test]
fn test_rerelease_decision_table() {
    use RemapAction::*;

    let table = [
        ((true, true, true), None),
        ((true, true, false), Remap),
        ((true, false, true), None),
        ((true, false, false), Erase),
        ((false, true, true), Remap),
        ((false, true, false), Remap),
        ((false, false, true), Remap),
        ((false, false, false), Erase),
    ];

    for ((normal, complete, recent), expected) in table {
        assert_eq!(
            rerelease_action(normal, complete, recent),
            expected,
            "normal={} complete={} recent={}",
            normal,
            complete,
            recent
        );
    }
}

#[tokio::test]
async fn test_rerelease_classify_uses_market_and_date() {
    let remapper = ReReleaseRemapper::new("DE".to_string(), today(), 3);

    // Old, complete, normal title: a re-release of an old album
    let old = album("old", "2019-05-01");
    assert_eq!(remapper.classify(&old).await, RemapAction::Remap);

    // Old and incomplete in the market: erased
    let mut incomplete = album("partial", "2019-05-01");
    incomplete.tracks[0].available_markets.clear();
    assert_eq!(remapper.classify(&incomplete).await, RemapAction::Erase);

    // New, complete, normal title: a genuine new album
    let fresh = album("fresh", "2024-01-09");
    assert_eq!(remapper.classify(&fresh).await, RemapAction::None);
}

#[tokio::test]
async fn test_live_by_audio_features() {
    let fake = Arc::new(FakeSpotify::new());
    let concert = album("concert", "2024-01-09");
    for track in &concert.tracks {
        fake.set_liveness(&track.id, 0.85);
    }
    let studio = album("studio", "2024-01-09");
    for track in &studio.tracks {
        fake.set_liveness(&track.id, 0.2);
    }

    let api: Arc<dyn SpotifyApi> = fake.clone();
    let remapper = LiveRemapper::new(Some((api, Gateway::new(Duration::from_secs(1)))));

    assert_eq!(remapper.classify(&concert).await, RemapAction::Remap);
    assert_eq!(remapper.classify(&studio).await, RemapAction::None);
    assert_eq!(fake.calls("get_audio_features"), 2);

    // Without audio features only the title counts
    let titles_only = LiveRemapper::new(None);
    assert_eq!(titles_only.classify(&concert).await, RemapAction::None);
}

#[test]
fn test_engine_from_config() {
    let enabled = ExtendedCategory::ALL.into_iter().collect::<BTreeSet<_>>();
    let gateway = Gateway::new(Duration::from_secs(1));
    let mut config = Config::new(std::env::temp_dir());

    let engine = RemapEngine::from_config(&config, &enabled, today(), fake_api(), gateway.clone());
    assert_eq!(engine.len(), 3);

    config.separate_rereleases = true;
    config.market = Some("DE".to_string());
    let engine = RemapEngine::from_config(&config, &enabled, today(), fake_api(), gateway.clone());
    assert_eq!(engine.len(), 4);

    // Re-release separation judges albums even without a re-release playlist
    let singles_only = BTreeSet::from([ExtendedCategory::Single]);
    let engine = RemapEngine::from_config(&config, &singles_only, today(), fake_api(), gateway.clone());
    assert_eq!(engine.len(), 1);

    // Only categories with a playlist get a remapper
    config.separate_rereleases = false;
    let engine = RemapEngine::from_config(&config, &singles_only, today(), fake_api(), gateway);
    assert!(engine.is_empty());
}

#[tokio::test]
async fn test_engine_applies_in_order() {
    let engine = RemapEngine::new(vec![
        Box::new(RemixRemapper),
        Box::new(LiveRemapper::new(None)),
        Box::new(EpRemapper),
    ]);

    let bundles = vec![
        single("Summer Remix EP", 1, 3),
        single("Live at Home", 6, 4),
        single("Five Tracks", 5, 3),
        single("Plain", 1, 3),
        album("Big Album", "2024-01-09"),
    ];
    let mut buckets = bucketize(bundles);
    engine.apply(&mut buckets).await;

    let names = |category: ExtendedCategory| -> Vec<String> {
        buckets
            .get(&category)
            .map(|b| b.iter().map(|b| b.release.name.clone()).collect())
            .unwrap_or_default()
    };

    // Remix runs before EP, Live before EP
    assert_eq!(names(ExtendedCategory::Remix), vec!["Summer Remix EP"]);
    assert_eq!(names(ExtendedCategory::Live), vec!["Live at Home"]);
    assert_eq!(names(ExtendedCategory::Ep), vec!["Five Tracks"]);
    assert_eq!(names(ExtendedCategory::Single), vec!["Plain"]);
    assert_eq!(names(ExtendedCategory::Album), vec!["Big Album"]);
}

#[tokio::test]
async fn test_engine_erases_bundles() {
    let engine = RemapEngine::new(vec![Box::new(ReReleaseRemapper::new(
        "DE".to_string(),
        today(),
        3,
    ))]);

    let mut incomplete = album("Old", "2001-01-01");
    for track in incomplete.tracks.iter_mut() {
        track.available_markets.clear();
    }
    let mut buckets = bucketize(vec![incomplete]);
    engine.apply(&mut buckets).await;

    assert!(buckets.is_empty());
}

#[test]
fn test_bucketize_by_native_group() {
    let buckets = bucketize(vec![
        album("a", "2024-01-09"),
        single("s", 1, 3),
        bundle(
            release("c", "c", AlbumGroup::Compilation, "2024-01-09", "VA"),
            vec![],
        ),
    ]);

    assert_eq!(
        buckets.keys().copied().collect::<Vec<_>>(),
        vec![
            ExtendedCategory::Album,
            ExtendedCategory::Single,
            ExtendedCategory::Compilation
        ]
    );
}

#[test]
fn test_route_merges_shared_playlists_and_sorts_newest_first() {
    let targets = vec![
        PlaylistTarget::new(ExtendedCategory::Album, Some("albums".to_string())),
        PlaylistTarget::new(ExtendedCategory::Single, Some("shorts".to_string())),
        PlaylistTarget::new(ExtendedCategory::Ep, Some("shorts".to_string())),
        PlaylistTarget::new(ExtendedCategory::Remix, None),
    ];

    let older_single = bundle(
        release("s1", "Older", AlbumGroup::Single, "2024-01-07", "A"),
        tracks("s1_", 1, 3),
    );
    let newer_ep = bundle(
        release("e1", "Newer", AlbumGroup::Single, "2024-01-09", "A"),
        tracks("e1_", 5, 3),
    );

    let mut buckets = Buckets::new();
    buckets.insert(ExtendedCategory::Album, vec![album("al", "2024-01-08")]);
    buckets.insert(ExtendedCategory::Single, vec![older_single]);
    buckets.insert(ExtendedCategory::Ep, vec![newer_ep]);
    buckets.insert(ExtendedCategory::Remix, vec![single("r", 1, 3)]);

    let batches = route(buckets, &targets);

    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].playlist_id, "albums");
    assert_eq!(batches[0].track_count(), 10);

    let shorts = &batches[1];
    assert_eq!(shorts.playlist_id, "shorts");
    assert_eq!(
        shorts.categories,
        vec![ExtendedCategory::Single, ExtendedCategory::Ep]
    );
    assert_eq!(shorts.bundles[0].category, ExtendedCategory::Ep);
    assert_eq!(shorts.bundles[1].category, ExtendedCategory::Single);
    assert_eq!(shorts.track_count(), 6);
    assert_eq!(shorts.track_uris()[0], "spotify:track:e1_0");
    assert_eq!(shorts.track_uris()[5], "spotify:track:s1_0");
}
