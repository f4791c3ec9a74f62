#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sporlradar::{
    error::ApiError,
    spotify::SpotifyApi,
    types::{
        AlbumGroup, AlbumTracks, Artist, ArtistCredit, AudioFeatures, DatePrecision, Page,
        PlaylistInfo, PlaylistItem, PositionedItem, ReleaseBundle, ReleaseCandidate, Track,
    },
};
use tokio::sync::Notify;

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn artist(id: &str, name: &str) -> Artist {
    Artist {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn release(id: &str, name: &str, group: AlbumGroup, date: &str, artist_name: &str) -> ReleaseCandidate {
    let precision = match date.split('-').count() {
        1 => DatePrecision::Year,
        2 => DatePrecision::Month,
        _ => DatePrecision::Day,
    };
    ReleaseCandidate {
        id: id.to_string(),
        name: name.to_string(),
        group,
        release_date: date.to_string(),
        date_precision: precision,
        artists: vec![ArtistCredit::new(
            &format!("{}-id", artist_name.to_lowercase().replace(' ', "-")),
            artist_name,
        )],
    }
}

pub fn track(id: &str, name: &str, duration_ms: u64) -> Track {
    Track {
        id: id.to_string(),
        name: name.to_string(),
        uri: format!("spotify:track:{}", id),
        duration_ms,
        artists: vec![ArtistCredit::new("artist-id", "Artist")],
        available_markets: ["DE".to_string()].into_iter().collect(),
    }
}

/// `count` tracks of `minutes` each, ids prefixed with `prefix`.
pub fn tracks(prefix: &str, count: usize, minutes: u64) -> Vec<Track> {
    (0..count)
        .map(|i| track(&format!("{}{}", prefix, i), &format!("Track {}", i), minutes * 60_000))
        .collect()
}

pub fn bundle(release: ReleaseCandidate, tracks: Vec<Track>) -> ReleaseBundle {
    ReleaseBundle::new(release, tracks)
}

#[derive(Debug, Clone)]
pub struct FakePlaylist {
    pub name: String,
    pub description: String,
    pub items: Vec<PlaylistItem>,
    pub snapshot: u32,
    /// Items counted in the reported total but never served.
    pub phantom: usize,
}

impl FakePlaylist {
    pub fn uris(&self) -> Vec<String> {
        self.items.iter().map(|i| i.uri.clone()).collect()
    }
}

/// In-memory stand-in for the Spotify Web API.
///
/// Artist listings, albums and playlists are seeded by the tests; playlist
/// mutations are applied to the in-memory state so tests can inspect the
/// result. Every call is recorded by operation name.
#[derive(Default)]
pub struct FakeSpotify {
    followed: Mutex<Vec<Artist>>,
    directory: Mutex<HashMap<String, Artist>>,
    listings: Mutex<HashMap<String, Vec<ReleaseCandidate>>>,
    albums: Mutex<HashMap<String, Vec<Track>>>,
    liveness: Mutex<HashMap<String, f32>>,
    playlists: Mutex<HashMap<String, FakePlaylist>>,
    playing: Mutex<Option<String>>,
    clock: Mutex<Option<DateTime<Utc>>>,
    failures: Mutex<HashMap<&'static str, VecDeque<ApiError>>>,
    followed_gate: Mutex<Option<Arc<Notify>>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeSpotify {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn follow(&self, artist: Artist) {
        self.directory
            .lock()
            .unwrap()
            .insert(artist.id.clone(), artist.clone());
        self.followed.lock().unwrap().push(artist);
    }

    pub fn unfollow_all(&self) {
        self.followed.lock().unwrap().clear();
    }

    pub fn add_release(&self, artist_id: &str, release: ReleaseCandidate, tracks: Vec<Track>) {
        self.albums
            .lock()
            .unwrap()
            .insert(release.id.clone(), tracks);
        self.listings
            .lock()
            .unwrap()
            .entry(artist_id.to_string())
            .or_default()
            .push(release);
    }

    pub fn set_liveness(&self, track_id: &str, liveness: f32) {
        self.liveness
            .lock()
            .unwrap()
            .insert(track_id.to_string(), liveness);
    }

    /// A playlist with `size` filler items, oldest at the bottom.
    pub fn add_playlist(&self, id: &str, name: &str, size: usize) {
        let added_at = self.now();
        let items = (0..size)
            .map(|i| PlaylistItem {
                track_id: Some(format!("old{}", i)),
                uri: format!("spotify:track:old{}", i),
                added_at: Some(added_at),
            })
            .collect();
        self.playlists.lock().unwrap().insert(
            id.to_string(),
            FakePlaylist {
                name: name.to_string(),
                description: String::new(),
                items,
                snapshot: 0,
                phantom: 0,
            },
        );
    }

    pub fn set_playlist_details(&self, id: &str, name: &str, description: &str) {
        if let Some(playlist) = self.playlists.lock().unwrap().get_mut(id) {
            playlist.name = name.to_string();
            playlist.description = description.to_string();
        }
    }

    pub fn set_items(&self, id: &str, items: Vec<PlaylistItem>) {
        if let Some(playlist) = self.playlists.lock().unwrap().get_mut(id) {
            playlist.items = items;
        }
    }

    /// Makes the reported total run ahead of the served items.
    pub fn set_phantom_items(&self, id: &str, count: usize) {
        if let Some(playlist) = self.playlists.lock().unwrap().get_mut(id) {
            playlist.phantom = count;
        }
    }

    pub fn playlist(&self, id: &str) -> FakePlaylist {
        self.playlists.lock().unwrap()[id].clone()
    }

    pub fn set_playing(&self, track_id: Option<&str>) {
        *self.playing.lock().unwrap() = track_id.map(str::to_string);
    }

    /// Timestamp given to items added from now on.
    pub fn set_clock(&self, now: DateTime<Utc>) {
        *self.clock.lock().unwrap() = Some(now);
    }

    pub fn fail_next(&self, op: &'static str, error: ApiError) {
        self.failures
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Makes followed-artist requests wait until the returned gate is notified.
    pub fn hold_followed(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.followed_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.lock().unwrap().unwrap_or_else(Utc::now)
    }

    fn enter(&self, op: &'static str) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(op);
        match self.failures.lock().unwrap().get_mut(op).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn with_playlist<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut FakePlaylist) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut playlists = self.playlists.lock().unwrap();
        let playlist = playlists.get_mut(id).ok_or(ApiError::Status(404))?;
        f(playlist)
    }
}

fn page_of<T: Clone>(items: &[T], limit: u32, offset: u32) -> Page<T> {
    let start = (offset as usize).min(items.len());
    let end = (start + limit as usize).min(items.len());
    Page {
        items: items[start..end].to_vec(),
        next: (end < items.len()).then(|| format!("offset={}", end)),
        total: items.len() as u32,
    }
}

#[async_trait]
impl SpotifyApi for FakeSpotify {
    async fn get_followed_artists(
        &self,
        after: Option<String>,
        limit: u32,
    ) -> Result<(Page<Artist>, Option<String>), ApiError> {
        self.enter("get_followed_artists")?;
        let gate = self.followed_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let followed = self.followed.lock().unwrap().clone();
        let start = after.map_or(0, |a| a.parse::<usize>().unwrap());
        let page = page_of(&followed, limit, start as u32);
        let next = page
            .next
            .as_ref()
            .map(|_| (start + page.items.len()).to_string());
        Ok((page, next))
    }

    async fn get_several_artists(&self, ids: &[String]) -> Result<Vec<Artist>, ApiError> {
        self.enter("get_several_artists")?;
        assert!(ids.len() <= 50);
        let directory = self.directory.lock().unwrap();
        Ok(ids.iter().filter_map(|id| directory.get(id).cloned()).collect())
    }

    async fn get_artist_albums(
        &self,
        artist_id: &str,
        _groups: &[AlbumGroup],
        _market: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Page<ReleaseCandidate>, ApiError> {
        self.enter("get_artist_albums")?;
        let listings = self.listings.lock().unwrap();
        let releases = listings.get(artist_id).cloned().unwrap_or_default();
        Ok(page_of(&releases, limit, offset))
    }

    async fn get_several_albums(&self, ids: &[String]) -> Result<Vec<AlbumTracks>, ApiError> {
        self.enter("get_several_albums")?;
        assert!(ids.len() <= 20);
        let albums = self.albums.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| {
                albums.get(id).map(|tracks| AlbumTracks {
                    id: id.clone(),
                    tracks: page_of(tracks, 50, 0),
                })
            })
            .collect())
    }

    async fn get_album_tracks(
        &self,
        album_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<Track>, ApiError> {
        self.enter("get_album_tracks")?;
        let albums = self.albums.lock().unwrap();
        let tracks = albums.get(album_id).ok_or(ApiError::Status(404))?;
        Ok(page_of(tracks, limit, offset))
    }

    async fn get_audio_features(
        &self,
        track_ids: &[String],
    ) -> Result<Vec<AudioFeatures>, ApiError> {
        self.enter("get_audio_features")?;
        let liveness = self.liveness.lock().unwrap();
        Ok(track_ids
            .iter()
            .filter_map(|id| {
                liveness.get(id).map(|l| AudioFeatures {
                    id: id.clone(),
                    liveness: *l,
                })
            })
            .collect())
    }

    async fn get_playlist(&self, playlist_id: &str) -> Result<PlaylistInfo, ApiError> {
        self.enter("get_playlist")?;
        self.with_playlist(playlist_id, |p| {
            Ok(PlaylistInfo {
                id: playlist_id.to_string(),
                name: p.name.clone(),
                description: p.description.clone(),
                total_tracks: (p.items.len() + p.phantom) as u32,
                snapshot_id: format!("snap-{}", p.snapshot),
            })
        })
    }

    async fn get_playlist_items(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<PlaylistItem>, ApiError> {
        self.enter("get_playlist_items")?;
        assert!(limit <= 100);
        self.with_playlist(playlist_id, |p| Ok(page_of(&p.items, limit, offset)))
    }

    async fn change_playlist_details(
        &self,
        playlist_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<(), ApiError> {
        self.enter("change_playlist_details")?;
        self.with_playlist(playlist_id, |p| {
            if let Some(name) = name {
                p.name = name.to_string();
            }
            if let Some(description) = description {
                p.description = description.to_string();
            }
            Ok(())
        })
    }

    async fn add_playlist_items(
        &self,
        playlist_id: &str,
        uris: &[String],
        position: u32,
    ) -> Result<String, ApiError> {
        self.enter("add_playlist_items")?;
        assert!(uris.len() <= 100);
        let added_at = self.now();
        self.with_playlist(playlist_id, |p| {
            let position = position as usize;
            if position > p.items.len() || p.items.len() + uris.len() > 10_000 {
                return Err(ApiError::Status(400));
            }
            for (i, uri) in uris.iter().enumerate() {
                p.items.insert(
                    position + i,
                    PlaylistItem {
                        track_id: uri.strip_prefix("spotify:track:").map(str::to_string),
                        uri: uri.clone(),
                        added_at: Some(added_at),
                    },
                );
            }
            p.snapshot += 1;
            Ok(format!("snap-{}", p.snapshot))
        })
    }

    async fn remove_playlist_items(
        &self,
        playlist_id: &str,
        items: &[PositionedItem],
        snapshot_id: Option<&str>,
    ) -> Result<String, ApiError> {
        self.enter("remove_playlist_items")?;
        assert!(items.len() <= 100);
        self.with_playlist(playlist_id, |p| {
            if snapshot_id != Some(format!("snap-{}", p.snapshot).as_str()) {
                return Err(ApiError::Status(400));
            }
            let mut positions = items
                .iter()
                .flat_map(|i| i.positions.iter().map(move |pos| (*pos as usize, &i.uri)))
                .collect::<Vec<_>>();
            positions.sort_by(|a, b| b.0.cmp(&a.0));
            for (position, uri) in positions {
                if p.items.get(position).map(|i| &i.uri) != Some(uri) {
                    return Err(ApiError::Status(400));
                }
                p.items.remove(position);
            }
            p.snapshot += 1;
            Ok(format!("snap-{}", p.snapshot))
        })
    }

    async fn get_currently_playing(&self) -> Result<Option<String>, ApiError> {
        self.enter("get_currently_playing")?;
        Ok(self.playing.lock().unwrap().clone())
    }
}
