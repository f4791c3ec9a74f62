//! # Spotify Integration Module
//!
//! This module is the only place that talks to the Spotify Web API. It is
//! split into two layers:
//!
//! ```text
//! Pipeline stages (discovery, playlist writer, notifier, ...)
//!          ↓
//! Gateway (retry on 429 / 5xx, paging helpers)
//!          ↓
//! SpotifyApi trait  ←  SpotifyClient (reqwest, bearer token)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## SpotifyApi
//!
//! [`SpotifyApi`] exposes one typed method per remote operation the pipeline
//! needs. Every method performs exactly one HTTP request and reports failures
//! as an [`ApiError`] without retrying, so the retry policy lives in a single
//! place: the [`gateway::Gateway`]. The trait is object safe and used as
//! `Arc<dyn SpotifyApi>`, which lets tests substitute an in-memory fake.
//!
//! ## SpotifyClient
//!
//! [`client::SpotifyClient`] implements the trait on top of `reqwest`. The
//! endpoint groups are implemented in their own files:
//!
//! - [`artists`] - followed artists and several-artists lookups
//! - [`releases`] - artist albums, several albums, album tracks, audio features
//! - [`playlist`] - playlist metadata, items, insertion, removal and the
//!   currently playing track
//!
//! ## Authentication
//!
//! [`auth`] implements the OAuth 2.0 PKCE login flow and token refresh. The
//! client obtains a valid bearer token from the
//! [`crate::management::TokenManager`] before every request; tokens are
//! refreshed four minutes before they expire.
//!
//! ## API Coverage
//!
//! - `GET /me/following` - followed artists, cursor paged
//! - `GET /artists?ids=` - several artists (max 50 ids)
//! - `GET /artists/{id}/albums` - artist discography filtered by group and market
//! - `GET /albums?ids=` - several albums with their first track page (max 20 ids)
//! - `GET /albums/{id}/tracks` - remaining track pages of an album
//! - `GET /audio-features?ids=` - per-track audio features (max 100 ids)
//! - `GET /playlists/{id}` - playlist name, description, size and snapshot
//! - `GET /playlists/{id}/tracks` - playlist items with their `added_at`
//! - `PUT /playlists/{id}` - change name and description
//! - `POST /playlists/{id}/tracks` - insert items at a position
//! - `DELETE /playlists/{id}/tracks` - remove items by explicit position
//! - `GET /me/player/currently-playing` - the track the user is listening to

pub mod artists;
pub mod auth;
pub mod client;
pub mod gateway;
pub mod playlist;
pub mod releases;

use async_trait::async_trait;

use crate::{
    error::ApiError,
    types::{
        AlbumGroup, AlbumTracks, Artist, AudioFeatures, Page, PlaylistInfo, PlaylistItem,
        PositionedItem, ReleaseCandidate, Track,
    },
};

pub use client::SpotifyClient;
pub use gateway::Gateway;

/// Maximum ids per several-artists request.
pub const MAX_ARTIST_IDS: usize = 50;
/// Maximum ids per several-albums request.
pub const MAX_ALBUM_IDS: usize = 20;
/// Maximum ids per audio-features request.
pub const MAX_AUDIO_FEATURE_IDS: usize = 100;
/// Maximum items per playlist insertion or removal request.
pub const MAX_PLAYLIST_ITEMS: usize = 100;

/// Typed access to the remote operations of the Spotify Web API.
///
/// Each call maps to a single request; transient failures are reported as
/// [`ApiError::RateLimited`] or [`ApiError::Server`] and retried by the gateway.
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    /// One page of followed artists, starting after the given cursor.
    async fn get_followed_artists(
        &self,
        after: Option<String>,
        limit: u32,
    ) -> Result<(Page<Artist>, Option<String>), ApiError>;

    async fn get_several_artists(&self, ids: &[String]) -> Result<Vec<Artist>, ApiError>;

    /// One page of an artist's releases across the requested groups.
    async fn get_artist_albums(
        &self,
        artist_id: &str,
        groups: &[AlbumGroup],
        market: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Page<ReleaseCandidate>, ApiError>;

    async fn get_several_albums(&self, ids: &[String]) -> Result<Vec<AlbumTracks>, ApiError>;

    async fn get_album_tracks(
        &self,
        album_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<Track>, ApiError>;

    async fn get_audio_features(&self, track_ids: &[String])
    -> Result<Vec<AudioFeatures>, ApiError>;

    async fn get_playlist(&self, playlist_id: &str) -> Result<PlaylistInfo, ApiError>;

    async fn get_playlist_items(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<PlaylistItem>, ApiError>;

    async fn change_playlist_details(
        &self,
        playlist_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<(), ApiError>;

    /// Inserts the given track uris at `position`; returns the new snapshot id.
    async fn add_playlist_items(
        &self,
        playlist_id: &str,
        uris: &[String],
        position: u32,
    ) -> Result<String, ApiError>;

    /// Removes items at explicit positions; returns the new snapshot id.
    async fn remove_playlist_items(
        &self,
        playlist_id: &str,
        items: &[PositionedItem],
        snapshot_id: Option<&str>,
    ) -> Result<String, ApiError>;

    /// Id of the track currently playing, if any.
    async fn get_currently_playing(&self) -> Result<Option<String>, ApiError>;
}
