use std::{collections::HashSet, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

#[derive(Debug, Clone)]
pub struct PkceToken {
    pub code_verifier: String,
    pub token: Option<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

/// One slot of a release's ordered artist list.
///
/// Spotify leaves `id` empty for local and unlinked artists. Provenance
/// placeholders of appears-on releases are marked by `via`, the id of the
/// followed artist the release was discovered through, until they are
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistCredit {
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
}

impl ArtistCredit {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            name: name.to_string(),
            via: None,
        }
    }

    pub fn placeholder(origin_artist_id: &str) -> Self {
        Self {
            id: None,
            name: String::new(),
            via: Some(origin_artist_id.to_string()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.via.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlbumGroup {
    Album,
    Single,
    Compilation,
    AppearsOn,
}

impl AlbumGroup {
    pub const ALL: [AlbumGroup; 4] = [
        AlbumGroup::Album,
        AlbumGroup::Single,
        AlbumGroup::Compilation,
        AlbumGroup::AppearsOn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlbumGroup::Album => "album",
            AlbumGroup::Single => "single",
            AlbumGroup::Compilation => "compilation",
            AlbumGroup::AppearsOn => "appears_on",
        }
    }
}

impl fmt::Display for AlbumGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlbumGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "album" => Ok(AlbumGroup::Album),
            "single" => Ok(AlbumGroup::Single),
            "compilation" => Ok(AlbumGroup::Compilation),
            "appears_on" => Ok(AlbumGroup::AppearsOn),
            other => Err(format!("unknown album group '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePrecision {
    Day,
    Month,
    Year,
}

impl FromStr for DatePrecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(DatePrecision::Day),
            "month" => Ok(DatePrecision::Month),
            "year" => Ok(DatePrecision::Year),
            other => Err(format!("unknown release date precision '{}'", other)),
        }
    }
}

/// An album-level release found during a crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseCandidate {
    pub id: String,
    pub name: String,
    pub group: AlbumGroup,
    pub release_date: String,
    pub date_precision: DatePrecision,
    pub artists: Vec<ArtistCredit>,
}

impl ReleaseCandidate {
    pub fn first_artist_name(&self) -> &str {
        self.artists.first().map(|a| a.name.as_str()).unwrap_or("")
    }

    /// Identity used to recognize the same release published under several
    /// (usually regional) album ids.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.group,
            self.first_artist_name().to_lowercase(),
            self.name.to_lowercase()
        )
    }

    pub fn parsed_release_date(&self) -> Option<NaiveDate> {
        crate::utils::parse_release_date(&self.release_date, self.date_precision)
    }

    /// Artists credited by the service, without provenance entries.
    pub fn credited_artists(&self) -> impl Iterator<Item = &ArtistCredit> {
        self.artists
            .iter()
            .filter(|a| !a.is_placeholder() && !a.name.starts_with("(via "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub duration_ms: u64,
    pub artists: Vec<ArtistCredit>,
    #[serde(default)]
    pub available_markets: HashSet<String>,
}

/// A release together with its resolved tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseBundle {
    pub release: ReleaseCandidate,
    pub tracks: Vec<Track>,
}

impl ReleaseBundle {
    pub fn new(release: ReleaseCandidate, tracks: Vec<Track>) -> Self {
        Self { release, tracks }
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.tracks.iter().map(|t| t.duration_ms).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtendedCategory {
    Album,
    Single,
    Ep,
    Remix,
    Live,
    Compilation,
    ReRelease,
    AppearsOn,
}

impl ExtendedCategory {
    pub const ALL: [ExtendedCategory; 8] = [
        ExtendedCategory::Album,
        ExtendedCategory::Single,
        ExtendedCategory::Ep,
        ExtendedCategory::Remix,
        ExtendedCategory::Live,
        ExtendedCategory::Compilation,
        ExtendedCategory::ReRelease,
        ExtendedCategory::AppearsOn,
    ];

    /// Categories that are only ever assigned locally.
    pub fn is_extended(&self) -> bool {
        matches!(
            self,
            ExtendedCategory::Ep
                | ExtendedCategory::Remix
                | ExtendedCategory::Live
                | ExtendedCategory::ReRelease
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtendedCategory::Album => "album",
            ExtendedCategory::Single => "single",
            ExtendedCategory::Ep => "ep",
            ExtendedCategory::Remix => "remix",
            ExtendedCategory::Live => "live",
            ExtendedCategory::Compilation => "compilation",
            ExtendedCategory::ReRelease => "re_release",
            ExtendedCategory::AppearsOn => "appears_on",
        }
    }

    /// Suffix of the `SPORLRADAR_PLAYLIST_*` variable configuring this category.
    pub fn env_suffix(&self) -> String {
        self.as_str().to_ascii_uppercase()
    }
}

impl From<AlbumGroup> for ExtendedCategory {
    fn from(group: AlbumGroup) -> Self {
        match group {
            AlbumGroup::Album => ExtendedCategory::Album,
            AlbumGroup::Single => ExtendedCategory::Single,
            AlbumGroup::Compilation => ExtendedCategory::Compilation,
            AlbumGroup::AppearsOn => ExtendedCategory::AppearsOn,
        }
    }
}

impl fmt::Display for ExtendedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtendedCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        if normalized == "rerelease" {
            normalized = "re_release".to_string();
        }

        ExtendedCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistTarget {
    pub category: ExtendedCategory,
    pub playlist_id: Option<String>,
    pub last_new_marker: Option<DateTime<Utc>>,
}

impl PlaylistTarget {
    pub fn new(category: ExtendedCategory, playlist_id: Option<String>) -> Self {
        Self {
            category,
            playlist_id,
            last_new_marker: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.last_new_marker.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistCacheSnapshot {
    pub ids: std::collections::BTreeSet<String>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowedArtists {
    pub all_ids: Vec<String>,
    pub newly_added_ids: Vec<String>,
}

/// One page of a paged Spotify collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    pub total: u32,
}

/// An album as returned by the several-albums endpoint, with its first page of tracks.
#[derive(Debug, Clone)]
pub struct AlbumTracks {
    pub id: String,
    pub tracks: Page<Track>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub total_tracks: u32,
    pub snapshot_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistItem {
    pub track_id: Option<String>,
    pub uri: String,
    pub added_at: Option<DateTime<Utc>>,
}

/// Item selected for removal by its explicit playlist position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionedItem {
    pub uri: String,
    pub positions: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioFeatures {
    pub id: String,
    pub liveness: f32,
}

#[derive(Tabled)]
pub struct CategoryTableRow {
    pub category: String,
    pub playlist: String,
    pub releases: usize,
    pub tracks: usize,
}

// Spotify wire formats

#[derive(Debug, Clone, Deserialize)]
pub struct PagingObject<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FollowedArtistsResponse {
    pub artists: CursorPagingObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CursorPagingObject {
    pub items: Vec<Artist>,
    pub next: Option<String>,
    pub cursors: Option<Cursors>,
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cursors {
    pub after: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimplifiedArtist {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimplifiedAlbum {
    pub id: String,
    pub name: String,
    pub album_type: String,
    pub album_group: Option<String>,
    pub release_date: String,
    pub release_date_precision: String,
    pub artists: Vec<SimplifiedArtist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimplifiedTrack {
    pub id: Option<String>,
    pub name: String,
    pub uri: String,
    pub duration_ms: u64,
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub available_markets: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetSeveralAlbumsResponse {
    pub albums: Vec<Option<FullAlbum>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FullAlbum {
    pub id: String,
    pub tracks: PagingObject<SimplifiedTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetSeveralArtistsResponse {
    pub artists: Vec<Option<Artist>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FullPlaylist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub snapshot_id: String,
    pub tracks: PlaylistTracksRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTracksRef {
    pub total: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTrackObject {
    pub added_at: Option<DateTime<Utc>>,
    pub track: Option<PlaylistTrackRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTrackRef {
    pub id: Option<String>,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangePlaylistDetailsRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddTracksToPlaylistRequest<'a> {
    pub uris: &'a [String],
    pub position: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveTracksFromPlaylistRequest<'a> {
    pub tracks: &'a [PositionedItem],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotResponse {
    pub snapshot_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentlyPlayingResponse {
    pub item: Option<PlaylistTrackRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeaturesResponse {
    pub audio_features: Vec<Option<AudioFeaturesObject>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeaturesObject {
    pub id: String,
    pub liveness: f32,
}
