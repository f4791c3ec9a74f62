use std::str::FromStr;

use crate::{
    error::ApiError,
    spotify::SpotifyClient,
    types::{
        AlbumGroup, AlbumTracks, ArtistCredit, AudioFeatures, AudioFeaturesResponse,
        DatePrecision, GetSeveralAlbumsResponse, Page, PagingObject, ReleaseCandidate,
        SimplifiedAlbum, SimplifiedArtist, SimplifiedTrack, Track,
    },
    utils,
};

impl SpotifyClient {
    /// Retrieves one page of releases for an artist from the Spotify Web API.
    ///
    /// Fetches the artist's discography filtered by album group. Spotify
    /// returns the results sorted by group in the order album, single,
    /// compilation, appears_on, which the album discovery relies on to stop
    /// paging early.
    ///
    /// # Arguments
    ///
    /// * `artist_id` - Spotify ID of the artist to fetch releases for
    /// * `groups` - Album groups to include (`include_groups` parameter)
    /// * `market` - Optional market; only releases available there are listed
    /// * `limit` - Maximum number of albums to return (1-50)
    /// * `offset` - Index of the first album to return
    ///
    /// # Returns
    ///
    /// - `Ok(Page<ReleaseCandidate>)` - releases of this page; items with an
    ///   unknown group or precision are skipped
    /// - `Err(ApiError)` - the raw request failure
    ///
    /// # Example
    ///
    /// ```
    /// let page = client
    ///     .artist_albums_page("4NHQUGzhtTLFvgF5SZesLK", &AlbumGroup::ALL, Some("DE"), 50, 0)
    ///     .await?;
    /// println!("Found {} of {} releases", page.items.len(), page.total);
    /// ```
    pub async fn artist_albums_page(
        &self,
        artist_id: &str,
        groups: &[AlbumGroup],
        market: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Page<ReleaseCandidate>, ApiError> {
        let include_groups = groups
            .iter()
            .map(AlbumGroup::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let mut path = format!(
            "/artists/{id}/albums?include_groups={include_groups}&limit={limit}&offset={offset}",
            id = artist_id,
            include_groups = include_groups,
            limit = limit,
            offset = offset
        );
        if let Some(market) = market {
            path.push_str(&format!("&market={}", market));
        }

        let res = self.get_json::<PagingObject<SimplifiedAlbum>>(&path).await?;
        Ok(Page {
            items: res.items.into_iter().filter_map(release_candidate).collect(),
            next: res.next,
            total: res.total,
        })
    }

    /// Retrieves up to 20 albums with their first page of tracks.
    ///
    /// Albums are requested without a market so the returned tracks carry
    /// their `available_markets`, which the re-release classifier inspects.
    /// Ids Spotify cannot resolve are skipped.
    pub async fn several_albums(&self, ids: &[String]) -> Result<Vec<AlbumTracks>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let path = format!("/albums?ids={ids}", ids = ids.join(","));
        let res = self.get_json::<GetSeveralAlbumsResponse>(&path).await?;

        Ok(res
            .albums
            .into_iter()
            .flatten()
            .map(|album| AlbumTracks {
                id: album.id,
                tracks: track_page(album.tracks),
            })
            .collect())
    }

    pub async fn album_tracks_page(
        &self,
        album_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<Track>, ApiError> {
        let path = format!(
            "/albums/{id}/tracks?limit={limit}&offset={offset}",
            id = album_id,
            limit = limit,
            offset = offset
        );
        let res = self.get_json::<PagingObject<SimplifiedTrack>>(&path).await?;
        Ok(track_page(res))
    }

    pub async fn audio_features(&self, track_ids: &[String]) -> Result<Vec<AudioFeatures>, ApiError> {
        if track_ids.is_empty() {
            return Ok(Vec::new());
        }

        let path = format!("/audio-features?ids={ids}", ids = track_ids.join(","));
        let res = self.get_json::<AudioFeaturesResponse>(&path).await?;
        Ok(res
            .audio_features
            .into_iter()
            .flatten()
            .map(|f| AudioFeatures {
                id: f.id,
                liveness: f.liveness,
            })
            .collect())
    }
}

fn release_candidate(album: SimplifiedAlbum) -> Option<ReleaseCandidate> {
    let group = album
        .album_group
        .as_deref()
        .unwrap_or(&album.album_type)
        .parse::<AlbumGroup>()
        .ok()?;
    let date_precision = DatePrecision::from_str(&album.release_date_precision).ok()?;

    Some(ReleaseCandidate {
        id: album.id,
        name: album.name,
        group,
        release_date: album.release_date,
        date_precision,
        artists: album.artists.into_iter().map(artist_credit).collect(),
    })
}

fn artist_credit(artist: SimplifiedArtist) -> ArtistCredit {
    ArtistCredit {
        id: artist.id,
        name: artist.name,
        via: None,
    }
}

fn track_page(page: PagingObject<SimplifiedTrack>) -> Page<Track> {
    Page {
        items: page
            .items
            .into_iter()
            .filter_map(|t| {
                // local files have no id and cannot be added to playlists
                let id = t.id?;
                Some(Track {
                    uri: if t.uri.is_empty() {
                        utils::track_uri(&id)
                    } else {
                        t.uri
                    },
                    id,
                    name: t.name,
                    duration_ms: t.duration_ms,
                    artists: t.artists.into_iter().map(artist_credit).collect(),
                    available_markets: t.available_markets.into_iter().collect(),
                })
            })
            .collect(),
        next: page.next,
        total: page.total,
    }
}
