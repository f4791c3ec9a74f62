use reqwest::{Method, StatusCode};

use crate::{
    error::ApiError,
    spotify::SpotifyClient,
    types::{
        AddTracksToPlaylistRequest, ChangePlaylistDetailsRequest, CurrentlyPlayingResponse,
        FullPlaylist, Page, PagingObject, PlaylistInfo, PlaylistItem, PlaylistTrackObject,
        PositionedItem, RemoveTracksFromPlaylistRequest, SnapshotResponse,
    },
};

impl SpotifyClient {
    pub async fn playlist_info(&self, playlist_id: &str) -> Result<PlaylistInfo, ApiError> {
        let path = format!(
            "/playlists/{id}?fields=id,name,description,snapshot_id,tracks.total",
            id = playlist_id
        );
        let playlist = self.get_json::<FullPlaylist>(&path).await?;

        Ok(PlaylistInfo {
            id: playlist.id,
            name: playlist.name,
            description: playlist.description.unwrap_or_default(),
            total_tracks: playlist.tracks.total,
            snapshot_id: playlist.snapshot_id,
        })
    }

    pub async fn playlist_items_page(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<PlaylistItem>, ApiError> {
        let path = format!(
            "/playlists/{id}/tracks?fields=next,total,items(added_at,track(id,uri))&limit={limit}&offset={offset}",
            id = playlist_id,
            limit = limit,
            offset = offset
        );
        let res = self
            .get_json::<PagingObject<PlaylistTrackObject>>(&path)
            .await?;

        Ok(Page {
            items: res
                .items
                .into_iter()
                .filter_map(|item| {
                    let track = item.track?;
                    Some(PlaylistItem {
                        track_id: track.id,
                        uri: track.uri,
                        added_at: item.added_at,
                    })
                })
                .collect(),
            next: res.next,
            total: res.total,
        })
    }

    pub async fn update_playlist_details(
        &self,
        playlist_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<(), ApiError> {
        let body = ChangePlaylistDetailsRequest { name, description };
        self.send_empty(Method::PUT, &format!("/playlists/{}", playlist_id), &body)
            .await
    }

    pub async fn insert_playlist_items(
        &self,
        playlist_id: &str,
        uris: &[String],
        position: u32,
    ) -> Result<String, ApiError> {
        let body = AddTracksToPlaylistRequest { uris, position };
        let res = self
            .send_json::<_, SnapshotResponse>(
                Method::POST,
                &format!("/playlists/{}/tracks", playlist_id),
                &body,
            )
            .await?;
        Ok(res.snapshot_id)
    }

    pub async fn delete_playlist_items(
        &self,
        playlist_id: &str,
        items: &[PositionedItem],
        snapshot_id: Option<&str>,
    ) -> Result<String, ApiError> {
        let body = RemoveTracksFromPlaylistRequest {
            tracks: items,
            snapshot_id,
        };
        let res = self
            .send_json::<_, SnapshotResponse>(
                Method::DELETE,
                &format!("/playlists/{}/tracks", playlist_id),
                &body,
            )
            .await?;
        Ok(res.snapshot_id)
    }

    /// Id of the track the user is currently listening to.
    ///
    /// Spotify answers `204 No Content` when nothing is playing; podcasts and
    /// local files yield no id either.
    pub async fn currently_playing(&self) -> Result<Option<String>, ApiError> {
        let request = self.http_get("/me/player/currently-playing");
        let response = self.execute(request).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let res = response.json::<CurrentlyPlayingResponse>().await?;
        Ok(res.item.and_then(|item| item.id))
    }
}
