use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;

use super::SpotifyApi;
use crate::{
    config::Config,
    error::ApiError,
    management::TokenManager,
    types::{
        AlbumGroup, AlbumTracks, Artist, AudioFeatures, Page, PlaylistInfo, PlaylistItem,
        PositionedItem, ReleaseCandidate, Track,
    },
};

/// `reqwest` based implementation of [`super::SpotifyApi`].
///
/// Every request carries a bearer token obtained from the [`TokenManager`].
/// Status codes are translated into [`ApiError`] values; nothing is retried
/// here.
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    tokens: Mutex<TokenManager>,
}

impl SpotifyClient {
    pub fn new(config: &Config, tokens: TokenManager) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_url: config.spotify.api_url.clone(),
            tokens: Mutex::new(tokens),
        })
    }

    pub(crate) fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.api_url, path_and_query)
    }

    pub(crate) fn http_get(&self, path_and_query: &str) -> RequestBuilder {
        self.http.get(self.url(path_and_query))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path_and_query: &str,
    ) -> Result<T, ApiError> {
        let request = self.http_get(path_and_query);
        let response = self.execute(request).await?;
        Ok(response.json::<T>().await?)
    }

    pub(crate) async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path_and_query: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.http.request(method, self.url(path_and_query)).json(body);
        let response = self.execute(request).await?;
        Ok(response.json::<T>().await?)
    }

    /// Sends a request whose response body is irrelevant.
    pub(crate) async fn send_empty<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path_and_query: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let request = self.http.request(method, self.url(path_and_query)).json(body);
        self.execute(request).await.map(|_| ())
    }

    /// Authenticates and sends the request, mapping non-success statuses.
    pub(crate) async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let token = self.tokens.lock().await.get_valid_token().await;
        let response = request.bearer_auth(token).send().await?;
        check_status(response)
    }
}

fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(1);
        return Err(ApiError::RateLimited { retry_after });
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized(
            "access token rejected, run sporlradar auth".to_string(),
        ));
    }

    if status.is_server_error() {
        return Err(ApiError::Server(status.as_u16()));
    }

    Err(ApiError::Status(status.as_u16()))
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    async fn get_followed_artists(
        &self,
        after: Option<String>,
        limit: u32,
    ) -> Result<(Page<Artist>, Option<String>), ApiError> {
        self.followed_artists_page(after, limit).await
    }

    async fn get_several_artists(&self, ids: &[String]) -> Result<Vec<Artist>, ApiError> {
        self.several_artists(ids).await
    }

    async fn get_artist_albums(
        &self,
        artist_id: &str,
        groups: &[AlbumGroup],
        market: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Page<ReleaseCandidate>, ApiError> {
        self.artist_albums_page(artist_id, groups, market, limit, offset)
            .await
    }

    async fn get_several_albums(&self, ids: &[String]) -> Result<Vec<AlbumTracks>, ApiError> {
        self.several_albums(ids).await
    }

    async fn get_album_tracks(
        &self,
        album_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<Track>, ApiError> {
        self.album_tracks_page(album_id, limit, offset).await
    }

    async fn get_audio_features(
        &self,
        track_ids: &[String],
    ) -> Result<Vec<AudioFeatures>, ApiError> {
        self.audio_features(track_ids).await
    }

    async fn get_playlist(&self, playlist_id: &str) -> Result<PlaylistInfo, ApiError> {
        self.playlist_info(playlist_id).await
    }

    async fn get_playlist_items(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<PlaylistItem>, ApiError> {
        self.playlist_items_page(playlist_id, limit, offset).await
    }

    async fn change_playlist_details(
        &self,
        playlist_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<(), ApiError> {
        self.update_playlist_details(playlist_id, name, description)
            .await
    }

    async fn add_playlist_items(
        &self,
        playlist_id: &str,
        uris: &[String],
        position: u32,
    ) -> Result<String, ApiError> {
        self.insert_playlist_items(playlist_id, uris, position).await
    }

    async fn remove_playlist_items(
        &self,
        playlist_id: &str,
        items: &[PositionedItem],
        snapshot_id: Option<&str>,
    ) -> Result<String, ApiError> {
        self.delete_playlist_items(playlist_id, items, snapshot_id)
            .await
    }

    async fn get_currently_playing(&self) -> Result<Option<String>, ApiError> {
        self.currently_playing().await
    }
}
