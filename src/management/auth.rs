use std::path::PathBuf;

use chrono::Utc;

use crate::{config::SpotifyConfig, spotify::auth::refresh_token, types::Token, warning};

pub struct TokenManager {
    token: Token,
    path: PathBuf,
    spotify: SpotifyConfig,
}

impl TokenManager {
    pub fn new(token: Token, path: PathBuf, spotify: SpotifyConfig) -> Self {
        TokenManager {
            token,
            path,
            spotify,
        }
    }

    pub async fn load(path: PathBuf, spotify: SpotifyConfig) -> Result<Self, String> {
        let content = async_fs::read_to_string(&path)
            .await
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        let token: Token = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        Ok(Self {
            token,
            path,
            spotify,
        })
    }

    pub async fn persist(&self) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.token).map_err(|e| e.to_string())?;
        async_fs::write(&self.path, json)
            .await
            .map_err(|e| e.to_string())
    }

    /// Returns an access token, refreshing and persisting it first when it is
    /// about to expire. A failed refresh keeps the old token; the next request
    /// then fails with 401 and the crawl is retried on the next trigger.
    pub async fn get_valid_token(&mut self) -> String {
        if self.is_expired() {
            match refresh_token(&self.spotify, &self.token.refresh_token).await {
                Ok(mut new_token) => {
                    // Spotify may omit the refresh token when it is not rotated
                    if new_token.refresh_token.is_empty() {
                        new_token.refresh_token = self.token.refresh_token.clone();
                    }
                    self.token = new_token;
                    if let Err(e) = self.persist().await {
                        warning!("Cannot persist refreshed token: {}", e);
                    }
                }
                Err(e) => warning!("Cannot refresh access token: {}", e),
            }
        }

        self.token.access_token.clone()
    }

    fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp() as u64;
        now + 240 >= self.token.obtained_at + self.token.expires_in
    }
}
