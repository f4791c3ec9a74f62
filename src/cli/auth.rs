use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{config::Config, error, spotify, success};

pub async fn auth(config: Arc<Config>) {
    if config.spotify.client_id.is_empty() {
        error!("SPOTIFY_API_AUTH_CLIENT_ID is not set. Please add it to your .env file.");
    }

    let shared_state = Arc::new(Mutex::new(None));
    match spotify::auth::auth(config, shared_state).await {
        Ok(path) => success!("Authentication successful. Token saved to {}", path),
        Err(e) => error!("Authentication failed. Err: {}", e),
    }
}
