use std::{sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    config::{Config, SpotifyConfig},
    management::TokenManager,
    server::start_api_server,
    types::{PkceToken, Token},
    utils,
};

/// Runs the complete OAuth 2.0 PKCE login flow and persists the token.
///
/// 1. **PKCE Setup**: generates a random code verifier and derives its SHA256
///    code challenge
/// 2. **Server Start**: launches the local HTTP server handling `/callback`
/// 3. **Browser Launch**: opens the Spotify authorization URL; if no browser
///    can be opened the URL is printed instead
/// 4. **Callback Handling**: the callback exchanges the code for a token and
///    stores it in the shared state
/// 5. **Token Persistence**: the token is written to `cache/token.json`
///
/// # Errors
///
/// Returns a message if the flow times out after 120 seconds or the token
/// cannot be persisted.
pub async fn auth(
    config: Arc<Config>,
    shared_state: Arc<Mutex<Option<PkceToken>>>,
) -> Result<String, String> {
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);

    {
        let mut lock = shared_state.lock().await;
        *lock = Some(PkceToken {
            code_verifier: code_verifier.clone(),
            token: None,
        });
    }

    let server_state = Arc::clone(&shared_state);
    let server_config = Arc::clone(&config);
    tokio::spawn(async move {
        if let Err(e) = start_api_server(server_config, server_state, None).await {
            crate::warning!("Callback server stopped: {}", e);
        }
    });

    let auth_url = authorize_url(&config.spotify, &code_challenge);
    if webbrowser::open(&auth_url).is_err() {
        crate::warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        );
    }

    let token = wait_for_token(shared_state)
        .await
        .ok_or_else(|| "Authentication failed or timed out.".to_string())?;

    TokenManager::new(token, config.token_path(), config.spotify.clone())
        .persist()
        .await
        .map_err(|e| format!("Failed to save token to cache: {}", e))?;

    Ok(config.token_path().display().to_string())
}

pub fn authorize_url(spotify: &SpotifyConfig, code_challenge: &str) -> String {
    format!(
        "{auth_url}?client_id={client_id}&response_type=code&redirect_uri={redirect_uri}&code_challenge={code_challenge}&code_challenge_method=S256&scope={scope}",
        auth_url = spotify.auth_url,
        client_id = spotify.client_id,
        redirect_uri = spotify.redirect_uri,
        code_challenge = code_challenge,
        scope = spotify.scope.replace(' ', "%20"),
    )
}

async fn wait_for_token(shared_state: Arc<Mutex<Option<PkceToken>>>) -> Option<Token> {
    use std::time::Instant;

    let max_wait = Duration::from_secs(120);
    let start = Instant::now();

    while start.elapsed() < max_wait {
        let lock = shared_state.lock().await;
        if let Some(token) = lock.as_ref().and_then(|p| p.token.clone()) {
            return Some(token);
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

/// Exchanges a refresh token for a new access token.
pub async fn refresh_token(spotify: &SpotifyConfig, refresh_token: &str) -> Result<Token, String> {
    let client = Client::new();
    let res = client
        .post(&spotify.token_url)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", spotify.client_id.as_str()),
        ])
        .send()
        .await
        .map_err(|e| e.to_string())?
        .error_for_status()
        .map_err(|e| e.to_string())?;

    let json: Value = res.json().await.map_err(|e| e.to_string())?;
    token_from_json(&json)
}

/// Exchanges the authorization code of the callback for a token.
pub async fn exchange_code_pkce(
    spotify: &SpotifyConfig,
    code: &str,
    verifier: &str,
) -> Result<Token, String> {
    let client = Client::new();
    let res = client
        .post(&spotify.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", spotify.client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", spotify.redirect_uri.as_str()),
        ])
        .send()
        .await
        .map_err(|e| e.to_string())?
        .error_for_status()
        .map_err(|e| e.to_string())?;

    let json: Value = res.json().await.map_err(|e| e.to_string())?;
    token_from_json(&json)
}

fn token_from_json(json: &Value) -> Result<Token, String> {
    let access_token = json["access_token"]
        .as_str()
        .ok_or_else(|| "token response without access_token".to_string())?;

    Ok(Token {
        access_token: access_token.to_string(),
        refresh_token: json["refresh_token"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        scope: json["scope"].as_str().unwrap_or_default().to_string(),
        expires_in: json["expires_in"].as_u64().unwrap_or(3600),
        obtained_at: Utc::now().timestamp() as u64,
    })
}
