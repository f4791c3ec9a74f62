use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Extension, Router,
    routing::{get, post},
};
use tokio::sync::Mutex;

use crate::{Res, api, config::Config, crawler::Crawler, info, types::PkceToken};

/// Builds the router. Crawl endpoints are only mounted when a crawler runs.
pub fn router(
    config: Arc<Config>,
    pkce_state: Arc<Mutex<Option<PkceToken>>>,
    crawler: Option<Arc<Crawler>>,
) -> Router {
    let mut app = Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback));

    if let Some(crawler) = crawler {
        app = app
            .route("/crawl", post(api::crawl))
            .route("/notifiers/clear", post(api::clear_notifiers))
            .layer(Extension(crawler));
    }

    app.layer(Extension(pkce_state)).layer(Extension(config))
}

pub async fn start_api_server(
    config: Arc<Config>,
    pkce_state: Arc<Mutex<Option<PkceToken>>>,
    crawler: Option<Arc<Crawler>>,
) -> Res<()> {
    let addr = SocketAddr::from_str(&config.server_addr)
        .map_err(|e| format!("Failed to parse server address: {}", e))?;
    let app = router(config, pkce_state, crawler);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Cannot bind {}: {}", addr, e))?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
