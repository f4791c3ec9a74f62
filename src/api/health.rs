use std::sync::Arc;

use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::crawler::{Crawler, CrawlerState};

pub async fn health(crawler: Option<Extension<Arc<Crawler>>>) -> Json<Value> {
    let state = crawler.map(|Extension(crawler)| match crawler.state() {
        CrawlerState::Booting => "booting",
        CrawlerState::Ready => "ready",
        CrawlerState::Crawling => "crawling",
    });

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "crawler": state,
    }))
}
