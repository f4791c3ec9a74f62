use std::sync::Arc;

use axum::{Extension, http::StatusCode, response::Json};
use serde_json::{Value, json};

use crate::{
    crawler::{CrawlReport, CrawlStatus, Crawler},
    warning,
};

pub async fn crawl(Extension(crawler): Extension<Arc<Crawler>>) -> (StatusCode, Json<CrawlReport>) {
    let report = crawler.try_crawl().await;
    let status = match report.status {
        CrawlStatus::Ok => StatusCode::OK,
        CrawlStatus::Rejected => StatusCode::CONFLICT,
        CrawlStatus::Error => StatusCode::BAD_GATEWAY,
    };
    (status, Json(report))
}

pub async fn clear_notifiers(
    Extension(crawler): Extension<Arc<Crawler>>,
) -> (StatusCode, Json<Value>) {
    match crawler.clear_notifiers().await {
        Ok(cleared) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "cleared": cleared })),
        ),
        Err(e) => {
            warning!("Cannot clear notifiers: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "status": "error", "error": e.to_string() })),
            )
        }
    }
}
