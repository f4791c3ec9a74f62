use std::{sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use super::connect;
use crate::{config::Config, crawler::Crawler, error, success, types::CategoryTableRow};

/// Boots a crawler, runs a single crawl and prints what was written.
pub async fn crawl(config: Arc<Config>) {
    let api = connect(&config).await;
    let crawler = Crawler::from_config(Arc::clone(&config), api).await;

    let pb = ProgressBar::new_spinner();
    pb.set_message("Crawling releases of followed artists...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let result = crawler.boot().await;
    crawler.cache_writer().flush().await;
    pb.finish_and_clear();

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => error!("Crawl failed. Err: {}", e),
    };

    let targets = crawler.targets().await;
    let rows = summary
        .written
        .iter()
        .map(|(category, count)| CategoryTableRow {
            category: category.to_string(),
            playlist: targets
                .iter()
                .find(|t| t.category == *category)
                .and_then(|t| t.playlist_id.clone())
                .unwrap_or_default(),
            releases: count.releases,
            tracks: count.tracks,
        })
        .collect::<Vec<_>>();

    if !rows.is_empty() {
        println!("{}", Table::new(rows));
    }
    success!("{}", summary);
}
