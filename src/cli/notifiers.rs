use std::sync::Arc;

use super::connect;
use crate::{config::Config, crawler::Crawler, error, info, success};

/// Runs one notifier sweep, or clears every marker with `clear`.
pub async fn notifiers(config: Arc<Config>, clear: bool) {
    let api = connect(&config).await;
    let crawler = Crawler::from_config(config, api).await;
    crawler.seed_notifiers().await;

    let result = if clear {
        crawler.clear_notifiers().await
    } else {
        crawler.sweep_notifiers().await
    };

    match result {
        Ok(0) => info!("No notifier changed."),
        Ok(cleared) => success!("Cleared {} notifiers.", cleared),
        Err(e) => error!("Cannot update notifiers. Err: {}", e),
    }

    for target in crawler.targets().await.iter().filter(|t| t.is_new()) {
        if let Some(marker) = target.last_new_marker {
            info!("{} is marked new since {}", target.category, marker);
        }
    }
}
