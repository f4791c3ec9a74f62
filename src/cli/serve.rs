use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;

use super::connect;
use crate::{config::Config, crawler::Crawler, error, server, success, warning};

const BOOT_RETRY: Duration = Duration::from_secs(60);

/// Runs the long-lived service.
///
/// The crawler boots in the background, retrying every minute until the
/// first crawl succeeds. Only then do the crawl and notifier timers start.
/// The HTTP server answers right away; crawl triggers are rejected until
/// boot has finished.
pub async fn serve(config: Arc<Config>) {
    let api = connect(&config).await;
    let crawler = Arc::new(Crawler::from_config(Arc::clone(&config), api).await);

    let background = Arc::clone(&crawler);
    let crawl_interval = config.crawl_interval;
    let notifier_interval = config.notifier_interval;
    tokio::spawn(async move {
        loop {
            match background.boot().await {
                Ok(_) => break,
                Err(e) => {
                    warning!("Boot failed, retrying in {}s. Err: {}", BOOT_RETRY.as_secs(), e);
                    tokio::time::sleep(BOOT_RETRY).await;
                }
            }
        }
        success!("Crawler is ready");

        let crawls = Arc::clone(&background);
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(crawl_interval);
            // the first tick completes immediately and boot has just crawled
            timer.tick().await;
            loop {
                timer.tick().await;
                crawls.try_crawl().await;
            }
        });

        let mut timer = tokio::time::interval(notifier_interval);
        loop {
            timer.tick().await;
            if let Err(e) = background.sweep_notifiers().await {
                warning!("Notifier sweep failed: {}", e);
            }
        }
    });

    let pkce_state = Arc::new(Mutex::new(None));
    if let Err(e) = server::start_api_server(config, pkce_state, Some(crawler)).await {
        error!("Server stopped. Err: {}", e);
    }
}
