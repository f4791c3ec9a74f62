use std::{future::Future, time::Duration};

use crate::{
    config::Config,
    error::{ApiError, GatewayError},
    types::Page,
    warning,
};

/// Retry policy wrapped around every remote call.
///
/// - `429 Too Many Requests` sleeps `retry_after + 1` seconds, then retries
/// - `5xx` sleeps the configured server error backoff, then retries
/// - any other failure is returned immediately
///
/// Retries are not bounded in count. Sleeping only suspends the awaiting
/// task, other fetch workers keep running.
#[derive(Debug, Clone)]
pub struct Gateway {
    server_error_backoff: Duration,
}

impl Gateway {
    pub fn new(server_error_backoff: Duration) -> Self {
        Self {
            server_error_backoff,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.server_error_backoff)
    }

    /// Runs `op` until it succeeds or fails with a non-transient error.
    pub async fn call<T, F, Fut>(&self, mut op: F) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(ApiError::RateLimited { retry_after }) => {
                    warning!("Rate limited, retrying in {} seconds", retry_after + 1);
                    tokio::time::sleep(Duration::from_secs(retry_after + 1)).await;
                }
                Err(ApiError::Server(status)) => {
                    warning!(
                        "Server error {}, retrying in {} seconds",
                        status,
                        self.server_error_backoff.as_secs()
                    );
                    tokio::time::sleep(self.server_error_backoff).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Collects every item of an offset-paged collection.
    ///
    /// `op` receives the offset of the next page. Paging ends once a page
    /// reports no `next` link or comes back empty.
    pub async fn page_all<T, F, Fut>(&self, op: F) -> Result<Vec<T>, GatewayError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Page<T>, ApiError>>,
    {
        self.page_until(0, op, |_| false).await
    }

    /// Like [`Gateway::page_all`], starting at `offset` and also ending after
    /// the first page for which `last_page` holds. That page is kept.
    pub async fn page_until<T, F, Fut, S>(
        &self,
        mut offset: u32,
        mut op: F,
        last_page: S,
    ) -> Result<Vec<T>, GatewayError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Page<T>, ApiError>>,
        S: Fn(&Page<T>) -> bool,
    {
        let mut items = Vec::new();

        loop {
            let page = self.call(|| op(offset)).await?;
            let done = page.next.is_none() || page.items.is_empty() || last_page(&page);
            offset += page.items.len() as u32;
            items.extend(page.items);
            if done {
                break;
            }
        }

        Ok(items)
    }

    /// Collects every item of a cursor-paged collection.
    pub async fn page_cursor<T, F, Fut>(&self, mut op: F) -> Result<Vec<T>, GatewayError>
    where
        F: FnMut(Option<String>) -> Fut,
        Fut: Future<Output = Result<(Page<T>, Option<String>), ApiError>>,
    {
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let (page, next) = self.call(|| op(after.clone())).await?;
            let empty = page.items.is_empty();
            items.extend(page.items);
            match next {
                Some(cursor) if !empty => after = Some(cursor),
                _ => break,
            }
        }

        Ok(items)
    }
}
