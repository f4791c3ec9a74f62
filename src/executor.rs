//! Bounded worker pool for the per-artist and per-album fetch fan-out.

use std::{fmt::Display, future::Future, sync::Arc};

use tokio::sync::Semaphore;

use crate::warning;

/// Runs batches of fetch tasks with at most `pool_size` of them in flight.
///
/// Each task is spawned onto the runtime and waits for a permit before it
/// starts. Results come back in submission order; a failing task is logged
/// and skipped, its siblings are unaffected.
#[derive(Debug, Clone)]
pub struct FetchExecutor {
    permits: Arc<Semaphore>,
    pool_size: usize,
}

impl FetchExecutor {
    pub fn new(pool_size: usize) -> Self {
        let pool_size = pool_size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(pool_size)),
            pool_size,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Runs every task and waits for all of them.
    ///
    /// `label` names the kind of work in failure logs.
    pub async fn submit_all<T, E, Fut>(&self, label: &str, tasks: Vec<Fut>) -> Vec<T>
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let handles = tasks
            .into_iter()
            .map(|task| {
                let permits = Arc::clone(&self.permits);
                tokio::spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|e| e.to_string())?;
                    task.await.map_err(|e| e.to_string())
                })
            })
            .collect::<Vec<_>>();

        let mut results = Vec::with_capacity(handles.len());
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(value)) => results.push(value),
                Ok(Err(e)) => warning!("Skipping {} task {}: {}", label, index, e),
                Err(e) => warning!("{} task {} did not finish: {}", label, index, e),
            }
        }

        results
    }
}
