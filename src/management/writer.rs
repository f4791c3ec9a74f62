use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};

use super::{ArtistStore, PlaylistStore, ReleaseStore};
use crate::{
    types::{ArtistCacheSnapshot, ExtendedCategory},
    warning,
};

pub enum CacheWrite {
    ReleaseIds(Vec<String>),
    ReleaseNames(Vec<String>),
    Artists(ArtistCacheSnapshot),
    PlaylistUpdated {
        category: ExtendedCategory,
        playlist_id: String,
        at: DateTime<Utc>,
    },
    Flush(oneshot::Sender<()>),
}

/// Handle to the background task persisting caches and state.
///
/// Writes are queued and applied in order by a detached task. A failed write
/// is logged and dropped; the sender never waits for the disk.
#[derive(Debug, Clone)]
pub struct CacheWriter {
    tx: mpsc::UnboundedSender<CacheWrite>,
}

impl CacheWriter {
    pub fn spawn(releases: ReleaseStore, artists: ArtistStore, playlists: PlaylistStore) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<CacheWrite>();

        tokio::spawn(async move {
            while let Some(write) = rx.recv().await {
                let result = match write {
                    CacheWrite::ReleaseIds(ids) => releases.append_ids(&ids).await,
                    CacheWrite::ReleaseNames(names) => releases.append_names(&names).await,
                    CacheWrite::Artists(snapshot) => artists.persist(&snapshot).await,
                    CacheWrite::PlaylistUpdated {
                        category,
                        playlist_id,
                        at,
                    } => playlists.record_update(category, &playlist_id, at).await,
                    CacheWrite::Flush(done) => {
                        let _ = done.send(());
                        Ok(())
                    }
                };
                if let Err(e) = result {
                    warning!("Cache write failed: {}", e);
                }
            }
        });

        Self { tx }
    }

    pub fn release_ids(&self, ids: Vec<String>) {
        if !ids.is_empty() {
            self.send(CacheWrite::ReleaseIds(ids));
        }
    }

    pub fn release_names(&self, names: Vec<String>) {
        if !names.is_empty() {
            self.send(CacheWrite::ReleaseNames(names));
        }
    }

    pub fn artists(&self, snapshot: ArtistCacheSnapshot) {
        self.send(CacheWrite::Artists(snapshot));
    }

    pub fn playlist_updated(&self, category: ExtendedCategory, playlist_id: &str, at: DateTime<Utc>) {
        self.send(CacheWrite::PlaylistUpdated {
            category,
            playlist_id: playlist_id.to_string(),
            at,
        });
    }

    /// Waits until every write queued before this call has been applied.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        self.send(CacheWrite::Flush(done));
        let _ = wait.await;
    }

    fn send(&self, write: CacheWrite) {
        if self.tx.send(write).is_err() {
            warning!("Cache writer has stopped, dropping write");
        }
    }
}
