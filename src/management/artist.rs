use std::path::Path;

use super::StateFile;
use crate::{error::StoreError, types::ArtistCacheSnapshot};

/// Persisted snapshot of the followed artist ids (`cache/artists.json`).
#[derive(Debug, Clone)]
pub struct ArtistStore {
    file: StateFile,
}

impl ArtistStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            file: StateFile::new(data_dir, "cache/artists.json"),
        }
    }

    pub async fn load(&self) -> Result<Option<ArtistCacheSnapshot>, StoreError> {
        self.file.load().await
    }

    pub async fn persist(&self, snapshot: &ArtistCacheSnapshot) -> Result<(), StoreError> {
        self.file.persist(snapshot).await
    }
}
