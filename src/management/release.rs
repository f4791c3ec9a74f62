use std::{collections::BTreeSet, path::Path};

use super::StateFile;
use crate::error::StoreError;

/// Append-only caches of release identities seen by earlier crawls.
///
/// `state/release_ids.json` holds album ids, `state/release_names.json` the
/// duplicate keys of [`crate::types::ReleaseCandidate::dedup_key`]. Both are
/// sets; appending merges with what is on disk, so they never shrink.
#[derive(Debug, Clone)]
pub struct ReleaseStore {
    ids: StateFile,
    names: StateFile,
}

impl ReleaseStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            ids: StateFile::new(data_dir, "state/release_ids.json"),
            names: StateFile::new(data_dir, "state/release_names.json"),
        }
    }

    pub async fn load_ids(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.ids.load().await?.unwrap_or_default())
    }

    pub async fn load_names(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.names.load().await?.unwrap_or_default())
    }

    pub async fn append_ids(&self, ids: &[String]) -> Result<(), StoreError> {
        append(&self.ids, ids).await
    }

    pub async fn append_names(&self, names: &[String]) -> Result<(), StoreError> {
        append(&self.names, names).await
    }
}

async fn append(file: &StateFile, values: &[String]) -> Result<(), StoreError> {
    if values.is_empty() {
        return Ok(());
    }

    let mut set: BTreeSet<String> = file.load().await?.unwrap_or_default();
    let before = set.len();
    set.extend(values.iter().cloned());
    if set.len() == before {
        return Ok(());
    }
    file.persist(&set).await
}
