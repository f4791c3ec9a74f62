use std::{collections::BTreeMap, path::Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StateFile;
use crate::{
    config::Config,
    error::StoreError,
    types::{ExtendedCategory, PlaylistTarget},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistState {
    pub playlist_id: String,
    pub last_update: Option<DateTime<Utc>>,
}

/// Per-category playlist bookkeeping (`state/playlists.json`).
#[derive(Debug, Clone)]
pub struct PlaylistStore {
    file: StateFile,
}

impl PlaylistStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            file: StateFile::new(data_dir, "state/playlists.json"),
        }
    }

    pub async fn load(&self) -> Result<BTreeMap<ExtendedCategory, PlaylistState>, StoreError> {
        Ok(self.file.load().await?.unwrap_or_default())
    }

    /// Stamps `last_update` of a category after a successful write.
    pub async fn record_update(
        &self,
        category: ExtendedCategory,
        playlist_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.load().await?;
        state.insert(
            category,
            PlaylistState {
                playlist_id: playlist_id.to_string(),
                last_update: Some(at),
            },
        );
        self.file.persist(&state).await
    }

    /// One target per category. Playlist ids from the configuration win over
    /// the ones remembered from earlier runs.
    pub async fn targets(&self, config: &Config) -> Result<Vec<PlaylistTarget>, StoreError> {
        let stored = self.load().await?;
        Ok(targets_from(config, &stored))
    }
}

pub fn targets_from(
    config: &Config,
    stored: &BTreeMap<ExtendedCategory, PlaylistState>,
) -> Vec<PlaylistTarget> {
    ExtendedCategory::ALL
        .into_iter()
        .map(|category| {
            let playlist_id = config
                .playlist_for(category)
                .map(str::to_string)
                .or_else(|| stored.get(&category).map(|s| s.playlist_id.clone()));
            PlaylistTarget::new(category, playlist_id)
        })
        .collect()
}
