use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};

use crate::error::StoreError;

/// A JSON document below the data directory.
///
/// Every store of the management layer persists through one of these. A
/// missing file reads as `None` rather than an error, so the first run starts
/// from empty state.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(data_dir: &Path, relative: &str) -> Self {
        Self {
            path: data_dir.join(relative),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        let json = match async_fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    pub async fn persist<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(value)?;
        async_fs::write(&self.path, json).await?;
        Ok(())
    }
}
