//! FileKeyValueStore - one JSON document per key under a data directory.
//!
//! Writes go to `<key>.json.tmp` first and are renamed into place, so a crash
//! mid-write leaves either the old document or the new one, never half of
//! either.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::domain::TryOnError;
use crate::ports::KeyValueStore;

#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// The directory is created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, TryOnError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(TryOnError::Storage(format!("invalid collection key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn read(&self, key: &str) -> Result<Option<String>, TryOnError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TryOnError::Storage(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), TryOnError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        let storage = |what: &str, e: std::io::Error| {
            TryOnError::Storage(format!("failed to {what} {}: {e}", path.display()))
        };

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| storage("create directory for", e))?;
        fs::write(&tmp, value)
            .await
            .map_err(|e| storage("write", e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| storage("replace", e))?;

        debug!(path = %path.display(), bytes = value.len(), "collection written");
        Ok(())
    }
}
