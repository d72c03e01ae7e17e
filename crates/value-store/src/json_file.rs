use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::errors::StoreError;
use crate::ports::StoreBackend;

/// File-backed store holding the whole key space as one JSON object.
///
/// The map is loaded once at open and kept in memory; every write
/// rewrites the file. Key counts here are tiny (a handful of fields per
/// workspace), so whole-file rewrites are fine.
pub struct JsonFileBackend {
    path: PathBuf,
    map: RwLock<HashMap<String, String>>,
}

impl JsonFileBackend {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let map = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };
        info!(path = %path.display(), keys = map.len(), "value store opened");
        Ok(Self {
            path,
            map: RwLock::new(map),
        })
    }

    async fn flush(&self, map: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(map)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl StoreBackend for JsonFileBackend {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.map.read().await.get(key).cloned())
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self.map.write().await;
        map.insert(key.to_string(), value.to_string());
        self.flush(&map).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let backend = JsonFileBackend::open(&path).await.unwrap();
        backend.store("k", "v").await.unwrap();
        drop(backend);

        let reopened = JsonFileBackend::open(&path).await.unwrap();
        assert_eq!(reopened.load("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::open(dir.path().join("none.json"))
            .await
            .unwrap();
        assert_eq!(backend.load("k").await.unwrap(), None);
    }
}
