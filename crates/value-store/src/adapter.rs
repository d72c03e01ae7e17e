use std::sync::Arc;

use tracing::{debug, error};

use versekeeper_core_types::preview;

use crate::ports::StoreBackend;

const LOG_PREVIEW_LEN: usize = 80;

/// Degrading wrapper over a [`StoreBackend`].
///
/// Reads that fail come back as the caller's default and writes that
/// fail are dropped; both are logged, neither is surfaced to the
/// caller. A dropped write is not retried here: the in-memory
/// last-saved caches upstream were already updated, so the next input
/// or autosave tick carries the value again.
#[derive(Clone)]
pub struct ValueStore {
    backend: Arc<dyn StoreBackend>,
}

impl ValueStore {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    /// Read a key. Absent keys and backend failures both yield `None`;
    /// failures are logged.
    pub async fn get(&self, key: &str) -> Option<String> {
        match self.backend.load(key).await {
            Ok(value) => value,
            Err(err) => {
                error!(key, %err, "store get failed");
                None
            }
        }
    }

    /// Read a key, substituting `default` when absent or failed.
    pub async fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).await.unwrap_or_else(|| default.to_string())
    }

    /// Best-effort write. Failures are logged and dropped.
    pub async fn set(&self, key: &str, value: &str) {
        match self.backend.store(key, value).await {
            Ok(()) => {
                debug!(key, value = %preview(value, LOG_PREVIEW_LEN), "store set");
            }
            Err(err) => {
                error!(key, %err, "store set failed");
            }
        }
    }

    pub async fn get_flag(&self, key: &str) -> bool {
        self.get(key).await.as_deref() == Some("1")
    }

    pub async fn set_flag(&self, key: &str, on: bool) {
        self.set(key, if on { "1" } else { "0" }).await;
    }
}
