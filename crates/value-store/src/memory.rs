use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::errors::StoreError;
use crate::ports::StoreBackend;

/// Volatile backend for tests and the demo binary.
#[derive(Default)]
pub struct MemoryBackend {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    pub fn snapshot(&self) -> HashMap<String, String> {
        self.map.read().clone()
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.map.read().get(key).cloned())
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.map.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
