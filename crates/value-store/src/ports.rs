use async_trait::async_trait;

use crate::errors::StoreError;

/// The raw persistence capability: flat string keys, string values,
/// both operations asynchronous and fallible. Values must survive a
/// process restart for the non-volatile backends.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn store(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
