use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::errors::PageError;
use crate::events::PageEvent;
use crate::model::{NodeId, PageSnapshot};

/// Seam to the live document.
///
/// Implementations must route `write_value` through whatever path the
/// host framework tracks (native property setter plus synthetic
/// input/change notifications), so the framework's internal state and
/// the rendered value agree. A plain assignment the framework cannot
/// see would be reverted on its next render.
#[async_trait]
pub trait PagePort: Send + Sync {
    async fn snapshot(&self) -> Result<PageSnapshot, PageError>;

    /// The URL as of this instant; may change between calls without a
    /// page load.
    async fn current_url(&self) -> String;

    /// `Ok(None)` when the node has disappeared (routine during host
    /// re-renders, not an error).
    async fn read_value(&self, node: NodeId) -> Result<Option<String>, PageError>;

    async fn write_value(&self, node: NodeId, value: &str) -> Result<(), PageError>;

    async fn is_focused(&self, node: NodeId) -> bool;

    fn subscribe(&self) -> broadcast::Receiver<PageEvent>;
}
