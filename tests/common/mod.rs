#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use page_bridge::{FakePage, NodeId};
use value_store::{MemoryBackend, StoreBackend, StoreError, ValueStore};
use versekeeper_cli::{AutosaveRuntime, KeeperConfig};

/// Memory backend that counts every load and store, so tests can assert
/// which paths touched persistence.
pub struct CountingBackend {
    inner: MemoryBackend,
    loads: AtomicUsize,
    stores: AtomicUsize,
}

impl CountingBackend {
    pub fn new() -> Self {
        Self {
            inner: MemoryBackend::new(),
            loads: AtomicUsize::new(0),
            stores: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn stores(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> std::collections::HashMap<String, String> {
        self.inner.snapshot()
    }
}

#[async_trait]
impl StoreBackend for CountingBackend {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(key).await
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        self.inner.store(key, value).await
    }
}

pub struct FormNodes {
    pub lyrics: NodeId,
    pub style: NodeId,
    pub title: NodeId,
    pub description: NodeId,
}

/// Build the four-field create form the way the host lays it out.
pub fn build_form(page: &FakePage) -> FormNodes {
    let root = page.add_block(None);
    let lyrics = page.add_textarea(Some(root), Some("Write some lyrics..."), None);
    let style = page.add_textarea(Some(root), None, Some(1000));
    let title = page.add_input(Some(root), Some("Song Title (Optional)"));
    let desc_row = page.add_block(Some(root));
    page.add_text(Some(desc_row), "Song Description");
    let description = page.add_textarea(Some(desc_row), None, None);
    FormNodes {
        lyrics,
        style,
        title,
        description,
    }
}

/// Short timings so paused-clock tests settle fast.
pub fn quick_config() -> KeeperConfig {
    KeeperConfig {
        debounce_ms: 20,
        title_debounce_ms: 30,
        autosave_interval_secs: 300,
        coalesce_ms: 10,
        url_poll_ms: 50,
        sticky_attempts: 4,
        sticky_interval_ms: 5,
        ..KeeperConfig::default()
    }
}

pub struct Session {
    pub page: Arc<FakePage>,
    pub nodes: FormNodes,
    pub cancel: CancellationToken,
    pub task: JoinHandle<()>,
}

impl Session {
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// Start a runtime over a fresh form backed by the given store.
pub fn start_session(url: &str, backend: Arc<dyn StoreBackend>) -> Session {
    let page = Arc::new(FakePage::new(url));
    let nodes = build_form(&page);
    let runtime = AutosaveRuntime::new(
        page.clone(),
        ValueStore::new(backend),
        &quick_config(),
    );
    let cancel = CancellationToken::new();
    let task = tokio::spawn(runtime.run(cancel.clone()));
    Session {
        page,
        nodes,
        cancel,
        task,
    }
}

/// Let timers and queued events drain under the paused clock.
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
}
