use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::errors::PageError;
use crate::events::PageEvent;
use crate::model::{NodeId, NodeSnapshot, NodeTag, PageSnapshot};
use crate::ports::PagePort;

const BUS_CAPACITY: usize = 256;

/// In-memory page used by tests and the demo binary.
///
/// Models the host behaviours the runtime has to survive: elements
/// appearing, disappearing and re-rendering, the URL changing without a
/// page load, the framework reverting writes it did not accept, and
/// the runtime's own writes echoing back as input notifications.
pub struct FakePage {
    state: Mutex<PageState>,
    bus: broadcast::Sender<PageEvent>,
}

struct PageState {
    url: String,
    nodes: Vec<NodeSnapshot>,
    focused: Option<NodeId>,
    revert_budget: u32,
    writes: Vec<(NodeId, String)>,
    next_id: NodeId,
    next_dom_index: usize,
}

impl FakePage {
    pub fn new(url: impl Into<String>) -> Self {
        let (bus, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            state: Mutex::new(PageState {
                url: url.into(),
                nodes: Vec::new(),
                focused: None,
                revert_budget: 0,
                writes: Vec::new(),
                next_id: 1,
                next_dom_index: 0,
            }),
            bus,
        }
    }

    fn emit(&self, event: PageEvent) {
        let _ = self.bus.send(event);
    }

    fn push_node(
        &self,
        parent: Option<NodeId>,
        tag: NodeTag,
        text: Option<String>,
        placeholder: Option<String>,
        maxlength: Option<u32>,
    ) -> NodeId {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        let dom_index = state.next_dom_index;
        state.next_dom_index += 1;
        state.nodes.push(NodeSnapshot {
            id,
            parent,
            tag,
            text,
            placeholder,
            maxlength,
            value: String::new(),
            visible: true,
            dom_index,
        });
        id
    }

    pub fn add_block(&self, parent: Option<NodeId>) -> NodeId {
        self.push_node(parent, NodeTag::Block, None, None, None)
    }

    pub fn add_textarea(
        &self,
        parent: Option<NodeId>,
        placeholder: Option<&str>,
        maxlength: Option<u32>,
    ) -> NodeId {
        self.push_node(
            parent,
            NodeTag::TextArea,
            None,
            placeholder.map(str::to_string),
            maxlength,
        )
    }

    pub fn add_input(&self, parent: Option<NodeId>, placeholder: Option<&str>) -> NodeId {
        self.push_node(
            parent,
            NodeTag::Input,
            None,
            placeholder.map(str::to_string),
            None,
        )
    }

    pub fn add_text(&self, parent: Option<NodeId>, content: &str) -> NodeId {
        self.push_node(parent, NodeTag::Text, Some(content.to_string()), None, None)
    }

    pub fn set_visible(&self, node: NodeId, visible: bool) {
        if let Some(n) = self.state.lock().nodes.iter_mut().find(|n| n.id == node) {
            n.visible = visible;
        }
        self.emit(PageEvent::DomMutated);
    }

    /// Drop a node (host re-render tearing an element down).
    pub fn remove_node(&self, node: NodeId) {
        self.state.lock().nodes.retain(|n| n.id != node);
        self.emit(PageEvent::DomMutated);
    }

    /// Pre-populate a value without any input notification, as if the
    /// host rendered the element with content already in it.
    pub fn seed_value(&self, node: NodeId, value: &str) {
        if let Some(n) = self.state.lock().nodes.iter_mut().find(|n| n.id == node) {
            n.value = value.to_string();
        }
    }

    /// Reject the next `count` system writes, leaving the old value in
    /// place, the way a reactive host reverts assignments it did not
    /// reconcile.
    pub fn revert_next_writes(&self, count: u32) {
        self.state.lock().revert_budget = count;
    }

    /// Every value passed to `write_value`, accepted or reverted.
    pub fn writes(&self) -> Vec<(NodeId, String)> {
        self.state.lock().writes.clone()
    }

    pub fn value_of(&self, node: NodeId) -> Option<String> {
        self.state
            .lock()
            .nodes
            .iter()
            .find(|n| n.id == node)
            .map(|n| n.value.clone())
    }

    // -- scripted user / host actions --

    pub fn user_type(&self, node: NodeId, text: &str) {
        if let Some(n) = self.state.lock().nodes.iter_mut().find(|n| n.id == node) {
            n.value = text.to_string();
        }
        self.emit(PageEvent::FieldInput { node });
    }

    pub fn focus(&self, node: NodeId) {
        self.state.lock().focused = Some(node);
    }

    pub fn user_blur(&self, node: NodeId) {
        let mut state = self.state.lock();
        if state.focused == Some(node) {
            state.focused = None;
        }
        drop(state);
        self.emit(PageEvent::FieldBlur { node });
    }

    pub fn navigate(&self, url: impl Into<String>) {
        let url = url.into();
        self.state.lock().url = url.clone();
        self.emit(PageEvent::HistoryPushed { url });
    }

    pub fn replace_url(&self, url: impl Into<String>) {
        let url = url.into();
        self.state.lock().url = url.clone();
        self.emit(PageEvent::HistoryReplaced { url });
    }

    pub fn pop_state(&self, url: impl Into<String>) {
        let url = url.into();
        self.state.lock().url = url.clone();
        self.emit(PageEvent::PoppedState { url });
    }

    /// Change the URL without any navigation notification; only the
    /// polling fallback can notice this one.
    pub fn silent_url(&self, url: impl Into<String>) {
        self.state.lock().url = url.into();
    }

    pub fn mutate_dom(&self) {
        self.emit(PageEvent::DomMutated);
    }

    pub fn click_clear_lyrics(&self) {
        self.emit(PageEvent::ClearLyricsClicked);
    }

    pub fn begin_unload(&self) {
        self.emit(PageEvent::BeforeUnload);
    }
}

#[async_trait]
impl PagePort for FakePage {
    async fn snapshot(&self) -> Result<PageSnapshot, PageError> {
        let state = self.state.lock();
        Ok(PageSnapshot {
            url: state.url.clone(),
            nodes: state.nodes.clone(),
        })
    }

    async fn current_url(&self) -> String {
        self.state.lock().url.clone()
    }

    async fn read_value(&self, node: NodeId) -> Result<Option<String>, PageError> {
        Ok(self.value_of(node))
    }

    async fn write_value(&self, node: NodeId, value: &str) -> Result<(), PageError> {
        {
            let mut state = self.state.lock();
            let reverted = if state.revert_budget > 0 {
                state.revert_budget -= 1;
                true
            } else {
                false
            };
            let entry = state
                .nodes
                .iter_mut()
                .find(|n| n.id == node)
                .ok_or(PageError::NodeGone(node))?;
            if !entry.is_editable() {
                return Err(PageError::NotEditable(node));
            }
            if !reverted {
                entry.value = value.to_string();
            }
            state.writes.push((node, value.to_string()));
        }
        // The framework echoes the synthetic input notification back to
        // every listener, the runtime's own included.
        self.emit(PageEvent::FieldInput { node });
        Ok(())
    }

    async fn is_focused(&self, node: NodeId) -> bool {
        self.state.lock().focused == Some(node)
    }

    fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.bus.subscribe()
    }
}
