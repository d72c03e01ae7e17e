use serde::{Deserialize, Serialize};

pub type NodeId = u64;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum NodeTag {
    TextArea,
    Input,
    /// Non-editable container element.
    Block,
    /// Text node; content lives in [`NodeSnapshot::text`].
    Text,
}

/// One node of the captured element tree.
///
/// `visible` is the bridge's answer to the layout test (offset parent
/// or at least one client rectangle); locator rules never re-derive it.
/// `dom_index` is the node's document-order position and is the only
/// tie-breaker between equally matching candidates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub tag: NodeTag,
    pub text: Option<String>,
    pub placeholder: Option<String>,
    pub maxlength: Option<u32>,
    pub value: String,
    pub visible: bool,
    pub dom_index: usize,
}

impl NodeSnapshot {
    pub fn is_editable(&self) -> bool {
        matches!(self.tag, NodeTag::TextArea | NodeTag::Input)
    }
}

/// Point-in-time capture of the page: URL plus a flat arena of nodes
/// with parent links. Node ids are stable across snapshots for as long
/// as the host keeps the underlying element alive, and never reused.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub nodes: Vec<NodeSnapshot>,
}

impl PageSnapshot {
    pub fn node(&self, id: NodeId) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Walk from `id` towards the root, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Vec<&NodeSnapshot> {
        let mut chain = Vec::new();
        let mut current = self.node(id).and_then(|n| n.parent);
        while let Some(pid) = current {
            match self.node(pid) {
                Some(parent) => {
                    chain.push(parent);
                    current = parent.parent;
                }
                None => break,
            }
        }
        chain
    }

    /// All nodes under `root` (excluding it), document order.
    pub fn descendants(&self, root: NodeId) -> Vec<&NodeSnapshot> {
        let mut out: Vec<&NodeSnapshot> = self
            .nodes
            .iter()
            .filter(|n| n.id != root && self.has_ancestor(n.id, root))
            .collect();
        out.sort_by_key(|n| n.dom_index);
        out
    }

    fn has_ancestor(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(id).iter().any(|n| n.id == ancestor)
    }
}
