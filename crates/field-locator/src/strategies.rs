use std::collections::HashMap;

use tracing::trace;

use page_bridge::{NodeId, NodeSnapshot, NodeTag, PageSnapshot};
use versekeeper_core_types::FieldKind;

/// Placeholder fragments identifying the Lyrics textarea.
const LYRICS_PLACEHOLDER_MARKERS: [&str; 2] =
    ["Write some lyrics", "leave blank for instrumental"];

/// Placeholder fragment identifying the Title input.
const TITLE_PLACEHOLDER_MARKER: &str = "Song Title";

/// Structural attribute identifying Style candidates.
const STYLE_MAXLENGTH: u32 = 1000;

/// Exact text of the Song Description label node.
const DESC_LABEL: &str = "Song Description";

/// How many ancestor levels to climb from the label before giving up.
const DESC_CLIMB_LIMIT: usize = 6;

/// At most one located node per field for one snapshot.
#[derive(Clone, Debug, Default)]
pub struct FieldMap {
    entries: HashMap<FieldKind, NodeId>,
}

impl FieldMap {
    pub fn get(&self, kind: FieldKind) -> Option<NodeId> {
        self.entries.get(&kind).copied()
    }

    pub fn kind_of(&self, node: NodeId) -> Option<FieldKind> {
        self.entries
            .iter()
            .find(|(_, id)| **id == node)
            .map(|(kind, _)| *kind)
    }

    fn insert(&mut self, kind: FieldKind, node: Option<NodeId>) {
        if let Some(id) = node {
            self.entries.insert(kind, id);
        }
    }
}

/// Resolve all four fields jointly.
///
/// Order matters for the claim rules: Song Description is resolved
/// before Style so that a structural Style candidate sitting under the
/// "Song Description" label is reserved for the description field, and
/// Style then excludes both the Lyrics node and the description node.
/// Surplus candidates are broken by document position.
pub fn locate_fields(snap: &PageSnapshot) -> FieldMap {
    let lyrics = find_lyrics(snap);
    let title = find_title(snap);
    let description = find_song_description(snap, lyrics);
    let style = find_style(snap, lyrics, description);

    let mut map = FieldMap::default();
    map.insert(FieldKind::Lyrics, lyrics);
    map.insert(FieldKind::Style, style);
    map.insert(FieldKind::Title, title);
    map.insert(FieldKind::SongDescription, description);
    trace!(?lyrics, ?style, ?title, ?description, "fields located");
    map
}

/// Single-field convenience over [`locate_fields`].
pub fn locate(snap: &PageSnapshot, kind: FieldKind) -> Option<NodeId> {
    locate_fields(snap).get(kind)
}

fn visible_by_document_order<'a>(
    snap: &'a PageSnapshot,
    tag: NodeTag,
) -> Vec<&'a NodeSnapshot> {
    let mut nodes: Vec<&NodeSnapshot> = snap
        .nodes
        .iter()
        .filter(|n| n.tag == tag && n.visible)
        .collect();
    nodes.sort_by_key(|n| n.dom_index);
    nodes
}

fn find_lyrics(snap: &PageSnapshot) -> Option<NodeId> {
    visible_by_document_order(snap, NodeTag::TextArea)
        .into_iter()
        .find(|n| {
            n.placeholder.as_deref().is_some_and(|p| {
                LYRICS_PLACEHOLDER_MARKERS.iter().any(|m| p.contains(m))
            })
        })
        .map(|n| n.id)
}

fn find_title(snap: &PageSnapshot) -> Option<NodeId> {
    visible_by_document_order(snap, NodeTag::Input)
        .into_iter()
        .find(|n| {
            n.placeholder
                .as_deref()
                .is_some_and(|p| p.contains(TITLE_PLACEHOLDER_MARKER))
        })
        .map(|n| n.id)
}

fn find_style(
    snap: &PageSnapshot,
    lyrics: Option<NodeId>,
    description: Option<NodeId>,
) -> Option<NodeId> {
    visible_by_document_order(snap, NodeTag::TextArea)
        .into_iter()
        .find(|n| {
            n.maxlength == Some(STYLE_MAXLENGTH)
                && Some(n.id) != lyrics
                && Some(n.id) != description
        })
        .map(|n| n.id)
}

/// The description field has no attribute of its own; it is found by
/// the exact label text, climbing a bounded number of ancestors and
/// scanning each level's subtree for the first unclaimed editable.
fn find_song_description(snap: &PageSnapshot, lyrics: Option<NodeId>) -> Option<NodeId> {
    let mut labels: Vec<&NodeSnapshot> = snap
        .nodes
        .iter()
        .filter(|n| {
            n.tag == NodeTag::Text
                && n.visible
                && n.text.as_deref().map(str::trim) == Some(DESC_LABEL)
        })
        .collect();
    labels.sort_by_key(|n| n.dom_index);

    for label in labels {
        for ancestor in snap.ancestors(label.id).into_iter().take(DESC_CLIMB_LIMIT) {
            let hit = snap
                .descendants(ancestor.id)
                .into_iter()
                .find(|n| n.is_editable() && n.visible && Some(n.id) != lyrics);
            if let Some(n) = hit {
                return Some(n.id);
            }
        }
    }
    None
}
