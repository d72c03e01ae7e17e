use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use versekeeper_core_types::FieldKind;

/// Which roles the runtime is currently writing into, plus how many of
/// its own synthetic input notifications are still in flight.
///
/// Replaces a transient flag stamped onto the element itself: the mark
/// lives with the controller side and is keyed by locator role, so a
/// re-rendered element cannot shed it. The echo ledger exists because
/// input notifications are delivered asynchronously; by the time the
/// event loop sees one, the write guard may already be gone.
#[derive(Clone, Default)]
pub struct WriteMarkers {
    inner: Arc<Mutex<MarkerState>>,
}

#[derive(Default)]
struct MarkerState {
    writing: HashSet<FieldKind>,
    echoes: HashMap<FieldKind, u32>,
}

impl WriteMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `kind` as being written until the guard drops.
    pub fn begin(&self, kind: FieldKind) -> WriteGuard {
        self.inner.lock().writing.insert(kind);
        WriteGuard {
            markers: self.clone(),
            kind,
        }
    }

    pub fn is_writing(&self, kind: FieldKind) -> bool {
        self.inner.lock().writing.contains(&kind)
    }

    /// Record one pending input echo for a completed system write.
    pub fn note_echo(&self, kind: FieldKind) {
        *self.inner.lock().echoes.entry(kind).or_insert(0) += 1;
    }

    /// Returns true when the input notification being handled is one of
    /// our own echoes and must be dropped.
    pub fn consume_echo(&self, kind: FieldKind) -> bool {
        let mut state = self.inner.lock();
        match state.echoes.get_mut(&kind) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }
}

pub struct WriteGuard {
    markers: WriteMarkers,
    kind: FieldKind,
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        self.markers.inner.lock().writing.remove(&self.kind);
    }
}
