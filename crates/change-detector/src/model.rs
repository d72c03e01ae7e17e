use std::time::Duration;

use serde::{Deserialize, Serialize};

use versekeeper_core_types::WorkspaceId;

/// Why a rescan was scheduled.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RescanReason {
    Startup,
    DomMutation,
    UrlChanged,
    WorkspaceChanged {
        from: WorkspaceId,
        to: WorkspaceId,
    },
}

impl RescanReason {
    pub fn name(&self) -> &'static str {
        match self {
            RescanReason::Startup => "startup",
            RescanReason::DomMutation => "dom-mutation",
            RescanReason::UrlChanged => "url-change",
            RescanReason::WorkspaceChanged { .. } => "wid-change",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectorPolicy {
    /// Coalescing window shared by every trigger source.
    pub coalesce_ms: u64,
    /// Period of the URL polling fallback. The event hooks are the
    /// primary mechanism; polling is deliberate redundancy for
    /// navigations none of them catch.
    pub poll_ms: u64,
}

impl DetectorPolicy {
    pub fn coalesce(&self) -> Duration {
        Duration::from_millis(self.coalesce_ms)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

impl Default for DetectorPolicy {
    fn default() -> Self {
        Self {
            coalesce_ms: 200,
            poll_ms: 500,
        }
    }
}
