use std::time::Duration;

use serde::{Deserialize, Serialize};

use sticky_set::StickyPolicy;
use versekeeper_core_types::FieldKind;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AutosavePolicy {
    /// Debounce after user input, general fields.
    pub debounce_ms: u64,
    /// Longer debounce for Title so normalization never lands mid-type.
    pub title_debounce_ms: u64,
    /// Period of the unconditional backstop save.
    pub autosave_interval_secs: u64,
    pub sticky: StickyPolicy,
}

impl AutosavePolicy {
    pub fn debounce_for(&self, kind: FieldKind) -> Duration {
        let ms = match kind {
            FieldKind::Title => self.title_debounce_ms,
            _ => self.debounce_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }
}

impl Default for AutosavePolicy {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            title_debounce_ms: 800,
            autosave_interval_secs: 5 * 60,
            sticky: StickyPolicy::default(),
        }
    }
}
