use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StickyPolicy {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl StickyPolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for StickyPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 12,
            interval_ms: 150,
        }
    }
}
