use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use change_detector::DetectorPolicy;
use field_autosave::AutosavePolicy;
use sticky_set::StickyPolicy;

/// Top-level configuration, loaded from a TOML file when one exists.
///
/// Every knob has a default matching the shipped timings, so a missing
/// or partial file is fine.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct KeeperConfig {
    /// Where the JSON value store lives. `None` picks a path under the
    /// platform data directory.
    pub store_path: Option<PathBuf>,
    /// Debounce after user input, general fields (ms).
    pub debounce_ms: u64,
    /// Longer debounce for the Title field (ms).
    pub title_debounce_ms: u64,
    /// Period of the unconditional backstop save (seconds).
    pub autosave_interval_secs: u64,
    /// Rescan coalescing window (ms).
    pub coalesce_ms: u64,
    /// URL polling fallback period (ms).
    pub url_poll_ms: u64,
    /// Sticky-write retry budget.
    pub sticky_attempts: u32,
    /// Pause between sticky-write attempts (ms).
    pub sticky_interval_ms: u64,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            debounce_ms: 200,
            title_debounce_ms: 800,
            autosave_interval_secs: 5 * 60,
            coalesce_ms: 200,
            url_poll_ms: 500,
            sticky_attempts: 12,
            sticky_interval_ms: 150,
        }
    }
}

impl KeeperConfig {
    /// Load from an explicit path, or from the platform config
    /// directory when none is given. A missing file yields defaults; a
    /// malformed file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path
            .map(Path::to_path_buf)
            .or_else(default_config_path)
        else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("versekeeper")
                .join("store.json")
        })
    }

    pub fn autosave_policy(&self) -> AutosavePolicy {
        AutosavePolicy {
            debounce_ms: self.debounce_ms,
            title_debounce_ms: self.title_debounce_ms,
            autosave_interval_secs: self.autosave_interval_secs,
            sticky: StickyPolicy {
                max_attempts: self.sticky_attempts,
                interval_ms: self.sticky_interval_ms,
            },
        }
    }

    pub fn detector_policy(&self) -> DetectorPolicy {
        DetectorPolicy {
            coalesce_ms: self.coalesce_ms,
            poll_ms: self.url_poll_ms,
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("versekeeper").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_timings() {
        let config = KeeperConfig::default();
        assert_eq!(config.debounce_ms, 200);
        assert_eq!(config.title_debounce_ms, 800);
        assert_eq!(config.autosave_interval_secs, 300);
        assert_eq!(config.sticky_attempts, 12);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: KeeperConfig = toml::from_str("debounce_ms = 50\nurl_poll_ms = 100\n").unwrap();
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.url_poll_ms, 100);
        assert_eq!(config.title_debounce_ms, 800);
        assert!(config.store_path.is_none());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let config = KeeperConfig::load(Some(&path)).unwrap();
        assert_eq!(config.coalesce_ms, 200);
    }
}
