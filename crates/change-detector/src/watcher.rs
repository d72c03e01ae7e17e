use versekeeper_core_types::WorkspaceId;

use crate::model::RescanReason;

/// Tracks the last observed URL and classifies changes.
pub struct UrlWatcher {
    last_href: String,
    last_wid: WorkspaceId,
}

impl UrlWatcher {
    pub fn new(initial_href: &str) -> Self {
        Self {
            last_href: initial_href.to_string(),
            last_wid: WorkspaceId::resolve(initial_href),
        }
    }

    /// Feed the current URL; returns a reason when it moved since the
    /// last observation.
    pub fn observe(&mut self, href: &str) -> Option<RescanReason> {
        if href == self.last_href {
            return None;
        }
        self.last_href = href.to_string();
        let wid = WorkspaceId::resolve(href);
        if wid != self.last_wid {
            let from = std::mem::replace(&mut self.last_wid, wid.clone());
            Some(RescanReason::WorkspaceChanged { from, to: wid })
        } else {
            Some(RescanReason::UrlChanged)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_href_is_quiet() {
        let mut watcher = UrlWatcher::new("https://suno.com/create");
        assert_eq!(watcher.observe("https://suno.com/create"), None);
    }

    #[test]
    fn path_change_without_wid_change() {
        let mut watcher = UrlWatcher::new("https://suno.com/create");
        assert_eq!(
            watcher.observe("https://suno.com/create#section"),
            Some(RescanReason::UrlChanged)
        );
    }

    #[test]
    fn wid_change_is_classified() {
        let mut watcher = UrlWatcher::new("https://suno.com/create");
        let reason = watcher.observe("https://suno.com/create?wid=abc");
        assert_eq!(
            reason,
            Some(RescanReason::WorkspaceChanged {
                from: WorkspaceId::sentinel(),
                to: WorkspaceId::sanitize("abc"),
            })
        );
        // And back again.
        let reason = watcher.observe("https://suno.com/create");
        assert_eq!(
            reason,
            Some(RescanReason::WorkspaceChanged {
                from: WorkspaceId::sanitize("abc"),
                to: WorkspaceId::sentinel(),
            })
        );
    }
}
