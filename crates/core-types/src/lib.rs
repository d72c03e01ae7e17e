use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Sentinel workspace used when the URL carries no usable `wid`.
pub const DEFAULT_WORKSPACE: &str = "default";

/// Query parameter carrying the workspace id.
pub const WID_PARAM: &str = "wid";

/// Maximum length of a sanitized workspace id.
const WID_MAX_LEN: usize = 120;

/// Workspace identifier derived from the page URL.
///
/// Never stored as persistent state itself; it only namespaces storage
/// keys. Callers must re-resolve it at every decision point because the
/// host application can change the URL without a page load.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct WorkspaceId(pub String);

impl WorkspaceId {
    pub fn sentinel() -> Self {
        Self(DEFAULT_WORKSPACE.to_string())
    }

    /// Resolve the workspace id from a full URL. A malformed URL or a
    /// missing/empty `wid` parameter falls back to the sentinel.
    pub fn resolve(href: &str) -> Self {
        match Url::parse(href) {
            Ok(url) => {
                let raw = url
                    .query_pairs()
                    .find(|(key, _)| key == WID_PARAM)
                    .map(|(_, value)| value.into_owned())
                    .unwrap_or_default();
                Self::sanitize(&raw)
            }
            Err(_) => Self::sentinel(),
        }
    }

    /// Make a raw wid safe for use as a storage-key fragment: trim,
    /// collapse whitespace runs to `_`, drop key-separator characters,
    /// cap the length.
    pub fn sanitize(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::sentinel();
        }
        let mut out = String::with_capacity(trimmed.len());
        let mut in_whitespace = false;
        for ch in trimmed.chars() {
            if ch.is_whitespace() {
                if !in_whitespace {
                    out.push('_');
                    in_whitespace = true;
                }
                continue;
            }
            in_whitespace = false;
            if matches!(ch, ':' | '/' | '\\' | '?' | '&' | '#') {
                continue;
            }
            out.push(ch);
        }
        if out.is_empty() {
            return Self::sentinel();
        }
        Self(out.chars().take(WID_MAX_LEN).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The four persisted form fields.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Lyrics,
    Style,
    Title,
    SongDescription,
}

impl FieldKind {
    pub const ALL: [FieldKind; 4] = [
        FieldKind::Lyrics,
        FieldKind::Style,
        FieldKind::Title,
        FieldKind::SongDescription,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Lyrics => "lyrics",
            FieldKind::Style => "style",
            FieldKind::Title => "title",
            FieldKind::SongDescription => "song_description",
        }
    }

    fn key_stem(&self) -> &'static str {
        match self {
            FieldKind::Lyrics => "lyrics_text",
            FieldKind::Style => "style_text",
            FieldKind::Title => "song_title",
            FieldKind::SongDescription => "song_desc",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Default inserted into an empty, never-cleared Lyrics field.
pub const LYRICS_DEFAULT: &str = "[Instrumental]";

/// Fixed prefix for every persisted key. Keys form a flat namespace;
/// there is no enumeration requirement on the store.
pub const KEY_PREFIX: &str = "vk_";

/// Storage key for a field's saved text under a workspace.
pub fn value_key(kind: FieldKind, wid: &WorkspaceId) -> String {
    format!("{}{}::wid={}", KEY_PREFIX, kind.key_stem(), wid)
}

/// Storage key for the Lyrics cleared flag under a workspace.
pub fn cleared_key(wid: &WorkspaceId) -> String {
    format!("{}lyrics_allow_empty::wid={}", KEY_PREFIX, wid)
}

/// Whitespace-collapsed, length-capped head of a value for log lines.
pub fn preview(value: &str, max: usize) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max).collect()
}
