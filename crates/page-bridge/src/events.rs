use crate::model::NodeId;

/// Notifications surfaced by the page environment.
///
/// `FieldInput` fires for every input notification on an editable
/// element, including the synthetic ones produced by the runtime's own
/// writes; echo suppression happens downstream via the write markers.
#[derive(Clone, Debug)]
pub enum PageEvent {
    /// Subtree mutation anywhere under the document root.
    DomMutated,
    /// In-page navigation through the history push entry point.
    HistoryPushed { url: String },
    /// In-page navigation through the history replace entry point.
    HistoryReplaced { url: String },
    /// Browser "navigated within page" notification.
    PoppedState { url: String },
    FieldInput { node: NodeId },
    FieldBlur { node: NodeId },
    /// Click on the host's own "Clear lyrics" control.
    ClearLyricsClicked,
    BeforeUnload,
}
