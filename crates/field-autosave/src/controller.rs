use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use field_locator::locate;
use page_bridge::{NodeId, PagePort};
use sticky_set::{stick_value, WriteMarkers};
use value_store::ValueStore;
use versekeeper_core_types::{
    cleared_key, preview, value_key, FieldKind, WorkspaceId, LYRICS_DEFAULT,
};

use crate::policy::AutosavePolicy;
use crate::title;

/// Autosave/restore life cycle of one form field.
///
/// Owns the per-workspace last-saved cache (suppresses redundant store
/// writes), the restored set (restore runs at most once per workspace
/// per process), and the debounce/interval task handles. All four
/// fields share the pattern; the Lyrics default policy and the Title
/// normalization are the only kind-specific branches.
pub struct FieldController {
    kind: FieldKind,
    page: Arc<dyn PagePort>,
    store: ValueStore,
    markers: WriteMarkers,
    policy: AutosavePolicy,
    state: Mutex<ControllerState>,
}

#[derive(Default)]
struct ControllerState {
    last_saved: HashMap<WorkspaceId, String>,
    restored: HashSet<WorkspaceId>,
    debounce: Option<JoinHandle<()>>,
    interval: Option<JoinHandle<()>>,
}

impl FieldController {
    pub fn new(
        kind: FieldKind,
        page: Arc<dyn PagePort>,
        store: ValueStore,
        markers: WriteMarkers,
        policy: AutosavePolicy,
    ) -> Arc<Self> {
        Arc::new(Self {
            kind,
            page,
            store,
            markers,
            policy,
            state: Mutex::new(ControllerState::default()),
        })
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    async fn current_node(&self) -> Option<NodeId> {
        match self.page.snapshot().await {
            Ok(snap) => locate(&snap, self.kind),
            Err(err) => {
                warn!(field = %self.kind, %err, "snapshot failed");
                None
            }
        }
    }

    async fn current_wid(&self) -> WorkspaceId {
        WorkspaceId::resolve(&self.page.current_url().await)
    }

    async fn read_node(&self, node: NodeId) -> Option<String> {
        self.page.read_value(node).await.ok().flatten()
    }

    /// Save-side normalization: Title is trimmed and date-suffixed
    /// (empty stays empty, unsuffixed); other fields persist raw.
    fn normalize_for_save(&self, raw: &str) -> String {
        match self.kind {
            FieldKind::Title => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    String::new()
                } else {
                    title::with_date_suffix(trimmed)
                }
            }
            _ => raw.to_string(),
        }
    }

    async fn stick(&self, value: &str, label: &str) -> bool {
        let kind = self.kind;
        stick_value(
            self.page.as_ref(),
            kind,
            move |snap| locate(snap, kind),
            value,
            label,
            &self.markers,
            &self.policy.sticky,
        )
        .await
    }

    /// Persist the field's current value unless it matches what was
    /// last saved for the current workspace. Missing element and
    /// mid-system-write are silent no-ops.
    pub async fn save_now(&self, reason: &str) {
        if self.markers.is_writing(self.kind) {
            return;
        }
        let Some(node) = self.current_node().await else {
            return;
        };
        let Some(raw) = self.read_node(node).await else {
            return;
        };
        let value = self.normalize_for_save(&raw);
        let wid = self.current_wid().await;

        let unchanged = {
            let state = self.state.lock();
            state.last_saved.get(&wid).map(String::as_str) == Some(value.as_str())
        };
        if unchanged {
            return;
        }
        self.state
            .lock()
            .last_saved
            .insert(wid.clone(), value.clone());
        self.store.set(&value_key(self.kind, &wid), &value).await;
        debug!(
            field = %self.kind,
            %wid,
            reason,
            len = value.len(),
            head = %preview(&value, 120),
            "saved"
        );
    }

    /// (Re)start the debounce timer; the pending save is replaced, so
    /// at most one debounced save per field is ever in flight.
    pub fn schedule_save(self: &Arc<Self>) {
        let me = Arc::clone(self);
        let delay = self.policy.debounce_for(self.kind);
        let mut state = self.state.lock();
        if let Some(handle) = state.debounce.take() {
            handle.abort();
        }
        state.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            me.save_now("input").await;
        }));
    }

    /// Input routing with echo suppression: a notification produced by
    /// our own write path is consumed here and never reaches the save
    /// timer.
    pub fn handle_input(self: &Arc<Self>) {
        if self.markers.consume_echo(self.kind) {
            debug!(field = %self.kind, "ignored own input echo");
            return;
        }
        if self.markers.is_writing(self.kind) {
            return;
        }
        self.schedule_save();
    }

    /// One-shot restore for the current workspace, run on every rescan.
    ///
    /// A field already holding text is marked restored and seeds the
    /// cache without being overwritten. A restore whose write never
    /// sticks still counts as done: retrying later could clobber text
    /// the user typed in between.
    pub async fn restore_if_needed(&self) {
        let wid = self.current_wid().await;
        if self.state.lock().restored.contains(&wid) {
            return;
        }
        let Some(node) = self.current_node().await else {
            return;
        };
        let Some(live) = self.read_node(node).await else {
            return;
        };

        if !live.trim().is_empty() {
            let seeded = self.normalize_for_save(&live);
            let mut state = self.state.lock();
            state.restored.insert(wid.clone());
            state.last_saved.insert(wid, seeded);
            return;
        }

        self.state.lock().restored.insert(wid.clone());

        let stored = self.store.get_or(&value_key(self.kind, &wid), "").await;
        if !stored.is_empty() {
            let value = if self.kind == FieldKind::Title {
                title::with_date_suffix(stored.trim())
            } else {
                stored
            };
            info!(
                field = %self.kind,
                %wid,
                len = value.len(),
                head = %preview(&value, 120),
                "restoring"
            );
            let stuck = self.stick(&value, "restore").await;
            if self.kind == FieldKind::Title {
                // The stored title gets today's suffix back.
                self.store.set(&value_key(self.kind, &wid), &value).await;
            }
            self.state.lock().last_saved.insert(wid.clone(), value);
            if !stuck {
                warn!(field = %self.kind, %wid, "restore write did not stick");
            }
            return;
        }

        self.apply_empty_policy(&wid, "restore").await;
    }

    /// Field-specific policy for an empty field with nothing stored.
    /// Only Lyrics does anything: insert the default unless the user
    /// explicitly cleared this workspace.
    async fn apply_empty_policy(&self, wid: &WorkspaceId, reason: &str) {
        if self.kind != FieldKind::Lyrics {
            return;
        }
        if self.store.get_flag(&cleared_key(wid)).await {
            debug!(%wid, reason, "lyrics kept empty, cleared flag set");
            self.store.set(&value_key(self.kind, wid), "").await;
            self.state
                .lock()
                .last_saved
                .insert(wid.clone(), String::new());
        } else {
            info!(%wid, reason, "empty lyrics, inserting default");
            self.stick(LYRICS_DEFAULT, "default").await;
            self.store
                .set(&value_key(self.kind, wid), LYRICS_DEFAULT)
                .await;
            self.state
                .lock()
                .last_saved
                .insert(wid.clone(), LYRICS_DEFAULT.to_string());
        }
    }

    pub async fn handle_blur(&self) {
        if self.markers.is_writing(self.kind) {
            return;
        }
        match self.kind {
            FieldKind::Title => self.blur_title().await,
            FieldKind::Lyrics => self.blur_lyrics().await,
            _ => {}
        }
    }

    /// Collapse any duplicate suffix the user typed, then save.
    async fn blur_title(&self) {
        let Some(node) = self.current_node().await else {
            return;
        };
        let Some(raw) = self.read_node(node).await else {
            return;
        };
        let trimmed = raw.trim().to_string();
        if trimmed.is_empty() {
            self.save_now("blur-empty").await;
            return;
        }
        let normalized = title::with_date_suffix(&trimmed);
        if normalized != trimmed {
            self.stick(&normalized, "blur-normalize").await;
        }
        self.save_now("blur").await;
    }

    /// Leaving an emptied Lyrics field re-runs the default policy; a
    /// field with text lowers a stale cleared flag.
    async fn blur_lyrics(&self) {
        let Some(node) = self.current_node().await else {
            return;
        };
        let Some(live) = self.read_node(node).await else {
            return;
        };
        let wid = self.current_wid().await;
        if !live.trim().is_empty() {
            if self.store.get_flag(&cleared_key(&wid)).await {
                self.store.set_flag(&cleared_key(&wid), false).await;
            }
            return;
        }
        self.apply_empty_policy(&wid, "blur").await;
    }

    /// Explicit clear: empty the field, persist empty, raise the
    /// cleared flag so a later restore never reinserts the default.
    pub async fn clear_lyrics(&self) {
        if self.kind != FieldKind::Lyrics {
            return;
        }
        let wid = self.current_wid().await;
        self.store.set_flag(&cleared_key(&wid), true).await;
        self.stick("", "clear").await;
        self.store.set(&value_key(self.kind, &wid), "").await;
        self.state
            .lock()
            .last_saved
            .insert(wid.clone(), String::new());
        info!(%wid, "lyrics cleared");
    }

    /// Best-effort unload save, bypassing the debounce timer.
    pub async fn flush_for_unload(&self) {
        self.save_now("unload").await;
    }

    /// Rescan-time Title touch-up: skip while focused so an active edit
    /// is never disrupted.
    pub async fn renormalize_title(&self) {
        if self.kind != FieldKind::Title || self.markers.is_writing(self.kind) {
            return;
        }
        let Some(node) = self.current_node().await else {
            return;
        };
        if self.page.is_focused(node).await {
            return;
        }
        let Some(raw) = self.read_node(node).await else {
            return;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return;
        }
        let normalized = title::with_date_suffix(trimmed);
        if normalized != trimmed {
            self.stick(&normalized, "renormalize").await;
            self.save_now("renormalize").await;
        }
    }

    /// Backstop against missed input events: one unconditional save per
    /// period for the field's lifetime.
    pub fn spawn_interval_save(self: &Arc<Self>) {
        let mut state = self.state.lock();
        if state.interval.is_some() {
            return;
        }
        let me = Arc::clone(self);
        let period = self.policy.autosave_interval();
        state.interval = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                me.save_now("interval").await;
            }
        }));
    }

    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        if let Some(handle) = state.debounce.take() {
            handle.abort();
        }
        if let Some(handle) = state.interval.take() {
            handle.abort();
        }
    }
}

impl Drop for FieldController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_bridge::FakePage;
    use value_store::{MemoryBackend, StoreBackend};

    struct Fixture {
        page: Arc<FakePage>,
        backend: Arc<MemoryBackend>,
        lyrics_node: NodeId,
        title_node: NodeId,
    }

    fn fixture(url: &str) -> Fixture {
        let page = Arc::new(FakePage::new(url));
        let root = page.add_block(None);
        let lyrics_node = page.add_textarea(Some(root), Some("Write some lyrics"), None);
        let _style = page.add_textarea(Some(root), None, Some(1000));
        let title_node = page.add_input(Some(root), Some("Song Title (Optional)"));
        let backend = Arc::new(MemoryBackend::new());
        Fixture {
            page,
            backend,
            lyrics_node,
            title_node,
        }
    }

    fn controller(fx: &Fixture, kind: FieldKind) -> Arc<FieldController> {
        let policy = AutosavePolicy {
            debounce_ms: 10,
            title_debounce_ms: 20,
            autosave_interval_secs: 300,
            sticky: sticky_set::StickyPolicy {
                max_attempts: 4,
                interval_ms: 5,
            },
        };
        FieldController::new(
            kind,
            fx.page.clone(),
            ValueStore::new(fx.backend.clone()),
            WriteMarkers::new(),
            policy,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn empty_lyrics_gets_default_on_restore() {
        let fx = fixture("https://suno.com/create");
        let ctl = controller(&fx, FieldKind::Lyrics);

        ctl.restore_if_needed().await;

        assert_eq!(
            fx.page.value_of(fx.lyrics_node).as_deref(),
            Some(LYRICS_DEFAULT)
        );
        let wid = WorkspaceId::sentinel();
        assert_eq!(
            fx.backend.snapshot().get(&value_key(FieldKind::Lyrics, &wid)),
            Some(&LYRICS_DEFAULT.to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cleared_lyrics_stay_empty_on_restore() {
        let fx = fixture("https://suno.com/create");
        let ctl = controller(&fx, FieldKind::Lyrics);

        ctl.clear_lyrics().await;
        assert_eq!(fx.page.value_of(fx.lyrics_node).as_deref(), Some(""));

        // New process: fresh controller, same store.
        let ctl2 = controller(&fx, FieldKind::Lyrics);
        ctl2.restore_if_needed().await;
        assert_eq!(fx.page.value_of(fx.lyrics_node).as_deref(), Some(""));
    }

    #[tokio::test(start_paused = true)]
    async fn live_text_is_never_clobbered() {
        let fx = fixture("https://suno.com/create");
        fx.page.seed_value(fx.lyrics_node, "host text");
        let wid = WorkspaceId::sentinel();
        fx.backend
            .store(&value_key(FieldKind::Lyrics, &wid), "stored text")
            .await
            .unwrap();

        let ctl = controller(&fx, FieldKind::Lyrics);
        ctl.restore_if_needed().await;

        assert_eq!(fx.page.value_of(fx.lyrics_node).as_deref(), Some("host text"));
    }

    #[tokio::test(start_paused = true)]
    async fn restore_runs_once_per_workspace() {
        let fx = fixture("https://suno.com/create");
        let wid = WorkspaceId::sentinel();
        fx.backend
            .store(&value_key(FieldKind::Lyrics, &wid), "saved lyrics")
            .await
            .unwrap();
        let ctl = controller(&fx, FieldKind::Lyrics);

        ctl.restore_if_needed().await;
        assert_eq!(
            fx.page.value_of(fx.lyrics_node).as_deref(),
            Some("saved lyrics")
        );

        // Host re-render wipes the field; a second rescan for the same
        // workspace must not write it back.
        fx.page.seed_value(fx.lyrics_node, "");
        ctl.restore_if_needed().await;
        assert_eq!(fx.page.value_of(fx.lyrics_node).as_deref(), Some(""));
    }

    #[tokio::test(start_paused = true)]
    async fn workspace_switch_rearms_restore() {
        let fx = fixture("https://suno.com/create");
        let ctl = controller(&fx, FieldKind::Style);
        let style_node = locate(
            &fx.page.snapshot().await.unwrap(),
            FieldKind::Style,
        )
        .unwrap();

        let wid_a = WorkspaceId::sentinel();
        let wid_b = WorkspaceId::sanitize("abc");
        fx.backend
            .store(&value_key(FieldKind::Style, &wid_a), "ambient")
            .await
            .unwrap();
        fx.backend
            .store(&value_key(FieldKind::Style, &wid_b), "metal")
            .await
            .unwrap();

        ctl.restore_if_needed().await;
        assert_eq!(fx.page.value_of(style_node).as_deref(), Some("ambient"));

        fx.page.silent_url("https://suno.com/create?wid=abc");
        fx.page.seed_value(style_node, "");
        ctl.restore_if_needed().await;
        assert_eq!(fx.page.value_of(style_node).as_deref(), Some("metal"));
    }

    #[tokio::test(start_paused = true)]
    async fn save_now_dedupes_per_workspace() {
        let fx = fixture("https://suno.com/create");
        let ctl = controller(&fx, FieldKind::Lyrics);

        fx.page.user_type(fx.lyrics_node, "la la");
        ctl.save_now("test").await;
        let after_first = fx.backend.snapshot();

        ctl.save_now("test").await;
        assert_eq!(fx.backend.snapshot(), after_first);

        fx.page.user_type(fx.lyrics_node, "la la la");
        ctl.save_now("test").await;
        let wid = WorkspaceId::sentinel();
        assert_eq!(
            fx.backend.snapshot().get(&value_key(FieldKind::Lyrics, &wid)),
            Some(&"la la la".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn title_saves_with_date_suffix() {
        let fx = fixture("https://suno.com/create");
        let ctl = controller(&fx, FieldKind::Title);

        fx.page.user_type(fx.title_node, "My Song");
        ctl.save_now("test").await;

        let wid = WorkspaceId::sentinel();
        let stored = fx
            .backend
            .snapshot()
            .get(&value_key(FieldKind::Title, &wid))
            .cloned()
            .unwrap();
        assert_eq!(stored, title::with_date_suffix("My Song"));
        assert!(stored.starts_with("My Song_"));
    }

    #[tokio::test(start_paused = true)]
    async fn title_blur_collapses_duplicate_suffix() {
        let fx = fixture("https://suno.com/create");
        let ctl = controller(&fx, FieldKind::Title);

        let typed = format!("{}_999999", title::with_date_suffix("My Song"));
        fx.page.user_type(fx.title_node, &typed);
        ctl.handle_blur().await;

        assert_eq!(
            fx.page.value_of(fx.title_node).unwrap(),
            title::with_date_suffix("My Song")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn focused_title_is_left_alone_by_renormalize() {
        let fx = fixture("https://suno.com/create");
        let ctl = controller(&fx, FieldKind::Title);

        fx.page.user_type(fx.title_node, "My Song_111111");
        fx.page.focus(fx.title_node);
        ctl.renormalize_title().await;
        assert_eq!(
            fx.page.value_of(fx.title_node).as_deref(),
            Some("My Song_111111")
        );

        fx.page.user_blur(fx.title_node);
        ctl.renormalize_title().await;
        assert_eq!(
            fx.page.value_of(fx.title_node).unwrap(),
            title::with_date_suffix("My Song")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn lyrics_blur_with_text_lowers_cleared_flag() {
        let fx = fixture("https://suno.com/create");
        let ctl = controller(&fx, FieldKind::Lyrics);
        let wid = WorkspaceId::sentinel();

        ctl.clear_lyrics().await;
        assert_eq!(
            fx.backend.snapshot().get(&cleared_key(&wid)),
            Some(&"1".to_string())
        );

        fx.page.user_type(fx.lyrics_node, "verse one");
        ctl.handle_blur().await;
        assert_eq!(
            fx.backend.snapshot().get(&cleared_key(&wid)),
            Some(&"0".to_string())
        );
    }
}
