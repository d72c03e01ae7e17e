use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use change_detector::{ChangeDetector, RescanReason};
use field_autosave::FieldController;
use field_locator::locate_fields;
use page_bridge::{NodeId, PageEvent, PagePort};
use sticky_set::WriteMarkers;
use value_store::ValueStore;
use versekeeper_core_types::{FieldKind, WorkspaceId};

use crate::config::KeeperConfig;

/// Wires one controller per field to the page event bus and the change
/// detector, and drives rescans.
///
/// All controllers share one marker registry so that any field's
/// in-flight system write is visible to the whole input path.
pub struct AutosaveRuntime {
    page: Arc<dyn PagePort>,
    controllers: Vec<Arc<FieldController>>,
    detector: ChangeDetector,
    events: broadcast::Receiver<PageEvent>,
}

impl AutosaveRuntime {
    /// Subscribes to the page bus immediately so no event emitted
    /// between construction and the run loop starting is lost.
    pub fn new(page: Arc<dyn PagePort>, store: ValueStore, config: &KeeperConfig) -> Self {
        let markers = WriteMarkers::new();
        let policy = config.autosave_policy();
        let controllers = FieldKind::ALL
            .iter()
            .map(|kind| {
                FieldController::new(
                    *kind,
                    page.clone(),
                    store.clone(),
                    markers.clone(),
                    policy.clone(),
                )
            })
            .collect();
        let detector = ChangeDetector::new(page.clone(), config.detector_policy());
        let events = page.subscribe();
        Self {
            page,
            controllers,
            detector,
            events,
        }
    }

    /// Run until cancelled. One initial rescan restores the current
    /// workspace; after that, rescans arrive from the detector and
    /// field events are routed directly off the bus.
    #[instrument(skip_all)]
    pub async fn run(self, cancel: CancellationToken) {
        let Self {
            page,
            controllers,
            detector,
            mut events,
        } = self;

        let (rescan_tx, mut rescans) = mpsc::channel(16);
        let detector_task = tokio::spawn(detector.run(rescan_tx, cancel.clone()));

        for controller in &controllers {
            controller.spawn_interval_save();
        }

        let url = page.current_url().await;
        info!(%url, "autosave runtime started");
        rescan(&page, &controllers, RescanReason::Startup).await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                Some(reason) = rescans.recv() => {
                    rescan(&page, &controllers, reason).await;
                }
                event = events.recv() => match event {
                    Ok(event) => route_event(&page, &controllers, event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "page event bus lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        for controller in &controllers {
            controller.shutdown();
        }
        detector_task.abort();
        info!("autosave runtime stopped");
    }
}

async fn rescan(
    page: &Arc<dyn PagePort>,
    controllers: &[Arc<FieldController>],
    reason: RescanReason,
) {
    let wid = WorkspaceId::resolve(&page.current_url().await);
    debug!(reason = reason.name(), %wid, "rescan");
    for controller in controllers {
        controller.restore_if_needed().await;
    }
    if let Some(title) = controller_of(controllers, FieldKind::Title) {
        title.renormalize_title().await;
    }
}

async fn route_event(
    page: &Arc<dyn PagePort>,
    controllers: &[Arc<FieldController>],
    event: PageEvent,
) {
    match event {
        PageEvent::FieldInput { node } => {
            if let Some(controller) = controller_for(page, controllers, node).await {
                controller.handle_input();
            }
        }
        PageEvent::FieldBlur { node } => {
            if let Some(controller) = controller_for(page, controllers, node).await {
                controller.handle_blur().await;
            }
        }
        PageEvent::ClearLyricsClicked => {
            if let Some(lyrics) = controller_of(controllers, FieldKind::Lyrics) {
                lyrics.clear_lyrics().await;
            }
        }
        PageEvent::BeforeUnload => {
            debug!("unload flush");
            for controller in controllers {
                controller.flush_for_unload().await;
            }
        }
        // Navigation and mutation notifications belong to the detector.
        _ => {}
    }
}

/// Map an element-level event onto the field it currently belongs to.
/// The locator runs against a fresh snapshot because the host may have
/// re-rendered since the event fired.
async fn controller_for<'c>(
    page: &Arc<dyn PagePort>,
    controllers: &'c [Arc<FieldController>],
    node: NodeId,
) -> Option<&'c Arc<FieldController>> {
    let snap = match page.snapshot().await {
        Ok(snap) => snap,
        Err(err) => {
            warn!(%err, "snapshot failed while routing event");
            return None;
        }
    };
    let kind = locate_fields(&snap).kind_of(node)?;
    controller_of(controllers, kind)
}

fn controller_of(
    controllers: &[Arc<FieldController>],
    kind: FieldKind,
) -> Option<&Arc<FieldController>> {
    controllers.iter().find(|c| c.kind() == kind)
}
