use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use page_bridge::{PageEvent, PagePort};

use crate::model::{DetectorPolicy, RescanReason};
use crate::watcher::UrlWatcher;

/// Turns raw page notifications into coalesced rescan requests.
///
/// Four trigger sources feed one pending window: subtree mutations,
/// the two history hooks, the popstate notification, and the polling
/// fallback. While a rescan is pending, further triggers are absorbed;
/// a workspace change upgrades whatever reason was waiting.
pub struct ChangeDetector {
    page: Arc<dyn PagePort>,
    policy: DetectorPolicy,
    events: tokio::sync::broadcast::Receiver<PageEvent>,
}

impl ChangeDetector {
    /// Subscribes immediately so no event emitted between construction
    /// and the run loop starting is lost.
    pub fn new(page: Arc<dyn PagePort>, policy: DetectorPolicy) -> Self {
        let events = page.subscribe();
        Self {
            page,
            policy,
            events,
        }
    }

    pub async fn run(self, tx: mpsc::Sender<RescanReason>, cancel: CancellationToken) {
        let mut events = self.events;
        let mut watcher = UrlWatcher::new(&self.page.current_url().await);
        let mut poll = tokio::time::interval(self.policy.poll());
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let coalesce = tokio::time::sleep(Duration::from_secs(0));
        tokio::pin!(coalesce);
        let mut pending: Option<RescanReason> = None;
        let window = self.policy.coalesce();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = &mut coalesce, if pending.is_some() => {
                    if let Some(reason) = pending.take() {
                        debug!(reason = reason.name(), "rescan due");
                        if tx.send(reason).await.is_err() {
                            break;
                        }
                    }
                }
                event = events.recv() => match event {
                    Ok(event) => {
                        if let Some(reason) = map_event(&mut watcher, event) {
                            arm(&mut pending, coalesce.as_mut(), reason, window);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "page event bus lagged, forcing rescan");
                        arm(&mut pending, coalesce.as_mut(), RescanReason::DomMutation, window);
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = poll.tick() => {
                    let href = self.page.current_url().await;
                    if let Some(reason) = watcher.observe(&href) {
                        debug!(reason = reason.name(), "url poll caught a change");
                        arm(&mut pending, coalesce.as_mut(), reason, window);
                    }
                }
            }
        }
    }
}

fn map_event(watcher: &mut UrlWatcher, event: PageEvent) -> Option<RescanReason> {
    match event {
        PageEvent::DomMutated => Some(RescanReason::DomMutation),
        PageEvent::HistoryPushed { url }
        | PageEvent::HistoryReplaced { url }
        | PageEvent::PoppedState { url } => watcher.observe(&url),
        // Field-level events are routed by the runtime, not rescanned.
        _ => None,
    }
}

fn arm(
    pending: &mut Option<RescanReason>,
    mut coalesce: Pin<&mut Sleep>,
    reason: RescanReason,
    window: Duration,
) {
    match pending {
        None => {
            coalesce.as_mut().reset(Instant::now() + window);
            *pending = Some(reason);
        }
        Some(current) => {
            if matches!(reason, RescanReason::WorkspaceChanged { .. }) {
                *current = reason;
            }
        }
    }
}
