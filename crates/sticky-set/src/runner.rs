use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use page_bridge::{NodeId, PagePort, PageSnapshot};
use versekeeper_core_types::{preview, FieldKind};

use crate::markers::WriteMarkers;
use crate::policy::StickyPolicy;

/// Write `value` into the element selected by `locate` until the value
/// survives a re-read, or the attempt budget runs out.
///
/// The element is re-located on every attempt: it may not exist yet, or
/// the host may have replaced it since the last look. A write the host
/// framework reverts shows up as a mismatched re-read and is simply
/// retried. Exhaustion is non-fatal and reported as `false`; callers
/// log and move on.
#[instrument(skip_all, fields(field = %kind, label = label))]
pub async fn stick_value<L>(
    page: &dyn PagePort,
    kind: FieldKind,
    locate: L,
    value: &str,
    label: &str,
    markers: &WriteMarkers,
    policy: &StickyPolicy,
) -> bool
where
    L: Fn(&PageSnapshot) -> Option<NodeId> + Send + Sync,
{
    for attempt in 1..=policy.max_attempts {
        let node = match page.snapshot().await {
            Ok(snap) => locate(&snap),
            Err(err) => {
                warn!(%err, attempt, "snapshot failed");
                None
            }
        };
        let Some(node) = node else {
            debug!(attempt, "no element yet, retrying");
            sleep(policy.interval()).await;
            continue;
        };

        // Avoid the event churn of rewriting an already-correct value.
        if read_eq(page, node, value).await {
            debug!(attempt, "value already in place");
            return true;
        }

        {
            let _guard = markers.begin(kind);
            match page.write_value(node, value).await {
                Ok(()) => markers.note_echo(kind),
                Err(err) => warn!(%err, attempt, "write failed"),
            }
        }

        sleep(policy.interval()).await;

        let confirmed = match page.snapshot().await {
            Ok(snap) => locate(&snap),
            Err(_) => None,
        };
        if let Some(node) = confirmed {
            if read_eq(page, node, value).await {
                debug!(attempt, value = %preview(value, 80), "value stuck");
                return true;
            }
        }
    }
    warn!(
        attempts = policy.max_attempts,
        value = %preview(value, 80),
        "gave up setting value"
    );
    false
}

async fn read_eq(page: &dyn PagePort, node: NodeId, value: &str) -> bool {
    matches!(page.read_value(node).await, Ok(Some(current)) if current == value)
}
