//! Write one frame to one registry member during a traversal.

use std::sync::Arc;

use crate::domain::{Connection, Frame, Visit};

/// Write `frame` and decide whether the member stays registered.
///
/// Failures are not retried and not reported to anybody but the log.
pub(super) async fn write_or_evict(
    connection: Arc<dyn Connection>,
    frame: Frame,
    purpose: &'static str,
) -> Visit {
    match connection.send(frame).await {
        Ok(()) => Visit::Keep,
        Err(e) => {
            tracing::warn!(
                "Failed to send {} to connection '{}', pruning it: {}",
                purpose,
                connection.id(),
                e
            );
            Visit::Evict
        }
    }
}
