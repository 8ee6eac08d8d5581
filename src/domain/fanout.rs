//! Partial-failure-tolerant delivery to a set of sessions.
//!
//! One slow or dead client must never stop the others from getting a
//! snapshot. Failures are logged per session and counted; the failing
//! session stays registered until it is explicitly reaped by a leave or a
//! room-wide disconnect.

use std::sync::Arc;

use super::{CloseReason, ServerMessage, SessionId, SessionTransport};

/// Outcome of a fan-out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Sessions the operation succeeded for.
    pub delivered: usize,
    /// Sessions it failed for.
    pub failed: usize,
}

impl DeliveryReport {
    /// `true` if no session failed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Sends `message` to every target, continuing past individual failures.
///
/// The message is serialized once and the same text is written to each
/// session in iteration order.
pub async fn fan_out(
    targets: &[(SessionId, Arc<dyn SessionTransport>)],
    message: &ServerMessage,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode broadcast frame");
            report.failed = targets.len();
            return report;
        }
    };

    for (session_id, transport) in targets {
        match transport.send_text(text.clone()).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(%session_id, error = %e, "failed to deliver frame");
            }
        }
    }
    report
}

/// Closes every target with `reason`, continuing past individual failures.
pub async fn close_each(
    targets: &[(SessionId, Arc<dyn SessionTransport>)],
    reason: CloseReason,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for (session_id, transport) in targets {
        match transport.close(reason).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(%session_id, error = %e, "failed to close session");
            }
        }
    }
    report
}
