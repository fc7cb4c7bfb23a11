//! Structured log events for the notification lifecycle.
//!
//! Every build-completion event runs inside a [`build_span`], so each line
//! below carries the job and build number. Events are emitted at `info!`
//! (delivery) or `warn!` (skips and failures); nothing here is ever raised
//! to the build.

use tracing::{info, warn};

/// Span scoping all log lines for one build-completion event.
///
/// `event_id` correlates the lines of one event when the same build is
/// reported more than once.
pub fn build_span(job: &str, number: u64, event_id: &uuid::Uuid) -> tracing::Span {
    tracing::info_span!("argus.notify", job = %job, number = number, event_id = %event_id)
}

/// Emit event: about to deliver to Argus. The password is never logged.
pub fn emit_notify_sending(argus_url: &str, username: &str, metrics: usize, annotations: usize) {
    info!(
        event = "notify.sending",
        argus_url = %argus_url,
        username = %username,
        metrics = metrics,
        annotations = annotations,
        "Sending metrics to Argus"
    );
}

/// Emit event: Argus accepted the build's metrics and annotations.
pub fn emit_notify_sent(status: &str, metrics: usize, annotations: usize, elapsed_ms: u64) {
    info!(
        event = "notify.sent",
        status = %status,
        metrics = metrics,
        annotations = annotations,
        elapsed_ms = elapsed_ms,
    );
}

/// Emit event: the host context was gone; the event is skipped.
pub fn emit_host_unavailable() {
    warn!(event = "notify.skipped", reason = "host_unavailable", "Host context was unavailable. Skipping...");
}

/// Emit event: notification failed (warning level).
pub fn emit_notify_failed(error: &dyn std::fmt::Display) {
    warn!(event = "notify.failed", error = %error);
}
