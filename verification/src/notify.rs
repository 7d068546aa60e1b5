//! Default notification sink.

use vetting_store::NotificationSink;
use vetting_types::VerificationReviewed;

/// Writes each decision to the log. Used when no delivery channel is wired.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingSink;

impl NotificationSink for LoggingSink {
    fn publish(&self, event: &VerificationReviewed) {
        tracing::info!(
            request_id = %event.request_id,
            user_id = %event.user_id,
            status = %event.status,
            reviewed_by = %event.reviewed_by,
            reason = event.reason.as_deref().unwrap_or(""),
            "verification reviewed"
        );
    }
}
