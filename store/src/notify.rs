//! Notification sink trait.

use vetting_types::VerificationReviewed;

/// Receives review decisions after they are committed.
///
/// Delivery is fire-and-forget: a sink failure must never undo or fail the
/// review that produced the event, so the method has no error channel.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: &VerificationReviewed);
}
