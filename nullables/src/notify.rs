//! Nullable notification sink: records published events.

use std::sync::Mutex;

use vetting_store::NotificationSink;
use vetting_types::VerificationReviewed;

/// Captures every event so tests can assert on what was published.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<VerificationReviewed>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all recorded events, leaving the recorder empty.
    pub fn drain(&self) -> Vec<VerificationReviewed> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl NotificationSink for RecordingNotifier {
    fn publish(&self, event: &VerificationReviewed) {
        self.events.lock().unwrap().push(event.clone());
    }
}
