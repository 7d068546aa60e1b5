//! Broadcast notification sink.
//!
//! Review decisions are fanned out on a `tokio::sync::broadcast` channel so
//! any number of in-process consumers (mailers, websocket pushers) can
//! subscribe. With no subscribers the event is dropped.

use tokio::sync::broadcast;

use vetting_store::NotificationSink;
use vetting_types::VerificationReviewed;

pub struct BroadcastSink {
    tx: broadcast::Sender<VerificationReviewed>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VerificationReviewed> {
        self.tx.subscribe()
    }
}

impl NotificationSink for BroadcastSink {
    fn publish(&self, event: &VerificationReviewed) {
        match self.tx.send(event.clone()) {
            Ok(receivers) => tracing::debug!(
                request_id = %event.request_id,
                receivers,
                "review event broadcast"
            ),
            Err(_) => tracing::debug!(request_id = %event.request_id, "no review subscribers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetting_types::{RequestId, Timestamp, UserId, VerificationStatus};

    fn event() -> VerificationReviewed {
        VerificationReviewed {
            request_id: RequestId::new(1),
            user_id: UserId::new("u"),
            status: VerificationStatus::Approved,
            reviewed_by: UserId::new("admin"),
            reviewed_at: Timestamp::new(5),
            reason: None,
        }
    }

    #[test]
    fn subscribers_receive_events() {
        let sink = BroadcastSink::new(8);
        let mut rx = sink.subscribe();
        sink.publish(&event());
        assert_eq!(rx.try_recv().unwrap(), event());
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        BroadcastSink::new(8).publish(&event());
    }
}
