use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Latched "streams enabled" flag
///
/// Late subscribers observe the most recent value immediately. Every publish
/// is counted, including publishes of an unchanged value.
#[derive(Debug)]
pub struct LatchedStatus {
    tx: watch::Sender<bool>,
    publishes: AtomicU64,
}

impl LatchedStatus {
    #[must_use]
    pub fn new(initial: bool) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx,
            publishes: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, enabled: bool) {
        self.tx.send_replace(enabled);
        self.publishes.fetch_add(1, Ordering::SeqCst);
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn current(&self) -> bool {
        *self.tx.borrow()
    }

    #[must_use]
    pub fn publish_count(&self) -> u64 {
        self.publishes.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_late_subscriber_sees_last_value() {
        let status = LatchedStatus::new(false);
        status.publish(true);

        let rx = status.subscribe();
        assert!(*rx.borrow());
        assert!(status.current());
        assert_eq!(status.publish_count(), 1);
    }

    #[tokio::test]
    async fn test_subscriber_notified_on_publish() {
        let status = LatchedStatus::new(false);
        let mut rx = status.subscribe();

        status.publish(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());

        status.publish(false);
        rx.changed().await.unwrap();
        assert!(!*rx.borrow_and_update());
        assert_eq!(status.publish_count(), 2);
    }
}
