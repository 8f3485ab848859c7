//! Change feed for observing pushes.
//!
//! Every push that writes at least one document publishes one bulk holding
//! the written documents and the checkpoint after the push. Soft-deleted
//! documents are included, so subscribers see deletions.
//!
//! The feed only delivers; it keeps no copy of what it sent. Answers to
//! `streamTodo` are read from the store.
//!
//! # Usage
//!
//! ```rust
//! use todosync_server::{ServerConfig, SyncServer};
//! use todosync_protocol::{PushRow, TodoInput};
//!
//! let server = SyncServer::in_memory(ServerConfig::default()).unwrap();
//! let receiver = server.subscribe();
//!
//! let row = PushRow::new(TodoInput::new("1", "Walk the dog", false, "2024-11-25T12:30:00"));
//! server.push(vec![row]).unwrap();
//!
//! let bulk = receiver.recv().unwrap();
//! assert_eq!(bulk.documents[0].id, "1");
//! ```

use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};
use todosync_protocol::PullBulk;

/// Distributes published bulks to subscribers.
///
/// The feed:
/// - Preserves push order
/// - Supports multiple subscribers
/// - Drops subscribers whose receiver is gone
#[derive(Debug, Default)]
pub struct ChangeFeed {
    subscribers: RwLock<Vec<Sender<PullBulk>>>,
}

impl ChangeFeed {
    /// Creates a new change feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to the change feed.
    ///
    /// The receiver gets every bulk published after this call.
    pub fn subscribe(&self) -> Receiver<PullBulk> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Publishes a bulk to all subscribers, dropping disconnected ones.
    pub fn publish(&self, bulk: PullBulk) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(bulk.clone()).is_ok());
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;
    use todosync_protocol::{Checkpoint, Todo};

    fn bulk(id: &str) -> PullBulk {
        let checkpoint = Checkpoint::new(id, Utc.timestamp_millis_opt(1_000).unwrap());
        PullBulk::new(
            vec![Todo {
                id: id.into(),
                name: "task".into(),
                done: false,
                timestamp: "2024-11-25T10:00:00".into(),
                deleted: false,
            }],
            checkpoint,
        )
    }

    #[test]
    fn publish_and_receive() {
        let feed = ChangeFeed::new();
        let rx = feed.subscribe();

        feed.publish(bulk("1"));

        let received = rx.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(received, bulk("1"));
    }

    #[test]
    fn multiple_subscribers_in_order() {
        let feed = ChangeFeed::new();
        let rx1 = feed.subscribe();
        let rx2 = feed.subscribe();

        feed.publish(bulk("1"));
        feed.publish(bulk("2"));

        for rx in [rx1, rx2] {
            assert_eq!(rx.recv().unwrap(), bulk("1"));
            assert_eq!(rx.recv().unwrap(), bulk("2"));
        }
    }

    #[test]
    fn disconnected_subscribers_are_pruned() {
        let feed = ChangeFeed::new();
        let rx = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);

        drop(rx);
        feed.publish(bulk("1"));
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn late_subscriber_misses_earlier_bulks() {
        let feed = ChangeFeed::new();
        feed.publish(bulk("1"));

        let rx = feed.subscribe();
        assert!(rx.try_recv().is_err());

        feed.publish(bulk("2"));
        assert_eq!(rx.recv().unwrap(), bulk("2"));
        assert!(rx.try_recv().is_err());
    }
}
