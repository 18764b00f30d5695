//! In-memory notification center.
//!
//! Keeps a bounded list of recent notifications (newest first) with read
//! flags, and broadcasts each new notification to live subscribers. The
//! center is an ordinary value: share it with `Arc` where several
//! components need it.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::ExamDateEvent;

/// Default number of notifications retained
pub const DEFAULT_CAPACITY: usize = 50;

/// A workflow event as seen by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub event: ExamDateEvent,
}

/// Bounded notification list with broadcast fan-out
#[derive(Debug)]
pub struct NotificationCenter {
    items: Mutex<VecDeque<Notification>>,
    capacity: usize,
    sender: broadcast::Sender<Notification>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl NotificationCenter {
    /// Create a center retaining at most `capacity` notifications
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);

        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            sender,
        }
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<Notification>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Receive every notification published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Record an event and deliver it to subscribers
    pub fn publish(&self, event: ExamDateEvent) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            read: false,
            event,
        };

        {
            let mut items = self.items();
            items.push_front(notification.clone());
            items.truncate(self.capacity);
        }

        // No subscribers is fine
        let _ = self.sender.send(notification.clone());

        notification
    }

    /// Snapshot of retained notifications, newest first
    pub fn list(&self) -> Vec<Notification> {
        self.items().iter().cloned().collect()
    }

    pub fn unread_count(&self) -> usize {
        self.items().iter().filter(|n| !n.read).count()
    }

    /// Mark one notification read; returns false if it is unknown
    pub fn mark_read(&self, id: Uuid) -> bool {
        match self.items().iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&self) {
        for notification in self.items().iter_mut() {
            notification.read = true;
        }
    }

    pub fn clear(&self) {
        self.items().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EventType;
    use chrono::NaiveDate;

    fn event(course_id: &str) -> ExamDateEvent {
        ExamDateEvent::new(
            EventType::Proposed,
            course_id,
            course_id,
            "alice",
            "prop-1-abcdef12",
            NaiveDate::from_ymd_opt(2026, 6, 12).unwrap(),
        )
    }

    #[test]
    fn test_publish_tracks_unread() {
        let center = NotificationCenter::default();

        let first = center.publish(event("loi-gauss"));
        center.publish(event("optique"));
        assert_eq!(center.unread_count(), 2);

        assert!(center.mark_read(first.id));
        assert_eq!(center.unread_count(), 1);
        assert!(!center.mark_read(Uuid::new_v4()));

        center.mark_all_read();
        assert_eq!(center.unread_count(), 0);
    }

    #[test]
    fn test_newest_first_and_bounded() {
        let center = NotificationCenter::new(2);

        center.publish(event("a"));
        center.publish(event("b"));
        center.publish(event("c"));

        let items = center.list();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].event.course_id, "c");
        assert_eq!(items[1].event.course_id, "b");

        center.clear();
        assert!(center.list().is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_receive_published() {
        let center = NotificationCenter::default();
        let mut rx = center.subscribe();

        let sent = center.publish(event("loi-gauss"));
        let received = rx.recv().await.unwrap();

        assert_eq!(received, sent);
    }
}
