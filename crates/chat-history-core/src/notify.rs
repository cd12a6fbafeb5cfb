//! Short-lived error notifications.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A message shown to the user until it expires.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub shown_at: Instant,
    pub expires_at: Instant,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Holds the notifications currently on screen.
///
/// Expired entries are pruned lazily whenever the list is read or extended.
pub struct Notifier {
    ttl: Duration,
    active: Mutex<Vec<Notification>>,
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            active: Mutex::new(Vec::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Show `message` starting at `now`.
    pub fn push_at(&self, message: impl Into<String>, now: Instant) -> Notification {
        let notification = Notification {
            message: message.into(),
            shown_at: now,
            expires_at: now + self.ttl,
        };
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.retain(|n| !n.is_expired(now));
        active.push(notification.clone());
        notification
    }

    pub fn push(&self, message: impl Into<String>) -> Notification {
        self.push_at(message, Instant::now())
    }

    /// Notifications still visible at `now`, oldest first.
    pub fn active_at(&self, now: Instant) -> Vec<Notification> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.retain(|n| !n.is_expired(now));
        active.clone()
    }

    pub fn active(&self) -> Vec<Notification> {
        self.active_at(Instant::now())
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}
