//! Transient user notifications.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;

/// How long a notification stays visible.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Oldest entries are evicted past this many.
pub const NOTIFICATION_HISTORY_LIMIT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    pub shown_at: Instant,
}

impl Notification {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            shown_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.shown_at) >= ttl
    }
}

/// Display surface for notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// In-memory notification surface that auto-dismisses after a fixed TTL.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    ttl: Duration,
    entries: Arc<Mutex<Vec<Notification>>>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(NOTIFICATION_TTL)
    }
}

impl NotificationCenter {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Notifications still visible at `now`.
    pub fn active_at(&self, now: Instant) -> Vec<Notification> {
        self.entries
            .lock()
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| !entry.is_expired(now, self.ttl))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn active(&self) -> Vec<Notification> {
        self.active_at(Instant::now())
    }

    /// Recent messages, including dismissed ones, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.iter().map(|entry| entry.message.clone()).collect())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notification> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.last().cloned())
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Success => tracing::info!("{}", notification.message),
            Severity::Error => tracing::warn!("{}", notification.message),
        }
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() >= NOTIFICATION_HISTORY_LIMIT {
                let excess = entries.len() + 1 - NOTIFICATION_HISTORY_LIMIT;
                entries.drain(..excess);
            }
            entries.push(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_expire_after_ttl() {
        let center = NotificationCenter::new(Duration::from_secs(3));
        center.notify(Notification::success("Note uploaded successfully!"));
        let shown_at = center.last().unwrap().shown_at;

        assert_eq!(center.active_at(shown_at + Duration::from_secs(2)).len(), 1);
        assert!(center
            .active_at(shown_at + Duration::from_secs(3))
            .is_empty());
    }

    #[test]
    fn last_reports_most_recent_message() {
        let center = NotificationCenter::default();
        center.notify(Notification::success("first"));
        center.notify(Notification::error("second"));

        let last = center.last().unwrap();
        assert_eq!(last.severity, Severity::Error);
        assert_eq!(last.message, "second");
        assert_eq!(center.history(), vec!["first", "second"]);
    }

    #[test]
    fn history_is_bounded() {
        let center = NotificationCenter::default();
        for tick in 0..NOTIFICATION_HISTORY_LIMIT + 10 {
            center.notify(Notification::error(format!("Sync tick {tick} failed")));
        }

        let history = center.history();
        assert_eq!(history.len(), NOTIFICATION_HISTORY_LIMIT);
        assert_eq!(history[0], "Sync tick 10 failed");
        assert_eq!(center.last().unwrap().message, "Sync tick 73 failed");
    }
}
