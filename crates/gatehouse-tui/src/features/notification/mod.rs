//! Transient notification banner.
//!
//! At most one notification is visible. A new one replaces the old one.

mod render;

use std::time::{Duration, Instant};

pub use render::notification_lines;

/// How long a notification stays up unless dismissed.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Error,
    Success,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub raised_at: Instant,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) >= NOTIFICATION_TTL
    }
}

#[derive(Debug, Default)]
pub struct NotificationState {
    current: Option<Notification>,
}

impl NotificationState {
    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.current.is_some()
    }

    pub fn raise(&mut self, kind: NotificationKind, message: impl Into<String>) {
        self.current = Some(Notification {
            kind,
            message: message.into(),
            raised_at: Instant::now(),
        });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.raise(NotificationKind::Error, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.raise(NotificationKind::Success, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.raise(NotificationKind::Info, message);
    }

    /// Removes the notification. Returns whether one was visible.
    pub fn dismiss(&mut self) -> bool {
        self.current.take().is_some()
    }

    /// Drops the notification once its time is up.
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.current.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.current = None;
            return true;
        }
        false
    }
}
