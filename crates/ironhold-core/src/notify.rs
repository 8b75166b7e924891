//! Notification sinks.
//!
//! Operations describe what observers should learn as [`Notification`]s and
//! hand them to a [`NotificationSink`]. Encoding for a client protocol is
//! the sink's business.

use std::sync::{Arc, Mutex, PoisonError};

use ironhold_types::Notification;
use tracing::debug;

/// Receives every notification produced by the fire loop.
pub trait NotificationSink: Send + std::fmt::Debug {
    /// Deliver one notification.
    fn dispatch(&mut self, notification: Notification);
}

/// Collects notifications in memory.
///
/// Clones share the same buffer, so a test can keep one clone and give the
/// other to the simulation.
#[derive(Debug, Clone, Default)]
pub struct BufferedSink {
    buffer: Arc<Mutex<Vec<Notification>>>,
}

impl BufferedSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every buffered notification.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.buffer.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Copy of the buffered notifications.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of buffered notifications.
    pub fn len(&self) -> usize {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for BufferedSink {
    fn dispatch(&mut self, notification: Notification) {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

/// Writes notifications to the log at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn dispatch(&mut self, notification: Notification) {
        debug!(
            audience = ?notification.audience,
            payloads = ?notification.payloads,
            "notification"
        );
    }
}

#[cfg(test)]
mod tests {
    use ironhold_types::{CreatureId, MessageKind};

    use super::*;

    #[test]
    fn buffered_clones_share_storage() {
        let reader = BufferedSink::new();
        let mut writer = reader.clone();
        writer.dispatch(Notification::text(CreatureId(1), MessageKind::Event, "hello"));
        assert_eq!(reader.len(), 1);
        assert_eq!(reader.drain().len(), 1);
        assert!(writer.is_empty());
    }
}
