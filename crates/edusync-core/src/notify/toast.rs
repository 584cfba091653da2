//! In-app toasts: short-lived, always shown.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::channel::{ChannelKind, DeliveryContext, NotificationChannel};
use super::record::NotificationRecord;
use crate::clock::Clock;
use crate::error::ChannelError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub record: NotificationRecord,
    pub dismiss_at_ms: i64,
}

/// Toasts currently on screen. Clones share the same board.
#[derive(Debug, Clone, Default)]
pub struct ToastBoard {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl ToastBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a toast, dropping any that expired by `now_ms`.
    fn push(&self, toast: Toast, now_ms: i64) {
        let mut toasts = self.toasts.lock().unwrap_or_else(|e| e.into_inner());
        toasts.retain(|t| t.dismiss_at_ms > now_ms);
        toasts.push(toast);
    }

    /// Drop expired toasts and return the rest, oldest first.
    pub fn active(&self, now_ms: i64) -> Vec<Toast> {
        let mut toasts = self.toasts.lock().unwrap_or_else(|e| e.into_inner());
        toasts.retain(|t| t.dismiss_at_ms > now_ms);
        toasts.clone()
    }

    /// Toasts held, expired or not.
    pub fn len(&self) -> usize {
        self.toasts.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dismiss(&self, id: &str) -> bool {
        let mut toasts = self.toasts.lock().unwrap_or_else(|e| e.into_inner());
        let before = toasts.len();
        toasts.retain(|t| t.record.id != id);
        toasts.len() != before
    }
}

/// Renders a toast somewhere visible (terminal line, overlay, ...).
pub trait ToastSink: Send {
    fn show(&mut self, toast: &Toast) -> Result<(), ChannelError>;
}

pub struct ToastChannel {
    board: ToastBoard,
    clock: Arc<dyn Clock>,
    duration_ms: i64,
    sink: Option<Box<dyn ToastSink>>,
}

impl ToastChannel {
    pub fn new(board: ToastBoard, clock: Arc<dyn Clock>, duration_secs: u64) -> Self {
        Self {
            board,
            clock,
            duration_ms: i64::try_from(duration_secs)
                .unwrap_or(i64::MAX)
                .saturating_mul(1000),
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: impl ToastSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }
}

impl NotificationChannel for ToastChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Toast
    }

    fn deliver(
        &mut self,
        record: &NotificationRecord,
        _ctx: &DeliveryContext,
    ) -> Result<(), ChannelError> {
        let now = self.clock.now_ms();
        let toast = Toast {
            record: record.clone(),
            dismiss_at_ms: now.saturating_add(self.duration_ms),
        };
        if let Some(sink) = self.sink.as_mut() {
            sink.show(&toast)?;
        }
        self.board.push(toast, now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notify::record::{Category, Message};

    fn record() -> NotificationRecord {
        NotificationRecord::new(
            Category::Focus,
            Message {
                primary: "done".into(),
                secondary: "تم".into(),
            },
            chrono::Utc::now(),
        )
    }

    #[test]
    fn toast_is_dismissed_after_duration() {
        let clock = Arc::new(ManualClock::new(10_000));
        let board = ToastBoard::new();
        let mut channel = ToastChannel::new(board.clone(), clock.clone(), 5);

        channel
            .deliver(&record(), &DeliveryContext::default())
            .unwrap();
        assert_eq!(board.active(clock.now_ms()).len(), 1);
        assert_eq!(board.active(clock.now_ms())[0].dismiss_at_ms, 15_000);

        clock.advance_secs(5);
        assert!(board.active(clock.now_ms()).is_empty());
    }

    #[test]
    fn toast_ignores_preferences() {
        let clock = Arc::new(ManualClock::new(0));
        let board = ToastBoard::new();
        let mut channel = ToastChannel::new(board.clone(), clock, 5);
        let ctx = DeliveryContext {
            sound_enabled: false,
            notifications_enabled: false,
        };
        assert!(channel.deliver(&record(), &ctx).is_ok());
        assert_eq!(board.active(0).len(), 1);
    }

    #[test]
    fn new_toast_drops_expired_ones() {
        let clock = Arc::new(ManualClock::new(0));
        let board = ToastBoard::new();
        let mut channel = ToastChannel::new(board.clone(), clock.clone(), 5);
        for _ in 0..10 {
            channel.deliver(&record(), &DeliveryContext::default()).unwrap();
            clock.advance_secs(60);
        }
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn dismiss_by_id() {
        let clock = Arc::new(ManualClock::new(0));
        let board = ToastBoard::new();
        let mut channel = ToastChannel::new(board.clone(), clock, 5);
        let rec = record();
        channel.deliver(&rec, &DeliveryContext::default()).unwrap();
        assert!(board.dismiss(&rec.id));
        assert!(!board.dismiss(&rec.id));
    }
}
