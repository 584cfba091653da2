//! Fan-out of session-completion notifications.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::channel::{ChannelKind, DeliveryContext, NotificationChannel};
use super::messages::{self, MessageSelector};
use super::record::{Category, NotificationRecord};
use crate::clock::Clock;
use crate::timer::Mode;

/// Outcome of one channel's delivery attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    /// Channel is off, unsupported or lacks permission
    Skipped { reason: String },
    /// Delivery attempted and failed
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelResult {
    pub channel: ChannelKind,
    #[serde(flatten)]
    pub status: DeliveryStatus,
}

/// Everything that happened for one completed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReport {
    pub record: NotificationRecord,
    pub results: Vec<ChannelResult>,
}

impl DispatchReport {
    pub fn status_of(&self, channel: ChannelKind) -> Option<&DeliveryStatus> {
        self.results
            .iter()
            .find(|r| r.channel == channel)
            .map(|r| &r.status)
    }

    pub fn delivered_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.status, DeliveryStatus::Delivered))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.status, DeliveryStatus::Skipped { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.status, DeliveryStatus::Failed { .. }))
            .count()
    }
}

/// Builds one [`NotificationRecord`] per completed session and hands it to
/// every configured channel in order.
pub struct NotificationDispatcher {
    channels: Vec<Box<dyn NotificationChannel>>,
    selector: Box<dyn MessageSelector>,
    clock: Arc<dyn Clock>,
    context: DeliveryContext,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<ChannelKind> = self.channels.iter().map(|c| c.kind()).collect();
        f.debug_struct("NotificationDispatcher")
            .field("channels", &kinds)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl NotificationDispatcher {
    pub fn new(clock: Arc<dyn Clock>, selector: impl MessageSelector + 'static) -> Self {
        Self {
            channels: Vec::new(),
            selector: Box::new(selector),
            clock,
            context: DeliveryContext::default(),
        }
    }

    pub fn with_channel(mut self, channel: impl NotificationChannel + 'static) -> Self {
        self.add_channel(Box::new(channel));
        self
    }

    pub fn add_channel(&mut self, channel: Box<dyn NotificationChannel>) {
        self.channels.push(channel);
    }

    pub fn with_context(mut self, context: DeliveryContext) -> Self {
        self.context = context;
        self
    }

    pub fn set_context(&mut self, context: DeliveryContext) {
        self.context = context;
    }

    pub fn context(&self) -> DeliveryContext {
        self.context
    }

    pub fn channel_kinds(&self) -> Vec<ChannelKind> {
        self.channels.iter().map(|c| c.kind()).collect()
    }

    /// Give channels their one chance to ask the user for permission.
    pub fn prime_permissions(&mut self) {
        let ctx = self.context;
        for channel in &mut self.channels {
            channel.on_user_start(&ctx);
        }
    }

    /// Record announcing that `completed` ended, with a freshly selected
    /// message.
    pub fn compose(&mut self, completed: Mode) -> NotificationRecord {
        let message = messages::pick(self.selector.as_mut(), completed);
        NotificationRecord::new(
            Category::for_completed(completed),
            message,
            self.clock.now_utc(),
        )
    }

    pub fn dispatch(&mut self, completed: Mode) -> DispatchReport {
        let record = self.compose(completed);
        self.deliver(record)
    }

    /// Fan an already built record out to every channel.
    pub fn deliver(&mut self, record: NotificationRecord) -> DispatchReport {
        let ctx = self.context;
        let mut results = Vec::with_capacity(self.channels.len());

        for channel in &mut self.channels {
            let kind = channel.kind();
            let status = match channel.deliver(&record, &ctx) {
                Ok(()) => DeliveryStatus::Delivered,
                Err(e) if e.is_skip() => {
                    debug!(channel = %kind, reason = %e, "notification channel skipped");
                    DeliveryStatus::Skipped {
                        reason: e.to_string(),
                    }
                }
                Err(e) => {
                    warn!(channel = %kind, error = %e, "notification channel failed");
                    DeliveryStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            results.push(ChannelResult {
                channel: kind,
                status,
            });
        }

        DispatchReport { record, results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ChannelError;
    use crate::notify::messages::FixedSelector;

    struct Stub {
        kind: ChannelKind,
        outcome: fn() -> Result<(), ChannelError>,
        primed: usize,
    }

    impl NotificationChannel for Stub {
        fn kind(&self) -> ChannelKind {
            self.kind
        }

        fn deliver(
            &mut self,
            _record: &NotificationRecord,
            _ctx: &DeliveryContext,
        ) -> Result<(), ChannelError> {
            (self.outcome)()
        }

        fn on_user_start(&mut self, _ctx: &DeliveryContext) {
            self.primed += 1;
        }
    }

    fn stub(kind: ChannelKind, outcome: fn() -> Result<(), ChannelError>) -> Stub {
        Stub {
            kind,
            outcome,
            primed: 0,
        }
    }

    #[test]
    fn failures_are_isolated_per_channel() {
        let clock = Arc::new(ManualClock::new(1_714_521_600_000));
        let mut dispatcher = NotificationDispatcher::new(clock, FixedSelector(0))
            .with_channel(stub(ChannelKind::Toast, || Ok(())))
            .with_channel(stub(ChannelKind::OsNotification, || {
                Err(ChannelError::PermissionDenied)
            }))
            .with_channel(stub(ChannelKind::Remote, || {
                Err(ChannelError::Remote("boom".into()))
            }))
            .with_channel(stub(ChannelKind::History, || Ok(())));

        let report = dispatcher.dispatch(Mode::Focus);
        assert_eq!(report.results.len(), 4);
        assert_eq!(report.delivered_count(), 2);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(
            report.status_of(ChannelKind::History),
            Some(&DeliveryStatus::Delivered)
        );
        assert_eq!(report.record.category, Category::Focus);
        assert_eq!(
            report.record.created_at.timestamp_millis(),
            1_714_521_600_000
        );
    }

    #[test]
    fn report_serializes_flat_status() {
        let clock = Arc::new(ManualClock::new(0));
        let mut dispatcher = NotificationDispatcher::new(clock, FixedSelector(0))
            .with_channel(stub(ChannelKind::AudioChirp, || Err(ChannelError::Disabled)));
        let report = dispatcher.dispatch(Mode::ShortBreak);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["results"][0]["channel"], "audio_chirp");
        assert_eq!(json["results"][0]["status"], "skipped");
        assert_eq!(json["record"]["category"], "break");
    }

    #[test]
    fn channel_kinds_keep_order() {
        let clock = Arc::new(ManualClock::new(0));
        let dispatcher = NotificationDispatcher::new(clock, FixedSelector(0))
            .with_channel(stub(ChannelKind::Toast, || Ok(())))
            .with_channel(stub(ChannelKind::History, || Ok(())));
        assert_eq!(
            dispatcher.channel_kinds(),
            vec![ChannelKind::Toast, ChannelKind::History]
        );
    }
}
