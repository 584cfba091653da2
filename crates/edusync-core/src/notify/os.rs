//! Desktop notifications behind a permission gate.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::channel::{ChannelKind, DeliveryContext, NotificationChannel};
use super::record::NotificationRecord;
use crate::error::ChannelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Not asked yet
    Default,
    Granted,
    Denied,
    /// The host has no notification facility
    Unsupported,
}

/// Host notification facility.
pub trait OsNotifier: Send {
    fn permission(&self) -> Permission;

    /// Prompt the user. Called at most once per channel.
    fn request_permission(&mut self) -> Permission;

    fn show(&mut self, title: &str, body: &str) -> Result<(), ChannelError>;
}

pub struct OsNotificationChannel {
    notifier: Box<dyn OsNotifier>,
    prompted: bool,
}

impl OsNotificationChannel {
    pub fn new(notifier: impl OsNotifier + 'static) -> Self {
        Self {
            notifier: Box::new(notifier),
            prompted: false,
        }
    }

    pub fn permission(&self) -> Permission {
        self.notifier.permission()
    }
}

impl NotificationChannel for OsNotificationChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::OsNotification
    }

    fn deliver(
        &mut self,
        record: &NotificationRecord,
        ctx: &DeliveryContext,
    ) -> Result<(), ChannelError> {
        if !ctx.notifications_enabled {
            return Err(ChannelError::Disabled);
        }
        match self.notifier.permission() {
            Permission::Granted => self.notifier.show(record.title(), &record.body()),
            Permission::Default | Permission::Denied => Err(ChannelError::PermissionDenied),
            Permission::Unsupported => Err(ChannelError::Unsupported(
                "no desktop notification service".to_string(),
            )),
        }
    }

    fn on_user_start(&mut self, ctx: &DeliveryContext) {
        if self.prompted || !ctx.notifications_enabled {
            return;
        }
        if self.notifier.permission() == Permission::Default {
            self.prompted = true;
            let granted = self.notifier.request_permission();
            info!(permission = ?granted, "notification permission requested");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::notify::record::{Category, Message};

    #[derive(Clone)]
    struct FakeNotifier {
        state: Arc<Mutex<(Permission, Permission, usize, Vec<String>)>>,
    }

    impl FakeNotifier {
        /// `current` permission, what a prompt resolves to.
        fn new(current: Permission, answer: Permission) -> Self {
            Self {
                state: Arc::new(Mutex::new((current, answer, 0, Vec::new()))),
            }
        }

        fn prompts(&self) -> usize {
            self.state.lock().unwrap().2
        }

        fn shown(&self) -> Vec<String> {
            self.state.lock().unwrap().3.clone()
        }
    }

    impl OsNotifier for FakeNotifier {
        fn permission(&self) -> Permission {
            self.state.lock().unwrap().0
        }

        fn request_permission(&mut self) -> Permission {
            let mut s = self.state.lock().unwrap();
            s.2 += 1;
            s.0 = s.1;
            s.0
        }

        fn show(&mut self, title: &str, _body: &str) -> Result<(), ChannelError> {
            self.state.lock().unwrap().3.push(title.to_string());
            Ok(())
        }
    }

    fn record() -> NotificationRecord {
        NotificationRecord::new(
            Category::Focus,
            Message {
                primary: "a".into(),
                secondary: "b".into(),
            },
            chrono::Utc::now(),
        )
    }

    #[test]
    fn prompts_once_then_delivers() {
        let fake = FakeNotifier::new(Permission::Default, Permission::Granted);
        let mut channel = OsNotificationChannel::new(fake.clone());
        let ctx = DeliveryContext::default();

        assert!(matches!(
            channel.deliver(&record(), &ctx),
            Err(ChannelError::PermissionDenied)
        ));
        channel.on_user_start(&ctx);
        channel.on_user_start(&ctx);
        assert_eq!(fake.prompts(), 1);

        channel.deliver(&record(), &ctx).unwrap();
        assert_eq!(fake.shown(), vec!["Pomodoro complete!".to_string()]);
    }

    #[test]
    fn denied_is_never_reprompted() {
        let fake = FakeNotifier::new(Permission::Default, Permission::Denied);
        let mut channel = OsNotificationChannel::new(fake.clone());
        let ctx = DeliveryContext::default();
        channel.on_user_start(&ctx);
        channel.on_user_start(&ctx);
        assert_eq!(fake.prompts(), 1);
        let err = channel.deliver(&record(), &ctx).unwrap_err();
        assert!(err.is_skip());
    }

    #[test]
    fn disabled_preference_skips_without_prompt() {
        let fake = FakeNotifier::new(Permission::Default, Permission::Granted);
        let mut channel = OsNotificationChannel::new(fake.clone());
        let ctx = DeliveryContext {
            sound_enabled: true,
            notifications_enabled: false,
        };
        channel.on_user_start(&ctx);
        assert_eq!(fake.prompts(), 0);
        assert!(matches!(
            channel.deliver(&record(), &ctx),
            Err(ChannelError::Disabled)
        ));
    }

    #[test]
    fn unsupported_host_is_a_skip() {
        let fake = FakeNotifier::new(Permission::Unsupported, Permission::Unsupported);
        let mut channel = OsNotificationChannel::new(fake);
        let err = channel
            .deliver(&record(), &DeliveryContext::default())
            .unwrap_err();
        assert!(matches!(err, ChannelError::Unsupported(_)));
    }
}
