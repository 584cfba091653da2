use serde::{Deserialize, Serialize};

use super::record::NotificationRecord;
use crate::error::ChannelError;

/// Identifies a delivery channel in reports and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Toast,
    OsNotification,
    AudioChirp,
    History,
    Remote,
}

impl ChannelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Toast => "toast",
            ChannelKind::OsNotification => "os_notification",
            ChannelKind::AudioChirp => "audio_chirp",
            ChannelKind::History => "history",
            ChannelKind::Remote => "remote",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User preferences consulted at delivery time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryContext {
    pub sound_enabled: bool,
    pub notifications_enabled: bool,
}

impl Default for DeliveryContext {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            notifications_enabled: true,
        }
    }
}

/// One independently failing way of telling the user a session ended.
///
/// Returning a skip error (`PermissionDenied`, `Unsupported`, `Disabled`)
/// is reported as a skip; anything else is a failure. Neither affects the
/// other channels.
pub trait NotificationChannel: Send {
    fn kind(&self) -> ChannelKind;

    fn deliver(
        &mut self,
        record: &NotificationRecord,
        ctx: &DeliveryContext,
    ) -> Result<(), ChannelError>;

    /// Called on a user-initiated start, the only moment a channel may
    /// prompt the user.
    fn on_user_start(&mut self, _ctx: &DeliveryContext) {}
}
