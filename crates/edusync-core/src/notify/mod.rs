//! Session-completion notifications.
//!
//! The [`NotificationDispatcher`] turns a completed mode into one
//! [`NotificationRecord`] and fans it out to independent channels: toast,
//! OS notification, audio chirp, history and the remote sink.

mod audio;
mod channel;
mod dispatcher;
mod history;
mod messages;
mod os;
mod record;
mod remote;
mod toast;

pub use audio::{AudioChirpChannel, AudioSink, Chirp};
pub use channel::{ChannelKind, DeliveryContext, NotificationChannel};
pub use dispatcher::{ChannelResult, DeliveryStatus, DispatchReport, NotificationDispatcher};
pub use history::{HistoryChannel, HistoryLog, HISTORY_KEY};
pub use messages::{messages_for, FixedSelector, MessageSelector, RandomSelector};
pub use os::{OsNotificationChannel, OsNotifier, Permission};
pub use record::{Category, Message, NotificationRecord};
pub use remote::{RemoteChannel, RemoteSink};
pub use toast::{Toast, ToastBoard, ToastChannel, ToastSink};
