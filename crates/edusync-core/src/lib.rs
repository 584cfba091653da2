//! # EduSync Core Library
//!
//! Focus-session scheduling for the EduSync study tracker: a Pomodoro timer
//! that survives reloads and process restarts while staying accurate to the
//! wall clock, and that announces completed sessions on several
//! independently failing notification channels.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a tick-driven state machine that persists a snapshot
//!   with an absolute end timestamp on every transition and recovers from it
//! - **Storage**: a key/value [`ClockStore`] (in-memory or SQLite) and
//!   TOML-based configuration
//! - **Notifications**: a dispatcher fanning one record out to toast, OS
//!   notification, audio, history and remote channels
//! - **Driver**: the 1 Hz loop tying the two together
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`NotificationDispatcher`]: Completion fan-out
//! - [`FocusDriver`]: Composition root
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod driver;
pub mod error;
pub mod events;
pub mod notify;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::{FocusDriver, Step};
pub use error::{ChannelError, ConfigError, CoreError, StoreError};
pub use events::Event;
pub use notify::{DispatchReport, HistoryLog, NotificationDispatcher, NotificationRecord};
pub use storage::{ClockStore, Config, MemoryStore, SqliteStore, TimerConfig};
pub use timer::{Mode, RecoveryOutcome, TimerEngine, TimerState, TreeLevel};
