mod counters;
mod engine;
mod mode;
mod session;

pub use counters::{CycleCounters, TreeLevel, GROW_STAGES};
pub use engine::{RecoveryOutcome, TimerEngine, TimerState, COUNTERS_KEY, SESSION_KEY};
pub use mode::Mode;
pub use session::{PersistedSnapshot, Session};
