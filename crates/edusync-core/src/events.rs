use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Mode, RecoveryOutcome, TimerState, TreeLevel};

/// Every state change of the timer engine produces an Event.
/// The driver routes `SessionCompleted` to the notification dispatcher;
/// front-ends render the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: Mode,
        remaining_secs: u64,
        end_timestamp_ms: i64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    SessionCompleted {
        completed: Mode,
        next: Mode,
        sessions_completed_today: u32,
        cycle_index: u32,
        at: DateTime<Utc>,
    },
    /// The engine rebuilt its session from persisted state.
    Recovered {
        outcome: RecoveryOutcome,
        state: TimerState,
        mode: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    ProgressReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        mode: Mode,
        remaining_secs: u64,
        total_secs: u64,
        progress: f64,
        sessions_completed_today: u32,
        cycle_index: u32,
        long_break_interval: u32,
        tree_stage: u32,
        tree_level: TreeLevel,
        persistence_degraded: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// The mode whose completion this event announces, if any.
    pub fn completed_mode(&self) -> Option<Mode> {
        match self {
            Event::SessionCompleted { completed, .. } => Some(*completed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_snake_case() {
        let ev = Event::TimerReset { at: Utc::now() };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "timer_reset");

        let ev = Event::SessionCompleted {
            completed: Mode::Focus,
            next: Mode::ShortBreak,
            sessions_completed_today: 1,
            cycle_index: 1,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "session_completed");
        assert_eq!(json["completed"], "focus");
        assert_eq!(ev.completed_mode(), Some(Mode::Focus));
    }
}
