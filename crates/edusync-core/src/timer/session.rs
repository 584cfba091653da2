//! The live session and its persisted form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::counters::CycleCounters;
use super::mode::Mode;
use crate::storage::TimerConfig;

/// One focus or break interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub mode: Mode,
    pub remaining_seconds: u64,
    /// Duration captured when the session was created.
    pub duration_seconds: u64,
    /// Absolute end time while running; `None` when idle or paused.
    pub end_timestamp_ms: Option<i64>,
}

impl Session {
    /// A full-length, not yet started session.
    pub fn fresh(mode: Mode, config: &TimerConfig) -> Self {
        let duration = config.duration_secs(mode);
        Self {
            mode,
            remaining_seconds: duration,
            duration_seconds: duration,
            end_timestamp_ms: None,
        }
    }

    pub fn is_untouched(&self) -> bool {
        self.remaining_seconds == self.duration_seconds && self.end_timestamp_ms.is_none()
    }

    /// 0.0 .. 1.0 progress within the session.
    pub fn progress(&self) -> f64 {
        if self.duration_seconds == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_seconds as f64 / self.duration_seconds as f64)
    }
}

/// What the engine writes to the store under `timer.session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    pub mode: Mode,
    pub remaining_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_timestamp_ms: Option<i64>,
    pub sessions_completed_today: u32,
    pub cycle_index: u32,
    pub last_reset_date: NaiveDate,
    #[serde(default)]
    pub stage: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
}

impl PersistedSnapshot {
    pub fn new(session: &Session, counters: &CycleCounters) -> Self {
        Self {
            mode: session.mode,
            remaining_seconds: session.remaining_seconds,
            end_timestamp_ms: session.end_timestamp_ms,
            sessions_completed_today: counters.sessions_completed_today,
            cycle_index: counters.cycle_index,
            last_reset_date: counters.last_reset_date,
            stage: counters.stage,
            duration_seconds: Some(session.duration_seconds),
        }
    }

    pub fn counters(&self) -> CycleCounters {
        CycleCounters {
            sessions_completed_today: self.sessions_completed_today,
            cycle_index: self.cycle_index,
            last_reset_date: self.last_reset_date,
            stage: self.stage,
        }
    }

    /// Structural checks beyond what serde enforces.
    pub fn validate(&self) -> Result<(), String> {
        if self.duration_seconds == Some(0) {
            return Err("zero duration".to_string());
        }
        if let Some(duration) = self.duration_seconds {
            if self.remaining_seconds > duration {
                return Err(format!(
                    "remaining {}s exceeds duration {}s",
                    self.remaining_seconds, duration
                ));
            }
        }
        if self.end_timestamp_ms.is_none() && self.remaining_seconds == 0 {
            return Err("paused session with nothing remaining".to_string());
        }
        Ok(())
    }
}
