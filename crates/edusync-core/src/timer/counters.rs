//! Daily and per-cycle focus counters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::mode::Mode;

/// Completed focus sessions needed to grow a tree from seed to full size.
pub const GROW_STAGES: u32 = 4;

/// How far the current tree has grown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeLevel {
    Seed,
    Seedling,
    YoungTree,
    MatureTree,
    FullyGrown,
}

impl TreeLevel {
    pub fn from_stage(stage: u32) -> Self {
        match stage.min(GROW_STAGES) {
            0 => TreeLevel::Seed,
            1 => TreeLevel::Seedling,
            2 => TreeLevel::YoungTree,
            3 => TreeLevel::MatureTree,
            _ => TreeLevel::FullyGrown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TreeLevel::Seed => "Seed",
            TreeLevel::Seedling => "Seedling",
            TreeLevel::YoungTree => "Young Tree",
            TreeLevel::MatureTree => "Mature Tree",
            TreeLevel::FullyGrown => "Fully Grown Tree",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleCounters {
    pub sessions_completed_today: u32,
    /// Position within the current cycle, `0..long_break_interval`.
    pub cycle_index: u32,
    pub last_reset_date: NaiveDate,
    /// Tree growth, `0..=GROW_STAGES`. Kept across days; only
    /// `reset_progress` plants a new tree.
    #[serde(default)]
    pub stage: u32,
}

impl CycleCounters {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            sessions_completed_today: 0,
            cycle_index: 0,
            last_reset_date: today,
            stage: 0,
        }
    }

    pub fn tree_level(&self) -> TreeLevel {
        TreeLevel::from_stage(self.stage)
    }

    /// Zero both daily counters if `today` differs from the last reset date.
    /// Returns whether a rollover happened.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.last_reset_date == today {
            return false;
        }
        self.sessions_completed_today = 0;
        self.cycle_index = 0;
        self.last_reset_date = today;
        true
    }

    /// Copy of the counters as they read on `today`.
    pub fn as_of(&self, today: NaiveDate) -> Self {
        let mut counters = self.clone();
        counters.roll_over(today);
        counters
    }

    /// Credit one completed focus session and return the break that follows.
    pub fn record_focus(&mut self, long_break_interval: u32) -> Mode {
        let interval = long_break_interval.max(1);
        self.sessions_completed_today = self.sessions_completed_today.saturating_add(1);
        self.cycle_index = (self.cycle_index + 1) % interval;
        self.stage = (self.stage + 1).min(GROW_STAGES);
        if self.cycle_index == 0 {
            Mode::LongBreak
        } else {
            Mode::ShortBreak
        }
    }

    /// The mode that would follow `completed`, without crediting anything.
    pub fn next_after(&self, completed: Mode, long_break_interval: u32) -> Mode {
        match completed {
            Mode::Focus => {
                let interval = long_break_interval.max(1);
                if (self.cycle_index + 1) % interval == 0 {
                    Mode::LongBreak
                } else {
                    Mode::ShortBreak
                }
            }
            Mode::ShortBreak | Mode::LongBreak => Mode::Focus,
        }
    }
}
