//! Timer engine implementation.
//!
//! The timer engine is a tick-driven state machine. It does not use internal
//! threads - the caller is responsible for calling `tick()` once per second
//! and for calling `recover()` whenever the host reloads or regains
//! visibility.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running
//!           |
//!           +-- remaining hits 0 --> Running (next mode), or Idle without auto-start
//! ```
//!
//! ## Persistence
//!
//! Every transition writes a [`PersistedSnapshot`] through the injected
//! [`ClockStore`]. A running session stores its absolute end timestamp, so
//! recovery computes the remaining time from the wall clock instead of
//! replaying ticks. Store failures switch the engine to in-memory operation.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::restore(config, store, Arc::new(SystemClock))?;
//! engine.start();
//! // Once per second:
//! if let Some(event) = engine.tick() { /* SessionCompleted */ }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::counters::CycleCounters;
use super::mode::Mode;
use super::session::{PersistedSnapshot, Session};
use crate::clock::Clock;
use crate::error::{ConfigError, StoreError};
use crate::events::Event;
use crate::storage::{ClockStore, TimerConfig};

/// Store key of the persisted session snapshot.
pub const SESSION_KEY: &str = "timer.session";
/// Store key of the cycle counters; outlives `reset()`.
pub const COUNTERS_KEY: &str = "timer.counters";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// How `recover()` rebuilt the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecoveryOutcome {
    /// Nothing persisted; fresh focus session.
    Fresh,
    /// Persisted snapshot unreadable; fresh focus session.
    Corrupt,
    /// Paused or idle session restored without ticking.
    Restored,
    /// Running session resumed from its end timestamp.
    Resumed,
    /// The session ran out while the host was away. Nothing was credited.
    Expired { missed: Mode, next: Mode },
}

enum Loaded {
    Absent,
    Corrupt(String),
    Valid(PersistedSnapshot),
}

/// Core timer engine.
///
/// Exclusively owns the live [`Session`] and [`CycleCounters`].
pub struct TimerEngine {
    config: TimerConfig,
    session: Session,
    counters: CycleCounters,
    state: TimerState,
    store: Box<dyn ClockStore>,
    clock: Arc<dyn Clock>,
    persistence_degraded: bool,
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("counters", &self.counters)
            .field("state", &self.state)
            .field("persistence_degraded", &self.persistence_degraded)
            .finish_non_exhaustive()
    }
}

impl TimerEngine {
    /// Create an idle engine with a fresh focus session. Does not read the
    /// store; call [`TimerEngine::recover`] (or use [`TimerEngine::restore`])
    /// to pick up persisted state.
    pub fn new(
        config: TimerConfig,
        store: impl ClockStore + 'static,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let session = Session::fresh(Mode::Focus, &config);
        let counters = CycleCounters::new(clock.today());
        Ok(Self {
            config,
            session,
            counters,
            state: TimerState::Idle,
            store: Box::new(store),
            clock,
            persistence_degraded: false,
        })
    }

    /// Create an engine and immediately run recovery.
    pub fn restore(
        config: TimerConfig,
        store: impl ClockStore + 'static,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let mut engine = Self::new(config, store, clock)?;
        engine.recover();
        Ok(engine)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn mode(&self) -> Mode {
        self.session.mode
    }

    pub fn remaining_secs(&self) -> u64 {
        self.session.remaining_seconds
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn counters(&self) -> &CycleCounters {
        &self.counters
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn persistence_degraded(&self) -> bool {
        self.persistence_degraded
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let counters = self.counters.as_of(self.clock.today());
        Event::StateSnapshot {
            state: self.state,
            mode: self.session.mode,
            remaining_secs: self.session.remaining_seconds,
            total_secs: self.session.duration_seconds,
            progress: self.session.progress(),
            sessions_completed_today: counters.sessions_completed_today,
            cycle_index: counters.cycle_index,
            long_break_interval: self.config.long_break_interval,
            tree_stage: counters.stage,
            tree_level: counters.tree_level(),
            persistence_degraded: self.persistence_degraded,
            at: self.clock.now_utc(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or resume ticking. Returns `None` if already running.
    pub fn start(&mut self) -> Option<Event> {
        if self.state == TimerState::Running {
            return None;
        }
        let now = self.clock.now_ms();
        self.begin_running(now);
        debug!(
            mode = %self.session.mode,
            remaining = self.session.remaining_seconds,
            "timer started"
        );
        Some(Event::TimerStarted {
            mode: self.session.mode,
            remaining_secs: self.session.remaining_seconds,
            end_timestamp_ms: self.session.end_timestamp_ms.unwrap_or(now),
            at: self.clock.now_utc(),
        })
    }

    /// Freeze the remaining time. The persisted snapshot loses its end
    /// timestamp so a reload does not fast-forward a paused session.
    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.state = TimerState::Paused;
        self.session.end_timestamp_ms = None;
        self.persist();
        debug!(remaining = self.session.remaining_seconds, "timer paused");
        Some(Event::TimerPaused {
            mode: self.session.mode,
            remaining_secs: self.session.remaining_seconds,
            at: self.clock.now_utc(),
        })
    }

    /// Stop ticking, drop the persisted session and return to a full focus
    /// session. Counters are kept.
    pub fn reset(&mut self) -> Event {
        self.state = TimerState::Idle;
        self.session = Session::fresh(Mode::Focus, &self.config);
        self.erase(SESSION_KEY);
        self.persist_counters();
        debug!("timer reset");
        Event::TimerReset {
            at: self.clock.now_utc(),
        }
    }

    /// Zero today's counters and the cycle position, and plant a new tree.
    pub fn reset_progress(&mut self) -> Event {
        self.counters = CycleCounters::new(self.clock.today());
        self.persist_counters();
        info!("cycle progress reset");
        Event::ProgressReset {
            at: self.clock.now_utc(),
        }
    }

    /// Advance one second. Returns `Some(Event::SessionCompleted)` when the
    /// session runs out.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.session.remaining_seconds = self.session.remaining_seconds.saturating_sub(1);
        if self.session.remaining_seconds > 0 {
            return None;
        }

        let completed = self.session.mode;
        self.counters.roll_over(self.clock.today());
        let next = match completed {
            Mode::Focus => self.counters.record_focus(self.config.long_break_interval),
            Mode::ShortBreak | Mode::LongBreak => Mode::Focus,
        };

        self.session = Session::fresh(next, &self.config);
        if self.config.auto_start {
            let now = self.clock.now_ms();
            self.begin_running(now);
        } else {
            self.state = TimerState::Idle;
            self.persist();
        }

        info!(
            completed = %completed,
            next = %next,
            sessions_today = self.counters.sessions_completed_today,
            "session completed"
        );
        Some(Event::SessionCompleted {
            completed,
            next,
            sessions_completed_today: self.counters.sessions_completed_today,
            cycle_index: self.counters.cycle_index,
            at: self.clock.now_utc(),
        })
    }

    /// Replace the configuration.
    ///
    /// Invalid configurations are rejected and the current one kept. A
    /// session that has already started keeps its captured duration; an
    /// untouched idle session is rebuilt with the new one.
    pub fn update_config(&mut self, config: TimerConfig) -> Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            warn!(error = %e, "rejected timer configuration");
            return Err(e);
        }
        self.config = config;
        self.counters.cycle_index %= self.config.long_break_interval;
        if self.state == TimerState::Idle && self.session.is_untouched() {
            self.session = Session::fresh(self.session.mode, &self.config);
        }
        Ok(())
    }

    /// Rebuild the in-memory session from persisted state.
    ///
    /// Runs at load and on visibility regain. A session that expired while
    /// the host was away snaps to a fresh session of the mode that would
    /// have followed; nothing is credited and no completion is emitted.
    pub fn recover(&mut self) -> Event {
        let now = self.clock.now_ms();
        let today = self.clock.today();

        let (loaded, stored_counters) = if self.persistence_degraded {
            (
                Loaded::Valid(PersistedSnapshot::new(&self.session, &self.counters)),
                Some(self.counters.clone()),
            )
        } else {
            let loaded = self.load_snapshot();
            (loaded, self.load_stored_counters())
        };

        self.state = TimerState::Idle;
        let outcome = match loaded {
            Loaded::Absent => {
                self.counters = stored_counters.unwrap_or_else(|| CycleCounters::new(today));
                self.normalize_counters(today);
                self.session = Session::fresh(Mode::Focus, &self.config);
                RecoveryOutcome::Fresh
            }
            Loaded::Corrupt(reason) => {
                warn!(%reason, "discarding corrupt timer snapshot");
                self.erase(SESSION_KEY);
                self.counters = stored_counters.unwrap_or_else(|| CycleCounters::new(today));
                self.normalize_counters(today);
                self.session = Session::fresh(Mode::Focus, &self.config);
                RecoveryOutcome::Corrupt
            }
            Loaded::Valid(snapshot) => {
                self.counters = stored_counters.unwrap_or_else(|| snapshot.counters());
                self.normalize_counters(today);
                self.restore_snapshot(&snapshot, now)
            }
        };

        info!(
            ?outcome,
            mode = %self.session.mode,
            remaining = self.session.remaining_seconds,
            "timer recovered"
        );
        Event::Recovered {
            outcome,
            state: self.state,
            mode: self.session.mode,
            remaining_secs: self.session.remaining_seconds,
            at: self.clock.now_utc(),
        }
    }

    /// Stop the engine. Persisted state is left for the next load.
    pub fn dispose(self) {
        debug!(state = ?self.state, "timer engine disposed");
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn restore_snapshot(&mut self, snapshot: &PersistedSnapshot, now: i64) -> RecoveryOutcome {
        let mode = snapshot.mode;
        let duration = snapshot
            .duration_seconds
            .unwrap_or_else(|| self.config.duration_secs(mode));

        let Some(end) = snapshot.end_timestamp_ms else {
            if snapshot.remaining_seconds >= duration {
                self.session = Session::fresh(mode, &self.config);
                self.state = TimerState::Idle;
            } else {
                self.session = Session {
                    mode,
                    remaining_seconds: snapshot.remaining_seconds,
                    duration_seconds: duration,
                    end_timestamp_ms: None,
                };
                self.state = TimerState::Paused;
            }
            return RecoveryOutcome::Restored;
        };

        let remaining = round_secs(end.saturating_sub(now));
        if remaining > 0 {
            let remaining = remaining as u64;
            if remaining > duration {
                // End lies beyond what the session allows; the clock moved back.
                self.session = Session {
                    mode,
                    remaining_seconds: duration,
                    duration_seconds: duration,
                    end_timestamp_ms: None,
                };
                self.begin_running(now);
            } else {
                self.session = Session {
                    mode,
                    remaining_seconds: remaining,
                    duration_seconds: duration,
                    end_timestamp_ms: Some(end),
                };
                self.state = TimerState::Running;
            }
            return RecoveryOutcome::Resumed;
        }

        let next = self
            .counters
            .next_after(mode, self.config.long_break_interval);
        self.erase(SESSION_KEY);
        self.session = Session::fresh(next, &self.config);
        if self.config.auto_start {
            self.begin_running(now);
        } else {
            self.persist();
        }
        RecoveryOutcome::Expired { missed: mode, next }
    }

    fn begin_running(&mut self, now: i64) {
        let remaining_ms = i64::try_from(self.session.remaining_seconds)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        self.session.end_timestamp_ms = Some(now.saturating_add(remaining_ms));
        self.state = TimerState::Running;
        self.persist();
    }

    fn normalize_counters(&mut self, today: chrono::NaiveDate) {
        self.counters.roll_over(today);
        self.counters.cycle_index %= self.config.long_break_interval.max(1);
    }

    fn load_snapshot(&mut self) -> Loaded {
        let raw = match self.store.get(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Loaded::Absent,
            Err(e) => {
                self.degrade(&e);
                return Loaded::Absent;
            }
        };
        match serde_json::from_str::<PersistedSnapshot>(&raw) {
            Ok(snapshot) => match snapshot.validate() {
                Ok(()) => Loaded::Valid(snapshot),
                Err(reason) => Loaded::Corrupt(reason),
            },
            Err(e) => Loaded::Corrupt(e.to_string()),
        }
    }

    fn load_stored_counters(&mut self) -> Option<CycleCounters> {
        if self.persistence_degraded {
            return None;
        }
        match self.store.get(COUNTERS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(counters) => Some(counters),
                Err(e) => {
                    debug!(error = %e, "ignoring unreadable cycle counters");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                self.degrade(&e);
                None
            }
        }
    }

    fn persist(&mut self) {
        let snapshot = PersistedSnapshot::new(&self.session, &self.counters);
        match serde_json::to_string(&snapshot) {
            Ok(json) => self.write(SESSION_KEY, &json),
            Err(e) => warn!(error = %e, "cannot serialize timer snapshot"),
        }
        self.persist_counters();
    }

    fn persist_counters(&mut self) {
        match serde_json::to_string(&self.counters) {
            Ok(json) => self.write(COUNTERS_KEY, &json),
            Err(e) => warn!(error = %e, "cannot serialize cycle counters"),
        }
    }

    fn write(&mut self, key: &str, value: &str) {
        if self.persistence_degraded {
            return;
        }
        if let Err(e) = self.store.set(key, value) {
            self.degrade(&e);
        }
    }

    fn erase(&mut self, key: &str) {
        if self.persistence_degraded {
            return;
        }
        if let Err(e) = self.store.remove(key) {
            self.degrade(&e);
        }
    }

    fn degrade(&mut self, err: &StoreError) {
        if !self.persistence_degraded {
            warn!(error = %err, "timer persistence unavailable, continuing in memory only");
            self.persistence_degraded = true;
        }
    }
}

/// Milliseconds to whole seconds, rounding half away from zero.
fn round_secs(delta_ms: i64) -> i64 {
    (delta_ms as f64 / 1000.0).round() as i64
}
