//! Composition of one timer engine and one notification dispatcher.
//!
//! The driver is the only place that connects the two: it forwards user
//! commands to the engine, turns `SessionCompleted` into a dispatch, and
//! runs the 1 Hz tick loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::ConfigError;
use crate::events::Event;
use crate::notify::{DeliveryContext, DispatchReport, NotificationDispatcher};
use crate::storage::TimerConfig;
use crate::timer::TimerEngine;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Gap between two loop ticks (wall clock) above which the host is assumed
/// to have been suspended.
pub const CLOCK_JUMP_THRESHOLD_MS: i64 = 3_000;

/// What one driver step produced.
#[derive(Debug, Clone)]
pub struct Step {
    pub event: Event,
    /// Present for `SessionCompleted` only.
    pub report: Option<DispatchReport>,
}

pub struct FocusDriver {
    engine: TimerEngine,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    last_tick_ms: Option<i64>,
}

impl FocusDriver {
    pub fn new(
        engine: TimerEngine,
        mut dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        dispatcher.set_context(context_for(engine.config()));
        Self {
            engine,
            dispatcher,
            clock,
            last_tick_ms: None,
        }
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    /// User-initiated start. Channels get their one chance to ask for
    /// permission before the engine starts.
    pub fn start(&mut self) -> Option<Event> {
        self.dispatcher.prime_permissions();
        self.engine.start()
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.engine.pause()
    }

    pub fn reset(&mut self) -> Event {
        self.engine.reset()
    }

    pub fn reset_progress(&mut self) -> Event {
        self.engine.reset_progress()
    }

    pub fn update_config(&mut self, config: TimerConfig) -> Result<(), ConfigError> {
        self.engine.update_config(config)?;
        self.dispatcher.set_context(context_for(self.engine.config()));
        Ok(())
    }

    /// One engine tick; dispatches when a session completes.
    pub fn on_tick(&mut self) -> Option<Step> {
        let event = self.engine.tick()?;
        let report = event
            .completed_mode()
            .map(|completed| self.dispatcher.dispatch(completed));
        Some(Step { event, report })
    }

    /// Rebuild from persisted state. Never dispatches.
    pub fn on_visibility_regained(&mut self) -> Event {
        self.last_tick_ms = Some(self.clock.now_ms());
        self.engine.recover()
    }

    /// Work for one loop iteration: recover after a wall-clock jump,
    /// otherwise tick.
    pub fn poll(&mut self) -> Option<Step> {
        let now = self.clock.now_ms();
        let jumped = self
            .last_tick_ms
            .is_some_and(|last| (now - last).abs() > CLOCK_JUMP_THRESHOLD_MS);
        self.last_tick_ms = Some(now);

        if jumped {
            info!("wall clock jumped, recovering timer");
            return Some(Step {
                event: self.on_visibility_regained(),
                report: None,
            });
        }
        self.on_tick()
    }

    /// Drive the engine at 1 Hz until `shutdown` resolves. Every step is
    /// handed to `observer`.
    pub async fn run_until<S, F>(&mut self, shutdown: S, mut observer: F)
    where
        S: Future<Output = ()>,
        F: FnMut(&Step),
    {
        let mut tick = tokio::time::interval(TICK_INTERVAL);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately; consume it so the first
        // decrement happens one second after start.
        tick.tick().await;
        self.last_tick_ms = Some(self.clock.now_ms());

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tick.tick() => {
                    if let Some(step) = self.poll() {
                        observer(&step);
                    }
                }
            }
        }
        debug!("tick loop stopped");
    }

    /// Stop the engine, leaving persisted state for the next load.
    pub fn dispose(self) {
        self.engine.dispose();
    }
}

fn context_for(config: &TimerConfig) -> DeliveryContext {
    DeliveryContext {
        sound_enabled: config.sound_enabled,
        notifications_enabled: config.notifications_enabled,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::clock::ManualClock;
    use crate::notify::{FixedSelector, HistoryChannel, HistoryLog};
    use crate::storage::MemoryStore;
    use crate::timer::{Mode, TimerState};

    const T0: i64 = 1_714_521_600_000;

    fn driver() -> (FocusDriver, Arc<ManualClock>, Arc<Mutex<HistoryLog>>) {
        let clock = Arc::new(ManualClock::new(T0));
        let config = TimerConfig {
            focus_minutes: 1,
            ..TimerConfig::default()
        };
        let engine = TimerEngine::new(config, MemoryStore::new(), clock.clone()).unwrap();
        let history = Arc::new(Mutex::new(HistoryLog::new(10)));
        let dispatcher = NotificationDispatcher::new(clock.clone(), FixedSelector(0))
            .with_channel(HistoryChannel::new(history.clone()));
        (FocusDriver::new(engine, dispatcher, clock.clone()), clock, history)
    }

    #[test]
    fn completion_is_dispatched_once() {
        let (mut driver, clock, history) = driver();
        driver.start();
        let mut reports = 0;
        for _ in 0..60 {
            clock.advance_secs(1);
            if let Some(step) = driver.poll() {
                assert!(step.report.is_some());
                reports += 1;
            }
        }
        assert_eq!(reports, 1);
        assert_eq!(history.lock().unwrap().len(), 1);
        assert_eq!(driver.engine().mode(), Mode::ShortBreak);
    }

    #[test]
    fn clock_jump_recovers_instead_of_ticking() {
        let (mut driver, clock, history) = driver();
        driver.start();
        clock.advance_secs(1);
        assert!(driver.poll().is_none());
        assert_eq!(driver.engine().remaining_secs(), 59);

        clock.advance_secs(30);
        let step = driver.poll().expect("jump produces a recovery step");
        assert!(matches!(step.event, Event::Recovered { .. }));
        assert!(step.report.is_none());
        assert_eq!(driver.engine().remaining_secs(), 29);

        clock.advance_secs(120);
        driver.poll();
        assert_eq!(driver.engine().mode(), Mode::ShortBreak);
        assert_eq!(driver.engine().counters().sessions_completed_today, 0);
        assert!(history.lock().unwrap().is_empty(), "expiry during a jump is silent");
    }

    #[test]
    fn sound_preference_reaches_dispatcher() {
        let (mut driver, _, _) = driver();
        assert!(driver.dispatcher().context().sound_enabled);
        let config = TimerConfig {
            sound_enabled: false,
            ..driver.engine().config().clone()
        };
        driver.update_config(config).unwrap();
        assert!(!driver.dispatcher().context().sound_enabled);
    }

    #[tokio::test]
    async fn run_until_stops_on_shutdown() {
        let (mut driver, _, _) = driver();
        driver.start();
        driver
            .run_until(tokio::time::sleep(Duration::from_millis(10)), |_| {})
            .await;
        assert_eq!(driver.engine().state(), TimerState::Running);
    }
}
