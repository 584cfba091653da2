//! Shared harness for integration tests.
//!
//! Wires a [`FocusDriver`] to a `ManualClock`, a `MemoryStore` and real
//! channels whose outputs are counted.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use edusync_core::notify::{
    AudioChirpChannel, AudioSink, Chirp, FixedSelector, HistoryChannel, HistoryLog,
    NotificationDispatcher, OsNotificationChannel, OsNotifier, Permission,
};
use edusync_core::{
    ChannelError, FocusDriver, ManualClock, MemoryStore, Step, TimerConfig, TimerEngine,
};

/// 2024-05-01T00:00:00Z
pub const T0: i64 = 1_714_521_600_000;

#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct CountingSpeaker(pub Counter);

impl AudioSink for CountingSpeaker {
    fn play(&mut self, _chirp: &Chirp) -> Result<(), ChannelError> {
        self.0.bump();
        Ok(())
    }
}

/// Notifier whose permission was granted before the test started.
pub struct GrantedNotifier(pub Counter);

impl OsNotifier for GrantedNotifier {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn request_permission(&mut self) -> Permission {
        Permission::Granted
    }

    fn show(&mut self, _title: &str, _body: &str) -> Result<(), ChannelError> {
        self.0.bump();
        Ok(())
    }
}

pub struct Harness {
    pub driver: FocusDriver,
    pub clock: Arc<ManualClock>,
    pub store: MemoryStore,
    pub history: Arc<Mutex<HistoryLog>>,
    pub chirps: Counter,
    pub popups: Counter,
}

impl Harness {
    /// Fresh store, clock at [`T0`].
    pub fn new(config: TimerConfig) -> Self {
        Self::with(config, MemoryStore::new(), Arc::new(ManualClock::new(T0)))
    }

    /// A "reloaded" process on an existing store and clock.
    pub fn with(config: TimerConfig, store: MemoryStore, clock: Arc<ManualClock>) -> Self {
        let engine = TimerEngine::restore(config, store.clone(), clock.clone()).unwrap();
        let history = Arc::new(Mutex::new(HistoryLog::new(100)));
        let chirps = Counter::default();
        let popups = Counter::default();
        let dispatcher = NotificationDispatcher::new(clock.clone(), FixedSelector(0))
            .with_channel(OsNotificationChannel::new(GrantedNotifier(popups.clone())))
            .with_channel(AudioChirpChannel::new(CountingSpeaker(chirps.clone())))
            .with_channel(HistoryChannel::new(history.clone()));
        Self {
            driver: FocusDriver::new(engine, dispatcher, clock.clone()),
            clock,
            store,
            history,
            chirps,
            popups,
        }
    }

    /// Close this process and open a new one on the same store.
    pub fn reload(self, config: TimerConfig) -> Self {
        let Harness { driver, store, clock, .. } = self;
        driver.dispose();
        Self::with(config, store, clock)
    }

    /// Advance the clock one second at a time, ticking after each.
    pub fn advance(&mut self, secs: u64) -> Vec<Step> {
        let mut steps = Vec::new();
        for _ in 0..secs {
            self.clock.advance_secs(1);
            steps.extend(self.driver.poll());
        }
        steps
    }

    pub fn dispatches(&self) -> usize {
        self.history.lock().unwrap().len()
    }
}

pub fn minutes(focus: u32, short_break: u32, long_break: u32) -> TimerConfig {
    TimerConfig {
        focus_minutes: focus,
        short_break_minutes: short_break,
        long_break_minutes: long_break,
        ..TimerConfig::default()
    }
}
