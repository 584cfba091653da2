use std::sync::{Arc, Mutex};

use clap::Subcommand;
use edusync_core::notify::{
    AudioChirpChannel, HistoryChannel, HistoryLog, NotificationDispatcher, OsNotificationChannel,
    RandomSelector, RemoteChannel, RemoteSink, ToastBoard, ToastChannel,
};
use edusync_core::{
    Clock, ClockStore, Config, FocusDriver, MemoryStore, SqliteStore, SystemClock, TimerEngine,
};
use tracing::warn;

use crate::sinks::{DesktopNotifier, Speaker, TerminalToast};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the current session
    Start,
    /// Pause the running session
    Pause,
    /// Stop and return to a full focus session
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Tick in the foreground until Ctrl-C
    Run,
    /// Zero today's session count and cycle position
    ResetProgress,
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One database handle for the engine and one for the history log. When the
/// database can't be opened both share an in-memory store for this process.
fn open_stores() -> (Box<dyn ClockStore>, Box<dyn ClockStore>) {
    match SqliteStore::open().and_then(|engine| Ok((engine, SqliteStore::open()?))) {
        Ok((engine, history)) => (Box::new(engine), Box::new(history)),
        Err(e) => {
            warn!(error = %e, "database unavailable, state will not outlive this process");
            let memory = MemoryStore::new();
            (Box::new(memory.clone()), Box::new(memory))
        }
    }
}

/// Recover the engine from disk and wire up every notification channel.
fn build_driver(config: &Config) -> Result<FocusDriver, Box<dyn std::error::Error>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (engine_store, history_store) = open_stores();
    let engine = TimerEngine::restore(config.timer.clone(), engine_store, clock.clone())?;

    let capacity = config.notifications.history_capacity;
    let history = match HistoryLog::load(history_store.as_ref(), capacity) {
        Ok(log) => log,
        Err(e) => {
            warn!(error = %e, "starting with empty notification history");
            HistoryLog::new(capacity)
        }
    };

    let toast = ToastChannel::new(
        ToastBoard::new(),
        clock.clone(),
        config.notifications.toast_duration_secs,
    )
    .with_sink(TerminalToast);

    let mut dispatcher = NotificationDispatcher::new(clock.clone(), RandomSelector::new())
        .with_channel(toast)
        .with_channel(OsNotificationChannel::new(DesktopNotifier))
        .with_channel(AudioChirpChannel::new(Speaker::for_terminal()))
        .with_channel(HistoryChannel::persisted(
            Arc::new(Mutex::new(history)),
            history_store,
        ));

    match RemoteSink::from_config(&config.notifications.remote) {
        Ok(Some(sink)) => dispatcher.add_channel(Box::new(RemoteChannel::new(sink))),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "remote notifications unavailable"),
    }

    Ok(FocusDriver::new(engine, dispatcher, clock))
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut driver = build_driver(&config)?;

    match action {
        TimerAction::Start => match driver.start() {
            Some(event) => print_json(&event)?,
            None => print_json(&driver.engine().snapshot())?,
        },
        TimerAction::Pause => match driver.pause() {
            Some(event) => print_json(&event)?,
            None => print_json(&driver.engine().snapshot())?,
        },
        TimerAction::Reset => print_json(&driver.reset())?,
        TimerAction::Status => print_json(&driver.engine().snapshot())?,
        TimerAction::ResetProgress => print_json(&driver.reset_progress())?,
        TimerAction::Run => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(async {
                if let Some(event) = driver.start() {
                    if let Ok(json) = serde_json::to_string(&event) {
                        println!("{json}");
                    }
                }
                let shutdown = async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!(error = %e, "cannot listen for Ctrl-C");
                        std::future::pending::<()>().await;
                    }
                };
                driver
                    .run_until(shutdown, |step| {
                        if let Ok(json) = serde_json::to_string(&step.event) {
                            println!("{json}");
                        }
                        if let Some(report) = &step.report {
                            if let Ok(json) = serde_json::to_string(report) {
                                println!("{json}");
                            }
                        }
                    })
                    .await;
            });
            print_json(&driver.engine().snapshot())?;
        }
    }

    driver.dispose();
    Ok(())
}
