mod config;
pub mod database;
mod store;

pub use config::{Config, NotificationsConfig, RemoteConfig, TimerConfig};
pub use database::SqliteStore;
pub use store::{ClockStore, MemoryStore};

use std::path::PathBuf;

/// Returns `~/.config/edusync[-dev]/` based on EDUSYNC_ENV.
///
/// Set EDUSYNC_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("EDUSYNC_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("edusync-dev")
    } else {
        base_dir.join("edusync")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
