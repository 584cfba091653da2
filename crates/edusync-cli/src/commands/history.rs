use clap::Subcommand;
use edusync_core::notify::HistoryLog;
use edusync_core::{Config, SqliteStore};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List notifications, newest first
    List {
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
    },
    /// Mark one notification as read
    Read {
        /// Notification ID
        id: String,
    },
    /// Mark every notification as read
    ReadAll,
    /// Delete all notifications
    Clear,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = SqliteStore::open()?;
    let mut log = HistoryLog::load(&store, config.notifications.history_capacity)?;

    match action {
        HistoryAction::List { unread } => {
            let records: Vec<_> = log.iter().filter(|r| !unread || !r.read).collect();
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        HistoryAction::Read { id } => {
            if !log.mark_read(&id) {
                return Err(format!("notification not found: {id}").into());
            }
            log.save(&store)?;
            println!("ok");
        }
        HistoryAction::ReadAll => {
            let changed = log.mark_all_read();
            log.save(&store)?;
            println!("{}", serde_json::json!({ "marked_read": changed }));
        }
        HistoryAction::Clear => {
            log.clear();
            log.save(&store)?;
            println!("{}", serde_json::json!({ "cleared": true }));
        }
    }
    Ok(())
}
