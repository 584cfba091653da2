//! Bounded notification history.
//!
//! Most-recent-first, capped at `capacity`; appending to a full log evicts
//! the single oldest record. Optionally persisted as a JSON array under
//! [`HISTORY_KEY`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::warn;

use super::channel::{ChannelKind, DeliveryContext, NotificationChannel};
use super::record::NotificationRecord;
use crate::error::{ChannelError, StoreError};
use crate::storage::ClockStore;

pub const HISTORY_KEY: &str = "notifications.history";

#[derive(Debug, Clone)]
pub struct HistoryLog {
    capacity: usize,
    records: VecDeque<NotificationRecord>,
}

impl HistoryLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
        }
    }

    /// Load from `store`. A missing or unreadable entry yields an empty log.
    pub fn load(store: &dyn ClockStore, capacity: usize) -> Result<Self, StoreError> {
        let mut log = Self::new(capacity);
        let Some(raw) = store.get(HISTORY_KEY)? else {
            return Ok(log);
        };
        match serde_json::from_str::<Vec<NotificationRecord>>(&raw) {
            Ok(records) => {
                log.records = records.into_iter().take(log.capacity).collect();
            }
            Err(e) => warn!(error = %e, "discarding unreadable notification history"),
        }
        Ok(log)
    }

    pub fn save(&self, store: &dyn ClockStore) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.records)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        store.set(HISTORY_KEY, &json)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert at the front, evicting the oldest record when full.
    pub fn append(&mut self, record: NotificationRecord) -> Option<NotificationRecord> {
        let evicted = if self.records.len() >= self.capacity {
            self.records.pop_back()
        } else {
            None
        };
        self.records.push_front(record);
        evicted
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> Vec<NotificationRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<&NotificationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn unread_count(&self) -> usize {
        self.records.iter().filter(|r| !r.read).count()
    }

    /// Returns false if no record has this id.
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.read = true;
                true
            }
            None => false,
        }
    }

    /// Returns how many records changed.
    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for record in self.records.iter_mut().filter(|r| !r.read) {
            record.read = true;
            changed += 1;
        }
        changed
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// Appends every notification to a shared [`HistoryLog`], saving it to the
/// store when one is attached.
pub struct HistoryChannel {
    log: Arc<Mutex<HistoryLog>>,
    store: Option<Box<dyn ClockStore>>,
}

impl HistoryChannel {
    pub fn new(log: Arc<Mutex<HistoryLog>>) -> Self {
        Self { log, store: None }
    }

    pub fn persisted(log: Arc<Mutex<HistoryLog>>, store: impl ClockStore + 'static) -> Self {
        Self {
            log,
            store: Some(Box::new(store)),
        }
    }
}

impl NotificationChannel for HistoryChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::History
    }

    fn deliver(
        &mut self,
        record: &NotificationRecord,
        _ctx: &DeliveryContext,
    ) -> Result<(), ChannelError> {
        let mut log = self.log.lock().unwrap_or_else(|e| e.into_inner());
        log.append(record.clone());
        if let Some(store) = self.store.as_deref() {
            log.save(store)
                .map_err(|e| ChannelError::Delivery(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::record::{Category, Message};
    use crate::storage::MemoryStore;

    fn record(n: usize) -> NotificationRecord {
        NotificationRecord::new(
            Category::Focus,
            Message {
                primary: format!("message {n}"),
                secondary: format!("رسالة {n}"),
            },
            chrono::Utc::now(),
        )
    }

    #[test]
    fn evicts_single_oldest_when_full() {
        let mut log = HistoryLog::new(3);
        let first = record(0);
        let first_id = first.id.clone();
        log.append(first);
        log.append(record(1));
        log.append(record(2));
        let evicted = log.append(record(3)).expect("full log evicts");
        assert_eq!(evicted.id, first_id);
        assert_eq!(log.len(), 3);
        assert_eq!(log.iter().next().unwrap().message.primary, "message 3");
        assert!(log.get(&first_id).is_none());
    }

    #[test]
    fn mark_read_and_unread_count() {
        let mut log = HistoryLog::new(10);
        let a = record(0);
        let a_id = a.id.clone();
        log.append(a);
        log.append(record(1));
        assert_eq!(log.unread_count(), 2);
        assert!(log.mark_read(&a_id));
        assert!(!log.mark_read("missing"));
        assert_eq!(log.unread_count(), 1);
        assert_eq!(log.mark_all_read(), 1);
        assert_eq!(log.unread_count(), 0);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn persists_through_store() {
        let store = MemoryStore::new();
        let log = Arc::new(Mutex::new(HistoryLog::new(5)));
        let mut channel = HistoryChannel::persisted(log.clone(), store.clone());
        channel
            .deliver(&record(1), &DeliveryContext::default())
            .unwrap();

        let reloaded = HistoryLog::load(&store, 5).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.records(), log.lock().unwrap().records());
    }

    #[test]
    fn load_truncates_to_capacity_and_tolerates_garbage() {
        let store = MemoryStore::new();
        let mut log = HistoryLog::new(10);
        for n in 0..6 {
            log.append(record(n));
        }
        log.save(&store).unwrap();
        let small = HistoryLog::load(&store, 2).unwrap();
        assert_eq!(small.len(), 2);
        assert_eq!(small.iter().next().unwrap().message.primary, "message 5");

        store.set(HISTORY_KEY, "not json").unwrap();
        assert!(HistoryLog::load(&store, 2).unwrap().is_empty());
    }

    #[test]
    fn read_only_store_fails_the_channel() {
        let log = Arc::new(Mutex::new(HistoryLog::new(5)));
        let mut channel = HistoryChannel::persisted(log.clone(), MemoryStore::read_only());
        let err = channel
            .deliver(&record(1), &DeliveryContext::default())
            .unwrap_err();
        assert!(!err.is_skip());
        assert_eq!(log.lock().unwrap().len(), 1, "in-memory append survives");
    }
}
