use std::rc::Rc;

use crate::domain::{
    history::{AppendOutcome, HistoryEntry, HistoryLog},
    logging::{LogComponent, get_time_provider},
    panel::{DurableBackend, PanelConfig, PanelFields},
    pricing::Mode,
};
use crate::infrastructure::storage::{PersistentStore, StorePatch};

/// Sole writer of the saved history.
///
/// Every operation starts from the persisted list rather than a cached copy,
/// so a delete issued from a stale rendering cannot bring back a row removed
/// in the meantime.
pub struct HistoryLedger<B: DurableBackend> {
    store: Rc<PersistentStore<B>>,
    capacity: usize,
    epsilon: f64,
}

impl<B: DurableBackend> HistoryLedger<B> {
    pub fn new(store: Rc<PersistentStore<B>>, config: &PanelConfig) -> Self {
        Self {
            store,
            capacity: config.history_capacity,
            epsilon: config.money_epsilon,
        }
    }

    async fn load(&self) -> HistoryLog {
        HistoryLog::from_entries(self.store.history().await, self.capacity, self.epsilon)
    }

    async fn persist(&self, log: &HistoryLog) {
        self.store.set(StorePatch::new().history(log.to_vec())).await;
    }

    /// Record the panel's current cost and price, stamped now.
    pub async fn append(&self, mode: Mode, fields: &PanelFields) -> AppendOutcome {
        let timestamp = get_time_provider().current_timestamp();
        match HistoryEntry::capture(mode, fields, timestamp) {
            Some(entry) => self.append_entry(entry).await,
            None => {
                crate::log_debug!(
                    LogComponent::Application("History"),
                    "nothing to save: cost {:?}, price {:?}",
                    fields.cost,
                    fields.price
                );
                AppendOutcome::Rejected
            }
        }
    }

    pub async fn append_entry(&self, entry: HistoryEntry) -> AppendOutcome {
        let mut log = self.load().await;
        let outcome = log.push(entry);
        if outcome == AppendOutcome::Inserted {
            self.persist(&log).await;
        }
        crate::log_debug!(
            LogComponent::Application("History"),
            "append {:?}, {} entries",
            outcome,
            log.len()
        );
        outcome
    }

    /// Saved entries, most recent first.
    pub async fn list(&self) -> Vec<HistoryEntry> {
        self.load().await.to_vec()
    }

    pub async fn get(&self, index: usize) -> Option<HistoryEntry> {
        self.load().await.get(index).cloned()
    }

    /// Delete the entry at `index`. Out-of-range indices change nothing.
    pub async fn remove(&self, index: usize) -> Option<HistoryEntry> {
        let mut log = self.load().await;
        let removed = log.remove(index)?;
        self.persist(&log).await;
        Some(removed)
    }

    pub async fn clear(&self) {
        let mut log = self.load().await;
        log.clear();
        self.persist(&log).await;
        crate::log_info!(LogComponent::Application("History"), "history cleared");
    }
}
