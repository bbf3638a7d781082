//! Key/value persistence with an in-memory mirror.
//!
//! Every write lands in the mirror before the durable backend is tried. The
//! first backend failure switches the store to mirror-only mode for the rest
//! of the session, so a broken extension storage never blocks the panel.

pub mod browser;
pub mod memory;

pub use browser::*;
pub use memory::MemoryBackend;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::domain::{
    errors::StorageError,
    history::HistoryEntry,
    logging::LogComponent,
    panel::{DurableBackend, PanelPosition, PanelState, StorageKey},
};

/// Whole-record update for one or more keys.
#[derive(Debug, Clone, Default)]
pub struct StorePatch {
    position: Option<PanelPosition>,
    state: Option<PanelState>,
    history: Option<Vec<HistoryEntry>>,
}

impl StorePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, position: PanelPosition) -> Self {
        self.position = Some(position);
        self
    }

    pub fn state(mut self, state: PanelState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.history = Some(history);
        self
    }

    fn into_records(self) -> Vec<(StorageKey, Result<Value, StorageError>)> {
        fn encode<T: serde::Serialize>(value: &T) -> Result<Value, StorageError> {
            Ok(serde_json::to_value(value)?)
        }

        let mut records = Vec::new();
        if let Some(position) = &self.position {
            records.push((StorageKey::PanelPosition, encode(position)));
        }
        if let Some(state) = &self.state {
            records.push((StorageKey::PanelState, encode(state)));
        }
        if let Some(history) = &self.history {
            records.push((StorageKey::History, encode(history)));
        }
        records
    }
}

pub struct PersistentStore<B: DurableBackend> {
    backend: Option<B>,
    mirror: RefCell<HashMap<StorageKey, Value>>,
    degraded: Cell<bool>,
}

impl<B: DurableBackend> PersistentStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_backend(Some(backend))
    }

    /// Store that never leaves memory.
    pub fn in_memory() -> Self {
        Self::with_backend(None)
    }

    pub fn with_backend(backend: Option<B>) -> Self {
        let mut mirror = HashMap::new();
        mirror.insert(StorageKey::History, Value::Array(Vec::new()));

        if let Some(backend) = &backend {
            crate::log_debug!(
                LogComponent::Infrastructure("Store"),
                "using durable backend {}",
                backend.name()
            );
        }

        Self {
            backend,
            mirror: RefCell::new(mirror),
            degraded: Cell::new(false),
        }
    }

    /// True once a backend failure has switched the store to memory only.
    pub fn is_degraded(&self) -> bool {
        self.degraded.get()
    }

    fn active_backend(&self) -> Option<&B> {
        if self.degraded.get() { None } else { self.backend.as_ref() }
    }

    fn degrade(&self, key: StorageKey, error: &StorageError) {
        crate::log_warn!(
            LogComponent::Infrastructure("Store"),
            "{} on {}, falling back to memory",
            error,
            key
        );
        self.degraded.set(true);
    }

    fn mirrored(&self, key: StorageKey) -> Option<Value> {
        self.mirror.borrow().get(&key).cloned()
    }

    /// Current record under `key`. Falls back to the mirror when the backend
    /// holds nothing or fails.
    pub async fn get(&self, key: StorageKey) -> Option<Value> {
        if let Some(backend) = self.active_backend() {
            match backend.load(key).await {
                Ok(Some(value)) if !value.is_null() => {
                    crate::log_trace!(LogComponent::Infrastructure("Store"), "get {} (durable)", key);
                    self.mirror.borrow_mut().insert(key, value.clone());
                    return Some(value);
                }
                Ok(_) => {}
                Err(e) => self.degrade(key, &e),
            }
        }

        crate::log_trace!(LogComponent::Infrastructure("Store"), "get {} (memory)", key);
        self.mirrored(key)
    }

    /// Write every record in `patch`. Never fails; backend errors are logged
    /// and the mirror keeps the value.
    pub async fn set(&self, patch: StorePatch) {
        let mut encoded = Vec::new();
        for (key, record) in patch.into_records() {
            match record {
                Ok(value) => {
                    self.mirror.borrow_mut().insert(key, value.clone());
                    encoded.push((key, value));
                }
                Err(e) => {
                    crate::log_error!(LogComponent::Infrastructure("Store"), "cannot encode {}: {}", key, e);
                }
            }
        }

        for (key, value) in encoded {
            let Some(backend) = self.active_backend() else {
                break;
            };
            match backend.save(key, &value).await {
                Ok(()) => {
                    crate::log_trace!(LogComponent::Infrastructure("Store"), "set {} ok", key);
                }
                Err(e) => self.degrade(key, &e),
            }
        }
    }

    async fn get_typed<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let value = self.get(key).await?;
        match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                crate::log_warn!(
                    LogComponent::Infrastructure("Store"),
                    "{}",
                    StorageError::from(e)
                );
                None
            }
        }
    }

    pub async fn position(&self) -> Option<PanelPosition> {
        self.get_typed(StorageKey::PanelPosition).await
    }

    pub async fn state(&self) -> Option<PanelState> {
        self.get_typed(StorageKey::PanelState).await
    }

    /// Saved history, most recent first. Never absent. Entries that fail to
    /// decode are skipped one by one; the rest of the list survives.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        let records = match self.get(StorageKey::History).await {
            Some(Value::Array(records)) => records,
            Some(other) => {
                crate::log_warn!(
                    LogComponent::Infrastructure("Store"),
                    "history record is not a list: {}",
                    other
                );
                return Vec::new();
            }
            None => return Vec::new(),
        };

        records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    crate::log_warn!(
                        LogComponent::Infrastructure("Store"),
                        "skipping history entry {}: {}",
                        index,
                        StorageError::from(e)
                    );
                    None
                }
            })
            .collect()
    }
}
