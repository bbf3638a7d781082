use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::domain::errors::StorageResult;
use crate::domain::panel::{DurableBackend, StorageKey};

/// Backend living in process memory. Clones share the same records, which
/// lets a caller keep a handle after giving one to the store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    records: Rc<RefCell<HashMap<StorageKey, Value>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, key: StorageKey) -> Option<Value> {
        self.records.borrow().get(&key).cloned()
    }

    pub fn insert(&self, key: StorageKey, value: Value) {
        self.records.borrow_mut().insert(key, value);
    }
}

impl DurableBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, key: StorageKey) -> StorageResult<Option<Value>> {
        Ok(self.record(key))
    }

    async fn save(&self, key: StorageKey, value: &Value) -> StorageResult<()> {
        self.insert(key, value.clone());
        Ok(())
    }
}
