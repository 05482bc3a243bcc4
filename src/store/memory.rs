//! Process-local text store

use super::{DocumentTextRecord, TextStore};
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

struct StoreInner {
    records: HashMap<String, String>,
    writes: usize,
}

/// In-memory store with the same overwrite semantics as the durable one.
/// Contents are lost when the process exits.
pub struct InMemoryTextStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryTextStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                records: HashMap::new(),
                writes: 0,
            }),
        }
    }

    /// Get the text stored under `id`
    pub fn get(&self, id: &str) -> Option<String> {
        self.inner.lock().records.get(id).cloned()
    }

    /// Number of distinct ids stored
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    /// Total number of writes, including overwrites
    pub fn write_count(&self) -> usize {
        self.inner.lock().writes
    }
}

impl Default for InMemoryTextStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextStore for InMemoryTextStore {
    async fn put_text(&self, record: &DocumentTextRecord) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.records.insert(record.id.clone(), record.text.clone());
        inner.writes += 1;
        Ok(())
    }
}
