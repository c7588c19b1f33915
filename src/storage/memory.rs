use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::RecordStore;
use crate::error::Result;

/// In-memory backend, used by tests.
pub struct MemoryStore<T> {
    records: Mutex<HashMap<String, T>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> RecordStore<T> for MemoryStore<T>
where
    T: Clone + Send + Sync,
{
    async fn load(&self, key: &str) -> Result<Option<T>> {
        Ok(self.records.lock().expect("store mutex poisoned").get(key).cloned())
    }

    async fn save(&self, key: &str, record: &T) -> Result<()> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self
            .records
            .lock()
            .expect("store mutex poisoned")
            .remove(key)
            .is_some())
    }

    async fn list(&self) -> Result<Vec<T>> {
        Ok(self
            .records
            .lock()
            .expect("store mutex poisoned")
            .values()
            .cloned()
            .collect())
    }
}
