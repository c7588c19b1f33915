use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Per-key mutual exclusion. The engine assumes at most one concurrent
/// mutation per applicant email; services serialize through this.
#[derive(Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().expect("keyed lock mutex poisoned");
        map.entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
