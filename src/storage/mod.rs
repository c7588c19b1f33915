pub mod json_store;
pub mod memory;

use crate::error::Result;
use async_trait::async_trait;

/// Uniform record storage: `load`/`save` with last-write-wins semantics and
/// no transactions. The engine never talks to a backend directly.
#[async_trait]
pub trait RecordStore<T>: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<T>>;
    async fn save(&self, key: &str, record: &T) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<bool>;
    async fn list(&self) -> Result<Vec<T>>;
}
