use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::RecordStore;
use crate::error::Result;
use crate::utils::files::safe_component;

/// One JSON file per record under a collection directory.
pub struct JsonDirStore<T> {
    dir: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDirStore<T> {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            _marker: PhantomData,
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", safe_component(key)))
    }
}

#[async_trait]
impl<T> RecordStore<T> for JsonDirStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn load(&self, key: &str) -> Result<Option<T>> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, key: &str, record: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn list(&self) -> Result<Vec<T>> {
        let mut records = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(records),
            Err(err) => return Err(err.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice(&bytes) {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Skipping unreadable record");
                }
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        count: i32,
    }

    #[tokio::test]
    async fn round_trips_records_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonDirStore<Doc> = JsonDirStore::new(dir.path().join("docs"));

        assert!(store.load("alice@example.com").await.unwrap().is_none());

        let doc = Doc {
            name: "alice".to_string(),
            count: 2,
        };
        store.save("alice@example.com", &doc).await.unwrap();
        assert_eq!(store.load("alice@example.com").await.unwrap(), Some(doc.clone()));

        // Last write wins.
        let doc2 = Doc {
            name: "alice".to_string(),
            count: 3,
        };
        store.save("alice@example.com", &doc2).await.unwrap();
        assert_eq!(store.load("alice@example.com").await.unwrap(), Some(doc2));

        assert_eq!(store.list().await.unwrap().len(), 1);
        assert!(store.remove("alice@example.com").await.unwrap());
        assert!(!store.remove("alice@example.com").await.unwrap());
        assert!(store.load("alice@example.com").await.unwrap().is_none());
    }
}
