use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::{fs, sync::Mutex};
use tracing::debug;

use crate::dao::storage::{StorageError, StorageResult};

/// Key under which the star counter is persisted.
pub const STARS_KEY: &str = "palabraVivaStars";

/// Minimal persistence contract: integer values addressed by string keys.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<i64>>>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: i64) -> BoxFuture<'static, StorageResult<()>>;
}

/// Volatile store, used in tests and when no file store is wanted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<DashMap<String, i64>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one value.
    pub fn with_value(key: &str, value: i64) -> Self {
        let store = Self::new();
        store.values.insert(key.to_string(), value);
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<i64>>> {
        let value = self.values.get(key).map(|entry| *entry.value());
        Box::pin(async move { Ok(value) })
    }

    fn set(&self, key: &str, value: i64) -> BoxFuture<'static, StorageResult<()>> {
        self.values.insert(key.to_string(), value);
        Box::pin(async { Ok(()) })
    }
}

/// On-disk layout of [`JsonFileStore`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    values: BTreeMap<String, i64>,
    #[serde(default)]
    updated_at: Option<String>,
}

/// Store persisting all values into a single JSON document.
///
/// Writes go to a sibling temporary file which then replaces the document, so a
/// crash mid-write never leaves a truncated file behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: Arc<PathBuf>,
    write_gate: Arc<Mutex<()>>,
}

impl JsonFileStore {
    /// Create a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            write_gate: Arc::new(Mutex::new(())),
        }
    }
}

async fn read_document(path: &Path) -> StorageResult<StoreDocument> {
    match fs::read_to_string(path).await {
        Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
            StorageError::corrupt(format!("failed to decode {}", path.display()), err)
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "store document missing; starting empty");
            Ok(StoreDocument::default())
        }
        Err(err) => Err(StorageError::unavailable(
            format!("failed to read {}", path.display()),
            err,
        )),
    }
}

async fn write_document(path: &Path, document: &StoreDocument) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(|err| {
            StorageError::unavailable(format!("failed to create {}", parent.display()), err)
        })?;
    }

    let payload = serde_json::to_vec_pretty(document).map_err(|err| {
        StorageError::unavailable("failed to encode store document".into(), err)
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload).await.map_err(|err| {
        StorageError::unavailable(format!("failed to write {}", tmp.display()), err)
    })?;
    fs::rename(&tmp, path).await.map_err(|err| {
        StorageError::unavailable(format!("failed to replace {}", path.display()), err)
    })?;

    Ok(())
}

fn now_rfc3339() -> Option<String> {
    OffsetDateTime::now_utc().format(&Rfc3339).ok()
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<i64>>> {
        let path = self.path.clone();
        let key = key.to_string();
        Box::pin(async move {
            let document = read_document(&path).await?;
            Ok(document.values.get(&key).copied())
        })
    }

    fn set(&self, key: &str, value: i64) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.path.clone();
        let gate = self.write_gate.clone();
        let key = key.to_string();
        Box::pin(async move {
            let _guard = gate.lock().await;
            // A corrupt document is replaced rather than blocking every later write.
            let mut document = match read_document(&path).await {
                Ok(document) => document,
                Err(StorageError::Corrupt { .. }) => StoreDocument::default(),
                Err(err) => return Err(err),
            };
            document.values.insert(key, value);
            document.updated_at = now_rfc3339();
            write_document(&path, &document).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("palabra-viva-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[tokio::test]
    async fn memory_store_round_trips_values() {
        let store = MemoryStore::new();
        assert_eq!(store.get(STARS_KEY).await.unwrap(), None);
        store.set(STARS_KEY, 7).await.unwrap();
        assert_eq!(store.get(STARS_KEY).await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn file_store_missing_document_reads_as_empty() {
        let store = JsonFileStore::new(temp_path("stars.json"));
        assert_eq!(store.get(STARS_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_persists_across_instances() {
        let path = temp_path("stars.json");
        JsonFileStore::new(&path).set(STARS_KEY, 12).await.unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get(STARS_KEY).await.unwrap(), Some(12));

        let raw = std::fs::read_to_string(&path).unwrap();
        let document: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(document["values"][STARS_KEY], 12);
        assert!(document["updated_at"].is_string());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn file_store_reports_corrupt_document_and_recovers_on_write() {
        let path = temp_path("stars.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.get(STARS_KEY).await,
            Err(StorageError::Corrupt { .. })
        ));

        store.set(STARS_KEY, 3).await.unwrap();
        assert_eq!(store.get(STARS_KEY).await.unwrap(), Some(3));
    }
}
