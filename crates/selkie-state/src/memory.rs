//! In-memory state backend
//!
//! For testing and simulation. Implements the same contract as the
//! sidecar: monotonically versioned etags per key, first-write-wins
//! rejection on etag mismatch, last-write-wins override, and batched
//! writes that commit or reject as a unit.

use crate::backend::{BulkEntry, KeyResponse, Metadata, StateBackend, WriteEntry};
use crate::policy::ConsistencyPolicy;
use async_trait::async_trait;
use selkie_core::{Error, Result, STATE_BATCH_ENTRIES_COUNT_MAX};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A stored value with its write version
///
/// The version doubles as the etag: it starts at 1 on the first write and
/// increments on every subsequent write to the key.
#[derive(Debug, Clone)]
struct Record {
    value: Value,
    version: u64,
}

impl Record {
    fn etag(&self) -> String {
        self.version.to_string()
    }
}

/// Per-store data: key -> record
type StoreData = HashMap<String, Record>;

/// In-memory state backend
#[derive(Clone, Default)]
pub struct MemoryStateBackend {
    /// store name -> (key -> record)
    stores: Arc<RwLock<HashMap<String, StoreData>>>,
}

impl MemoryStateBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current etag of a key, if it exists (test hook)
    pub async fn current_etag(&self, store: &str, key: &str) -> Option<String> {
        let stores = self.stores.read().await;
        stores
            .get(store)
            .and_then(|data| data.get(key))
            .map(Record::etag)
    }
}

#[async_trait]
impl StateBackend for MemoryStateBackend {
    async fn get_key(&self, store: &str, key: &str, _metadata: &Metadata) -> Result<KeyResponse> {
        let stores = self.stores.read().await;
        match stores.get(store).and_then(|data| data.get(key)) {
            Some(record) => Ok(KeyResponse::Found {
                value: record.value.clone(),
                etag: Some(record.etag()),
            }),
            None => Ok(KeyResponse::NotFound),
        }
    }

    async fn save_bulk(&self, store: &str, entries: Vec<WriteEntry>) -> Result<()> {
        assert!(!entries.is_empty(), "batch must not be empty");
        assert!(
            entries.len() <= STATE_BATCH_ENTRIES_COUNT_MAX,
            "batch exceeds entry limit"
        );

        let mut stores = self.stores.write().await;
        let data = stores.entry(store.to_string()).or_default();

        // Validate every precondition before applying any write, so the
        // batch commits or rejects as a unit.
        for entry in &entries {
            let Some(etag) = &entry.etag else { continue };
            let rejecting = entry
                .options
                .map(|o| ConsistencyPolicy::new(o.consistency, o.concurrency).rejects_on_conflict())
                .unwrap_or(false);
            if !rejecting {
                continue;
            }
            let current = data.get(&entry.key).map(Record::etag);
            if current.as_deref() != Some(etag.as_str()) {
                return Err(Error::commit_failed(
                    store,
                    format!(
                        "etag mismatch for key {}: expected {}, found {}",
                        entry.key,
                        etag,
                        current.as_deref().unwrap_or("none"),
                    ),
                ));
            }
        }

        for entry in entries {
            let record = data.entry(entry.key).or_insert(Record {
                value: Value::Null,
                version: 0,
            });
            record.value = entry.value;
            record.version += 1;
        }

        Ok(())
    }

    async fn get_bulk(
        &self,
        store: &str,
        keys: &[String],
        _parallelism: u32,
        _metadata: &Metadata,
    ) -> Result<Vec<BulkEntry>> {
        let stores = self.stores.read().await;
        let data = stores.get(store);

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(record) = data.and_then(|d| d.get(key)) else {
                continue;
            };
            // A stored null is a key that exists but is empty: etag only.
            let value = match &record.value {
                Value::Null => None,
                other => Some(other.clone()),
            };
            entries.push(BulkEntry {
                key: key.clone(),
                data: value,
                etag: Some(record.etag()),
            });
        }

        Ok(entries)
    }

    async fn delete_key(&self, store: &str, key: &str, _metadata: &Metadata) -> Result<()> {
        let mut stores = self.stores.write().await;
        if let Some(data) = stores.get_mut(store) {
            data.remove(key);
        }
        Ok(())
    }
}
