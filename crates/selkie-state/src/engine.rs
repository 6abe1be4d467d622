//! State consistency engine
//!
//! TigerStyle: One load and one commit per dispatch, strictly sequential.
//!
//! The engine turns typed state operations into backend requests:
//! single-key loads with default fallbacks, whole-object bulk loads, and
//! batched conditional saves carrying the etags recorded at load time.

use crate::backend::{KeyResponse, Metadata, StateBackend, WriteEntry};
use crate::item::StateItem;
use crate::policy::ConsistencyPolicy;
use crate::schema::{StateHandle, StateSchema};
use selkie_core::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Load/save of individual keys and whole actor-state objects
pub struct StateEngine {
    backend: Arc<dyn StateBackend>,
}

impl StateEngine {
    pub fn new(backend: Arc<dyn StateBackend>) -> Self {
        Self { backend }
    }

    /// Load one key, falling back to a default when it does not exist
    ///
    /// A missing key yields a [`StateItem`] carrying `default` and no etag;
    /// a found key yields the stored value and the backend's etag.
    #[instrument(skip(self, default, metadata), level = "debug")]
    pub async fn load_key(
        &self,
        store: &str,
        key: &str,
        default: Value,
        metadata: &Metadata,
        policy: ConsistencyPolicy,
    ) -> Result<StateItem> {
        match self.backend.get_key(store, key, metadata).await? {
            KeyResponse::Found { value, etag } => {
                Ok(StateItem::new(key, value, policy, etag))
            }
            KeyResponse::NotFound => Ok(StateItem::new(key, default, policy, None)),
        }
    }

    /// Save one item
    ///
    /// An item carrying an etag becomes a conditional write under its
    /// policy; an item without one is written unconditionally.
    #[instrument(skip(self, item), fields(key = %item.key), level = "debug")]
    pub async fn save_state(&self, store: &str, item: &StateItem) -> Result<()> {
        let entry = match &item.etag {
            Some(etag) => {
                WriteEntry::conditional(item.key.clone(), item.value.clone(), etag, item.policy)
            }
            None => WriteEntry::unconditional(item.key.clone(), item.value.clone()),
        };
        self.backend.save_bulk(store, vec![entry]).await
    }

    /// Load a whole state object in one batched bulk read
    ///
    /// Every declared field of `S` is requested under `prefix`. A returned
    /// entry with data assigns the field and records its etag; an entry
    /// with an etag but no data leaves the field at its default but still
    /// records the etag (the key exists but is empty). Fields with no
    /// entry keep their defaults and carry no etag.
    #[instrument(skip(self, metadata), level = "debug")]
    pub async fn load_object<S: StateSchema>(
        &self,
        prefix: &str,
        parallelism: u32,
        metadata: &Metadata,
    ) -> Result<StateHandle<S>> {
        let keys: Vec<String> = S::fields()
            .iter()
            .map(|field| format!("{}{}", prefix, field))
            .collect();
        assert!(!keys.is_empty(), "state schema declares no fields");

        let entries = self
            .backend
            .get_bulk(S::STORE, &keys, parallelism, metadata)
            .await?;

        let mut fields = HashMap::new();
        let mut etags = HashMap::new();
        for entry in entries {
            let Some(field) = entry.key.strip_prefix(prefix) else {
                continue;
            };
            if let Some(etag) = entry.etag {
                etags.insert(field.to_string(), etag);
            }
            if let Some(data) = entry.data {
                fields.insert(field.to_string(), data);
            }
        }

        debug!(
            store = S::STORE,
            prefix,
            loaded = fields.len(),
            "state object hydrated"
        );
        StateHandle::from_fields(prefix, fields, etags)
    }

    /// Commit a whole state object in one batched conditional write
    ///
    /// Fields loaded with an etag are written conditionally on it; fields
    /// never seen by the backend are written unconditionally. All entries
    /// go to the backend as a single batch, so the commit succeeds or
    /// rejects as a unit.
    #[instrument(skip(self, handle, metadata), fields(prefix = %handle.prefix()), level = "debug")]
    pub async fn save_object<S: StateSchema>(
        &self,
        handle: &StateHandle<S>,
        metadata: Option<&Metadata>,
    ) -> Result<()> {
        let policy = S::policy();
        let mut entries = Vec::with_capacity(S::fields().len());
        for (field, value) in handle.field_values()? {
            let key = format!("{}{}", handle.prefix(), field);
            let mut entry = match handle.etag(field) {
                Some(etag) => WriteEntry::conditional(key, value, etag, policy),
                None => WriteEntry::unconditional(key, value),
            };
            if let Some(metadata) = metadata {
                entry = entry.with_metadata(metadata.clone());
            }
            entries.push(entry);
        }
        assert!(!entries.is_empty(), "state schema declares no fields");

        self.backend.save_bulk(S::STORE, entries).await
    }

    /// Remove keys from a store (hard delete, one call per key)
    #[instrument(skip(self, keys, metadata), fields(key_count = keys.len()), level = "debug")]
    pub async fn delete_keys(
        &self,
        store: &str,
        keys: &[String],
        metadata: &Metadata,
    ) -> Result<()> {
        for key in keys {
            self.backend.delete_key(store, key, metadata).await?;
        }
        Ok(())
    }
}
