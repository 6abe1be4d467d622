//! Single-key state items

use crate::policy::ConsistencyPolicy;
use selkie_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// One logical key's last-known value and concurrency token
///
/// Created by a load, mutated by application code, consumed by a save. A
/// non-null etag means the item was read from the backend; saving it under
/// a first-write-wins policy makes the write conditional on that etag.
#[derive(Debug, Clone, PartialEq)]
pub struct StateItem {
    /// The store key
    pub key: String,
    /// The value as last loaded or as mutated by the caller
    pub value: Value,
    /// Policy applied when this item is saved
    pub policy: ConsistencyPolicy,
    /// Concurrency token from the last read, if the key existed
    pub etag: Option<String>,
}

impl StateItem {
    pub fn new(
        key: impl Into<String>,
        value: Value,
        policy: ConsistencyPolicy,
        etag: Option<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value,
            policy,
            etag,
        }
    }

    /// Decode the value into a concrete type
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.value.clone()).map_err(|e| Error::DeserializationFailed {
            reason: format!("key {}: {}", self.key, e),
        })
    }
}
