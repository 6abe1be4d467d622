//! State backend trait and wire types
//!
//! TigerStyle: Explicit operations, all state I/O goes through this trait.
//!
//! The backend is the sidecar's state API. Production talks to it over
//! loopback HTTP ([`crate::HttpStateBackend`]); tests run against
//! [`crate::MemoryStateBackend`], which implements the same contract.

use crate::policy::ConsistencyPolicy;
use async_trait::async_trait;
use selkie_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Request metadata forwarded to the backend as query parameters
pub type Metadata = HashMap<String, String>;

/// Outcome of a single-key read
///
/// The backend distinguishes "key found" from "key not found"; any other
/// outcome is a retrieval failure and never reaches this type.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyResponse {
    /// The key exists; `etag` is its current concurrency token
    Found {
        value: Value,
        etag: Option<String>,
    },
    /// The key has never been written (or was deleted)
    NotFound,
}

/// Concurrency options attached to a conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    pub consistency: crate::policy::Consistency,
    pub concurrency: crate::policy::Concurrency,
}

impl From<ConsistencyPolicy> for WriteOptions {
    fn from(policy: ConsistencyPolicy) -> Self {
        Self {
            consistency: policy.consistency,
            concurrency: policy.concurrency,
        }
    }
}

/// One entry of a batched state write
///
/// An entry with an etag is conditional: under a first-write-wins policy
/// the backend rejects it when the stored etag no longer matches. An entry
/// without an etag is written unconditionally.
#[derive(Debug, Clone, Serialize)]
pub struct WriteEntry {
    pub key: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<WriteOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl WriteEntry {
    /// Unconditional write (first write for this key)
    pub fn unconditional(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
            etag: None,
            options: None,
            metadata: None,
        }
    }

    /// Conditional write carrying the etag from the last read
    pub fn conditional(
        key: impl Into<String>,
        value: Value,
        etag: impl Into<String>,
        policy: ConsistencyPolicy,
    ) -> Self {
        Self {
            key: key.into(),
            value,
            etag: Some(etag.into()),
            options: Some(policy.into()),
            metadata: None,
        }
    }

    /// Attach request metadata to this entry
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// One entry of a bulk-read response
///
/// `data` and `etag` are independent: an entry with an etag but no data
/// means the key exists but is empty, distinct from a key that never
/// existed, which produces no entry at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkEntry {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// The sidecar state API contract
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Read one key
    async fn get_key(&self, store: &str, key: &str, metadata: &Metadata) -> Result<KeyResponse>;

    /// Submit a batch of writes as one request
    ///
    /// The batch commits or rejects as a unit: a failed etag precondition
    /// under a rejecting policy fails the whole batch with `CommitFailed`.
    async fn save_bulk(&self, store: &str, entries: Vec<WriteEntry>) -> Result<()>;

    /// Read many keys in one request, with a backend-side fan-out hint
    async fn get_bulk(
        &self,
        store: &str,
        keys: &[String],
        parallelism: u32,
        metadata: &Metadata,
    ) -> Result<Vec<BulkEntry>>;

    /// Remove one key (hard delete)
    async fn delete_key(&self, store: &str, key: &str, metadata: &Metadata) -> Result<()>;
}
