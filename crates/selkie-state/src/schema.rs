//! Declared state schemas and loaded-state handles
//!
//! A state-bearing actor type declares its persisted shape statically:
//! which store backs it, which fields are persisted, and the consistency
//! policy applied to writes. The engine consumes the declaration through
//! this trait instead of inspecting values at runtime.

use crate::policy::ConsistencyPolicy;
use selkie_core::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Statically declared persistence schema for an actor state type
///
/// The type must serialize to a JSON object whose keys cover `fields()`;
/// each declared field becomes one store key under the actor's prefix.
pub trait StateSchema:
    Serialize + DeserializeOwned + Default + Send + Sync + 'static
{
    /// Name of the backing store component
    const STORE: &'static str;

    /// Persisted field names, in declaration order
    fn fields() -> &'static [&'static str];

    /// Consistency policy applied to writes
    fn policy() -> ConsistencyPolicy {
        ConsistencyPolicy::default()
    }
}

/// A loaded state object together with its concurrency tokens
///
/// Owned pair of `{value, per-field etags}`: the handle returned by a load
/// is the same handle passed back into the save, so the etags recorded at
/// read time travel with the value they belong to.
#[derive(Debug)]
pub struct StateHandle<S: StateSchema> {
    /// The state value; mutated freely by actor code between load and save
    pub value: S,
    /// Store-key prefix this handle was loaded under
    prefix: String,
    /// field name -> etag recorded at load time
    etags: HashMap<String, String>,
}

impl<S: StateSchema> StateHandle<S> {
    /// Handle for an actor whose state has never been persisted
    pub fn fresh(prefix: impl Into<String>) -> Self {
        Self {
            value: S::default(),
            prefix: prefix.into(),
            etags: HashMap::new(),
        }
    }

    /// The store-key prefix of this handle
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The etag recorded for a field at load time, if the key existed
    pub fn etag(&self, field: &str) -> Option<&str> {
        self.etags.get(field).map(String::as_str)
    }

    /// Project the value into its declared fields
    ///
    /// Fails if the value does not serialize to a JSON object, or if a
    /// declared field is missing from the serialized form (a schema bug).
    pub(crate) fn field_values(&self) -> Result<Vec<(&'static str, Value)>> {
        let serialized =
            serde_json::to_value(&self.value).map_err(|e| Error::SerializationFailed {
                reason: e.to_string(),
            })?;
        let Value::Object(mut map) = serialized else {
            return Err(Error::SerializationFailed {
                reason: "state value must serialize to a JSON object".into(),
            });
        };

        let mut fields = Vec::with_capacity(S::fields().len());
        for &name in S::fields() {
            let value = map.remove(name).ok_or_else(|| Error::SerializationFailed {
                reason: format!("declared field {} missing from serialized state", name),
            })?;
            fields.push((name, value));
        }
        Ok(fields)
    }

    /// Rebuild the value from per-field JSON, defaulting absent fields
    pub(crate) fn from_fields(
        prefix: impl Into<String>,
        fields: HashMap<String, Value>,
        etags: HashMap<String, String>,
    ) -> Result<Self> {
        let defaults = serde_json::to_value(S::default()).map_err(|e| {
            Error::SerializationFailed {
                reason: e.to_string(),
            }
        })?;
        let mut map = match defaults {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (name, value) in fields {
            map.insert(name, value);
        }

        let value = serde_json::from_value(Value::Object(map)).map_err(|e| {
            Error::DeserializationFailed {
                reason: format!("state object: {}", e),
            }
        })?;

        Ok(Self {
            value,
            prefix: prefix.into(),
            etags,
        })
    }
}

/// Shared handle to an actor's loaded state
///
/// The same cell is injected into the actor at construction and read back
/// by the runtime at commit time. Accesses within one dispatch are
/// sequential; the lock exists for the multi-threaded host case.
pub struct StateCell<S: StateSchema> {
    inner: Arc<Mutex<StateHandle<S>>>,
}

impl<S: StateSchema> Clone for StateCell<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: StateSchema> StateCell<S> {
    pub fn new(handle: StateHandle<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(handle)),
        }
    }

    /// Read the state value
    pub async fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let guard = self.inner.lock().await;
        f(&guard.value)
    }

    /// Mutate the state value
    pub async fn with_mut<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = self.inner.lock().await;
        f(&mut guard.value)
    }

    /// Lock the underlying handle (used by the engine at commit time)
    pub async fn lock(&self) -> MutexGuard<'_, StateHandle<S>> {
        self.inner.lock().await
    }
}
