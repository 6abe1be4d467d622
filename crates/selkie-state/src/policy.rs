//! Consistency policies for state writes
//!
//! TigerStyle: Immutable value objects, explicit wire strings.
//!
//! A policy is two independent axes: how durable a write must be before the
//! backend acknowledges it, and what happens when a conditional write's etag
//! no longer matches.

use serde::{Deserialize, Serialize};

/// Durability confirmation level required from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consistency {
    /// The write must be confirmed by a quorum before returning
    Strong,
    /// The write may be acknowledged before replication completes
    Eventual,
}

/// Conflict-resolution rule on etag mismatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Concurrency {
    /// Reject the write when the stored etag no longer matches
    #[serde(rename = "first-write")]
    FirstWrite,
    /// Apply the write regardless of the stored etag
    #[serde(rename = "last-write")]
    LastWrite,
}

/// A (durability, conflict-resolution) pair applied to state writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyPolicy {
    pub consistency: Consistency,
    pub concurrency: Concurrency,
}

impl ConsistencyPolicy {
    pub const fn new(consistency: Consistency, concurrency: Concurrency) -> Self {
        Self {
            consistency,
            concurrency,
        }
    }

    pub const fn strong_first_write() -> Self {
        Self::new(Consistency::Strong, Concurrency::FirstWrite)
    }

    pub const fn strong_last_write() -> Self {
        Self::new(Consistency::Strong, Concurrency::LastWrite)
    }

    pub const fn eventual_first_write() -> Self {
        Self::new(Consistency::Eventual, Concurrency::FirstWrite)
    }

    pub const fn eventual_last_write() -> Self {
        Self::new(Consistency::Eventual, Concurrency::LastWrite)
    }

    /// Whether an etag mismatch rejects the write
    pub fn rejects_on_conflict(&self) -> bool {
        self.concurrency == Concurrency::FirstWrite
    }
}

impl Default for ConsistencyPolicy {
    fn default() -> Self {
        Self::eventual_last_write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = ConsistencyPolicy::default();
        assert_eq!(policy.consistency, Consistency::Eventual);
        assert_eq!(policy.concurrency, Concurrency::LastWrite);
        assert!(!policy.rejects_on_conflict());
    }

    #[test]
    fn test_first_write_rejects() {
        assert!(ConsistencyPolicy::strong_first_write().rejects_on_conflict());
        assert!(ConsistencyPolicy::eventual_first_write().rejects_on_conflict());
        assert!(!ConsistencyPolicy::strong_last_write().rejects_on_conflict());
        assert!(!ConsistencyPolicy::eventual_last_write().rejects_on_conflict());
    }

    #[test]
    fn test_wire_strings() {
        let json = serde_json::to_value(ConsistencyPolicy::strong_first_write()).unwrap();
        assert_eq!(json["consistency"], "strong");
        assert_eq!(json["concurrency"], "first-write");

        let json = serde_json::to_value(ConsistencyPolicy::eventual_last_write()).unwrap();
        assert_eq!(json["consistency"], "eventual");
        assert_eq!(json["concurrency"], "last-write");
    }
}
