//! Actor identity
//!
//! TigerStyle: Explicit validation on construction, immutable after creation.

use crate::constants::{ACTOR_ID_LENGTH_BYTES_MAX, ACTOR_TYPE_LENGTH_BYTES_MAX};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identity of a virtual actor
///
/// An actor is addressed by its public type name plus an instance id. The
/// sidecar routes on the same pair, so both components are validated the
/// moment a request is bound to an actor.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ActorKey {
    actor_type: String,
    actor_id: String,
}

impl ActorKey {
    /// Create a new ActorKey with validation
    ///
    /// # Errors
    /// Returns an error if either component is empty, exceeds its length
    /// limit, or contains invalid characters.
    pub fn new(actor_type: impl Into<String>, actor_id: impl Into<String>) -> Result<Self> {
        let actor_type = actor_type.into();
        let actor_id = actor_id.into();

        if actor_type.is_empty() || actor_id.is_empty() {
            return Err(Error::InvalidActorKey {
                key: format!("{}:{}", actor_type, actor_id),
                reason: "actor type and id must not be empty".into(),
            });
        }

        if actor_type.len() > ACTOR_TYPE_LENGTH_BYTES_MAX {
            return Err(Error::InvalidActorKey {
                key: format!("{}:{}", actor_type, actor_id),
                reason: format!(
                    "type length {} exceeds limit {}",
                    actor_type.len(),
                    ACTOR_TYPE_LENGTH_BYTES_MAX
                ),
            });
        }

        if actor_id.len() > ACTOR_ID_LENGTH_BYTES_MAX {
            return Err(Error::InvalidActorKey {
                key: format!("{}:{}", actor_type, actor_id),
                reason: format!(
                    "id length {} exceeds limit {}",
                    actor_id.len(),
                    ACTOR_ID_LENGTH_BYTES_MAX
                ),
            });
        }

        // Validate characters (alphanumeric, dash, underscore, dot)
        let valid_chars = |s: &str| {
            s.chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        };

        if !valid_chars(&actor_type) {
            return Err(Error::InvalidActorKey {
                key: format!("{}:{}", actor_type, actor_id),
                reason: "type contains invalid characters".into(),
            });
        }

        if !valid_chars(&actor_id) {
            return Err(Error::InvalidActorKey {
                key: format!("{}:{}", actor_type, actor_id),
                reason: "id contains invalid characters".into(),
            });
        }

        Ok(Self {
            actor_type,
            actor_id,
        })
    }

    /// Get the actor type name
    pub fn actor_type(&self) -> &str {
        &self.actor_type
    }

    /// Get the actor instance id
    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    /// Get the fully qualified name (type:id)
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.actor_type, self.actor_id)
    }

    /// Prefix under which this actor's state fields are stored
    ///
    /// Composite-key convention of the sidecar state store:
    /// `{type}||{id}||{field}`.
    pub fn state_prefix(&self) -> String {
        format!("{}||{}||", self.actor_type, self.actor_id)
    }
}

impl fmt::Display for ActorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.actor_type, self.actor_id)
    }
}
