//! Activation tracking
//!
//! TigerStyle: Atomic check-and-set under a per-identity mutex.
//!
//! One slot per actor identity records whether `on_activation` has run
//! since the identity was last deactivated or the host started. The slot's
//! mutex is held across an entire dispatch, which both makes the
//! check-and-set atomic and gives the turn-based execution guarantee: a
//! second invocation on the same identity waits for the first to finish.

use selkie_core::ActorKey;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Per-identity activation slot
///
/// The flag is `true` while the identity is activated. Lock the slot for
/// the duration of a dispatch.
pub type ActivationSlot = Arc<tokio::sync::Mutex<bool>>;

/// Process-wide activation table
///
/// Slots are retained after deactivation (with the flag reset), bounded by
/// the number of distinct identities this host has seen.
#[derive(Default)]
pub struct ActivationTracker {
    slots: Mutex<HashMap<String, ActivationSlot>>,
}

impl ActivationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the slot for an identity
    pub fn slot(&self, key: &ActorKey) -> ActivationSlot {
        let mut slots = self.slots.lock().unwrap();
        slots
            .entry(key.qualified_name())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(false)))
            .clone()
    }

    /// Whether an identity is currently activated
    ///
    /// Waits for any in-flight dispatch on the identity to finish.
    pub async fn is_activated(&self, key: &ActorKey) -> bool {
        *self.slot(key).lock().await
    }
}
