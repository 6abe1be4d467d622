//! Host registration configuration
//!
//! TigerStyle: Explicit defaults, builder-style setters.
//!
//! The sidecar polls `GET /dapr/config` once at startup to learn which
//! actor types this host serves and how aggressively to deactivate idle
//! actors. All durations are normalized to the sidecar's interval string
//! format before they cross the wire.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Host-level actor runtime configuration
///
/// All knobs are optional; the sidecar applies its own defaults for any
/// field absent from the config document.
#[derive(Debug, Clone, Default)]
pub struct HostConfig {
    /// How long an actor may be idle before the sidecar deactivates it
    pub idle_timeout: Option<Duration>,
    /// How often the sidecar scans for idle actors
    pub scan_interval: Option<Duration>,
    /// How long to wait for an in-flight call when draining a rebalanced actor
    pub drain_timeout: Option<Duration>,
    /// Whether to wait for in-flight calls before deactivating rebalanced actors
    pub drain_rebalanced: Option<bool>,
}

impl HostConfig {
    /// Create a configuration with no overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the idle timeout before deactivation
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Set the idle-actor scan interval
    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = Some(interval);
        self
    }

    /// Set the drain timeout for rebalanced actors
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = Some(timeout);
        self
    }

    /// Set whether rebalanced actors are drained before deactivation
    pub fn with_drain_rebalanced(mut self, drain: bool) -> Self {
        self.drain_rebalanced = Some(drain);
        self
    }

    /// Build the registration document served at `GET /dapr/config`
    pub fn document(&self, entities: &[String]) -> ConfigDocument {
        ConfigDocument {
            entities: entities.to_vec(),
            actor_idle_timeout: self.idle_timeout.map(format_interval),
            actor_scan_interval: self.scan_interval.map(format_interval),
            drain_ongoing_call_timeout: self.drain_timeout.map(format_interval),
            drain_rebalanced_actors: self.drain_rebalanced,
        }
    }
}

/// The static registration/config document consumed by the sidecar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Actor type names served by this host
    pub entities: Vec<String>,
    #[serde(rename = "actorIdleTimeout", skip_serializing_if = "Option::is_none")]
    pub actor_idle_timeout: Option<String>,
    #[serde(rename = "actorScanInterval", skip_serializing_if = "Option::is_none")]
    pub actor_scan_interval: Option<String>,
    #[serde(
        rename = "drainOngoingCallTimeout",
        skip_serializing_if = "Option::is_none"
    )]
    pub drain_ongoing_call_timeout: Option<String>,
    #[serde(
        rename = "drainRebalancedActors",
        skip_serializing_if = "Option::is_none"
    )]
    pub drain_rebalanced_actors: Option<bool>,
}

/// Normalize a duration to the sidecar's interval string format
///
/// Sub-second precision is not representable and is truncated.
pub fn format_interval(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{}h{}m{}s", hours, minutes, seconds)
}
