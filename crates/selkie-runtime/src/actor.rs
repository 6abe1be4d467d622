//! Actor capability contract
//!
//! Every virtual actor implements a closed set of call kinds; the
//! dispatcher only ever calls through this trait, never through a
//! name-keyed lookup.

use async_trait::async_trait;
use selkie_core::Result;
use serde_json::Value;

/// The capability contract of a virtual actor
///
/// Implementations are constructed fresh for each dispatch, bound to one
/// actor identity (and, for state-bearing types, to a hydrated state
/// cell). Execution is turn-based: the runtime never runs two calls on the
/// same identity concurrently.
#[async_trait]
pub trait VirtualActor: Send {
    /// One-time setup, run before the first call since the identity was
    /// last deactivated (or since the host started)
    async fn on_activation(&mut self) -> Result<()> {
        Ok(())
    }

    /// Teardown, run when the sidecar deactivates the identity
    async fn on_deactivation(&mut self) -> Result<()> {
        Ok(())
    }

    /// A durable reminder delivery
    async fn remind(&mut self, reminder: &str, data: Value) -> Result<()>;

    /// A named method or timer callback
    ///
    /// `args` is the decoded request body (or the timer's argument list);
    /// the return value becomes the response body for plain method calls.
    async fn invoke(&mut self, method: &str, args: Value) -> Result<Value>;
}
