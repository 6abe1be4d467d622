//! Selkie Server
//!
//! HTTP surface of the Selkie actor host: the routes the orchestrator
//! sidecar calls into, and the [`ActorHost`] entry point applications use
//! to register actors and start serving.
//!
//! # Overview
//!
//! The host is a library, not a binary: it is embedded in the application
//! that owns the actor implementations. An application builds an
//! [`ActorHost`], points it at the sidecar's state API, registers its
//! actor types, and calls [`ActorHost::serve`].
//!
//! Routes consumed by the sidecar:
//!
//! | Method | Path | Behavior |
//! |--------|------|----------|
//! | PUT | `/actors/{type}/{id}/method/{method}[/{reminder}]` | method/reminder/timer dispatch |
//! | DELETE | `/actors/{type}/{id}` | deactivation |
//! | GET | `/dapr/config` | actor registration/config document |
//! | GET | `/healthz` | liveness probe |

pub mod health;
pub mod host;
pub mod routes;

pub use health::{AlwaysHealthy, HealthCheck};
pub use host::{init_tracing, ActorHost};
pub use routes::{router, AppState};
