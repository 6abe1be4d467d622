//! Selkie Runtime
//!
//! Actor lifecycle dispatcher for Selkie virtual actors.
//!
//! # Overview
//!
//! The runtime provides:
//! - Request-to-actor binding through a read-only type registry
//! - One-time activation per actor identity (`on_activation` runs at most
//!   once per activation epoch)
//! - Call-kind dispatch: methods, reminders, timers, deactivation
//! - State hydration before the call and a single commit after it
//!
//! # TigerStyle
//! - Turn-based execution (at most one in-flight call per actor identity)
//! - Explicit lifecycle transitions, no observable transient states
//! - Commit failures surface, never silently dropped

pub mod actor;
pub mod dispatcher;
pub mod registry;
pub mod tracker;

pub use actor::VirtualActor;
pub use dispatcher::Dispatcher;
pub use registry::{ActorRegistry, ActorTypeBinding};
pub use tracker::ActivationTracker;
