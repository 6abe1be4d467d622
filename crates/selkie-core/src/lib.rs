//! Selkie Core
//!
//! Core types, errors, and constants for the Selkie virtual actor host.
//!
//! # Overview
//!
//! Selkie is the in-process runtime that turns inbound invocations from an
//! orchestrator sidecar into lifecycle-managed calls on virtual actors, and
//! persists each actor's durable state through the sidecar's state API with
//! optimistic-concurrency guarantees.
//!
//! # TigerStyle
//! - Safety > Performance > Developer Experience
//! - Explicit limits with big-endian naming (e.g., `ACTOR_ID_LENGTH_BYTES_MAX`)
//! - Explicit error types with context

pub mod config;
pub mod constants;
pub mod error;
pub mod invocation;
pub mod key;

pub use config::{format_interval, ConfigDocument, HostConfig};
pub use constants::*;
pub use error::{Error, Result};
pub use invocation::{CallKind, InvocationDescriptor, InvocationResponse};
pub use key::ActorKey;
