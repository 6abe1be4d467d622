//! Selkie State
//!
//! State consistency engine for Selkie virtual actors.
//!
//! # Overview
//!
//! Loads and saves actor state through the sidecar's state API with
//! etag-based optimistic concurrency:
//! - Per-key loads with default fallbacks ([`StateEngine::load_key`])
//! - Whole-object loads and batched conditional saves
//!   ([`StateEngine::load_object`], [`StateEngine::save_object`])
//! - Pluggable consistency policies ([`ConsistencyPolicy`])
//!
//! Two backends implement the sidecar contract:
//! - [`HttpStateBackend`] for production, speaking to the sidecar over loopback
//! - [`MemoryStateBackend`] for tests and simulation
//!
//! Field-level etags (rather than one etag per object) let concurrent
//! writers touching disjoint fields of the same actor's state commit
//! without spurious conflicts.

pub mod backend;
pub mod engine;
pub mod http;
pub mod item;
pub mod memory;
pub mod policy;
pub mod schema;

pub use backend::{BulkEntry, KeyResponse, Metadata, StateBackend, WriteEntry, WriteOptions};
pub use engine::StateEngine;
pub use http::HttpStateBackend;
pub use item::StateItem;
pub use memory::MemoryStateBackend;
pub use policy::{Concurrency, Consistency, ConsistencyPolicy};
pub use schema::{StateCell, StateHandle, StateSchema};
