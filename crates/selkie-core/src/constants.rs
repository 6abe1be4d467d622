//! TigerStyle constants for Selkie
//!
//! All limits are explicit, use big-endian naming (most significant first),
//! and include units in the name.

// =============================================================================
// Actor Limits
// =============================================================================

/// Maximum length of an actor type name in bytes
pub const ACTOR_TYPE_LENGTH_BYTES_MAX: usize = 128;

/// Maximum length of an actor ID in bytes
pub const ACTOR_ID_LENGTH_BYTES_MAX: usize = 256;

// =============================================================================
// State Limits
// =============================================================================

/// Maximum length of a state key in bytes (including the actor prefix)
pub const STATE_KEY_LENGTH_BYTES_MAX: usize = 1024;

/// Maximum number of entries in a single batched state write
pub const STATE_BATCH_ENTRIES_COUNT_MAX: usize = 1_000;

/// Default backend-side fan-out hint for bulk reads
pub const BULK_READ_PARALLELISM_DEFAULT: u32 = 10;

/// Maximum backend-side fan-out hint for bulk reads
pub const BULK_READ_PARALLELISM_MAX: u32 = 64;

// Compile-time assertions for constant validity
const _: () = {
    assert!(ACTOR_TYPE_LENGTH_BYTES_MAX >= 64);
    assert!(ACTOR_ID_LENGTH_BYTES_MAX >= 64);
    assert!(STATE_KEY_LENGTH_BYTES_MAX > ACTOR_TYPE_LENGTH_BYTES_MAX + ACTOR_ID_LENGTH_BYTES_MAX);
    assert!(STATE_BATCH_ENTRIES_COUNT_MAX >= 1);
    assert!(BULK_READ_PARALLELISM_DEFAULT <= BULK_READ_PARALLELISM_MAX);
};
