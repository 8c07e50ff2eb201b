//! In-memory caching for fetched entity lists.
//!
//! This module provides an injectable, process-lifetime cache that:
//! - Stores serialized records under keys built from entity name + filter parameters
//! - Expires entries after a single global TTL (checked lazily on access)
//! - Supports only coarse invalidation: everything is cleared after a mutation
//! - Lets callers bypass the cache with a forced fetch

mod layer;
mod memory;
mod traits;

pub use layer::CacheLayer;
pub use memory::TtlCache;
pub use traits::{CacheKey, CacheSource, SharedCache};

#[cfg(test)]
pub use traits::{CacheStore, ManualClock};
