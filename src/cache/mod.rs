//! Cache Module
//!
//! Named, versioned stores of request→response pairs and the storage
//! service that addresses them by name.

mod stats;
mod storage;
mod store;


// Re-export public types
pub use stats::CacheStats;
pub use storage::{CacheStorage, MemoryCacheStorage};
pub use store::NamedCache;

// == Public Constants ==
/// Maximum allowed URL length of a cache key in bytes
pub const MAX_KEY_LENGTH: usize = 2048;

/// Default byte quota shared by all named caches
pub const DEFAULT_QUOTA_BYTES: usize = 50 * 1024 * 1024; // 50 MB
