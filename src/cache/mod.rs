//! Cache Module
//!
//! Provides in-memory caching with per-entry TTL and background reclamation.

mod entry;
mod freshness;
mod stats;
mod store;


// Re-export public types
pub use entry::{Entry, Ttl};
pub use freshness::{AlwaysFresh, Freshness, MaxAge, RefreshAhead};
pub use stats::CacheStats;
pub use store::TtlCache;
