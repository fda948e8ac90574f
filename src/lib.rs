//! ttl_cache - An in-process key-value cache with per-entry expiration
//!
//! Entries are hidden as soon as their deadline passes and physically
//! reclaimed by a background janitor task.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, Entry, Freshness, Ttl, TtlCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::JanitorState;
