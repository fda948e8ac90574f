//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised while constructing a cache.
///
/// Runtime operations never fail: a missing or expired key is reported as
/// `None`/`false`, not as an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The janitor cannot run on a zero interval
    #[error("Invalid cleanup interval: {0:?} (must be greater than zero)")]
    InvalidCleanupInterval(Duration),

    /// The janitor task needs a tokio runtime to be spawned on
    #[error("No tokio runtime available to spawn the janitor task")]
    RuntimeUnavailable,
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
