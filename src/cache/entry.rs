//! Cache Entry Module
//!
//! Defines the immutable record stored for each key and the TTL that governs it.

use std::time::{Duration, Instant};

// == TTL ==
/// Lifetime requested for an entry at insertion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// The entry stays until deleted, overwritten or flushed
    #[default]
    Never,
    /// The entry expires this long after insertion
    After(Duration),
}

impl Ttl {
    /// Resolves the TTL into an absolute deadline relative to `now`.
    ///
    /// A zero duration and a deadline that does not fit in an `Instant` both
    /// resolve to no deadline.
    pub fn deadline_from(self, now: Instant) -> Option<Instant> {
        match self {
            Ttl::Never => None,
            Ttl::After(ttl) if ttl.is_zero() => None,
            Ttl::After(ttl) => now.checked_add(ttl),
        }
    }
}

impl From<Duration> for Ttl {
    fn from(ttl: Duration) -> Self {
        if ttl.is_zero() {
            Ttl::Never
        } else {
            Ttl::After(ttl)
        }
    }
}

impl From<Option<Duration>> for Ttl {
    fn from(ttl: Option<Duration>) -> Self {
        ttl.map_or(Ttl::Never, Ttl::from)
    }
}

// == Entry ==
/// One cached value with its timing metadata.
///
/// Entries are never mutated once stored; the store swaps in a new entry
/// when a key is overwritten.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    value: V,
    created_at: Instant,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    // == Constructor ==
    /// Creates an entry stamped with the current time.
    pub fn new(value: V, ttl: impl Into<Ttl>) -> Self {
        Self::created_at(value, ttl, Instant::now())
    }

    /// Creates an entry as if it had been inserted at `created_at`.
    pub fn created_at(value: V, ttl: impl Into<Ttl>, created_at: Instant) -> Self {
        Self {
            value,
            created_at,
            expires_at: ttl.into().deadline_from(created_at),
        }
    }

    /// The stored value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// When the entry was inserted.
    pub fn inserted_at(&self) -> Instant {
        self.created_at
    }

    /// The absolute deadline, `None` if the entry never expires.
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once the current time is greater
    /// than or equal to its deadline.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`Entry::is_expired`] against a given clock reading.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }

    // == Time To Live ==
    /// Remaining lifetime, or `None` if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` once the deadline has passed
    /// - `Some(remaining)` while the entry is live
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Time elapsed since insertion.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}
