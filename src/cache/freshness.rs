//! Freshness policies
//!
//! A secondary validity check used by `TtlCache::load`. An entry can be live
//! (not past its deadline) and still be due for a refresh; the policy decides.

use std::time::Duration;

use crate::cache::Entry;

/// Decides whether a live entry is fresh.
pub trait Freshness<V> {
    /// Returns `true` if the entry can be used without refreshing it.
    fn is_fresh(&self, entry: &Entry<V>) -> bool;
}

impl<V, F> Freshness<V> for F
where
    F: Fn(&Entry<V>) -> bool,
{
    fn is_fresh(&self, entry: &Entry<V>) -> bool {
        self(entry)
    }
}

/// Fresh while the entry is younger than the given age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxAge(pub Duration);

impl<V> Freshness<V> for MaxAge {
    fn is_fresh(&self, entry: &Entry<V>) -> bool {
        entry.age() < self.0
    }
}

/// Fresh while more than the given margin is left before the deadline.
///
/// Entries without a deadline are always fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshAhead(pub Duration);

impl<V> Freshness<V> for RefreshAhead {
    fn is_fresh(&self, entry: &Entry<V>) -> bool {
        entry
            .ttl_remaining()
            .map_or(true, |remaining| remaining > self.0)
    }
}

/// Every live entry is fresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlwaysFresh;

impl<V> Freshness<V> for AlwaysFresh {
    fn is_fresh(&self, _entry: &Entry<V>) -> bool {
        true
    }
}
