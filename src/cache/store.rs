//! Cache Store Module
//!
//! Main cache engine: a concurrent map of immutable entries with lazy
//! read-time expiration and a background janitor.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::{ArcSwap, Guard};
use dashmap::DashMap;
use tracing::{debug, trace, warn};

use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheStats, Entry, Freshness, Ttl};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::tasks::{Janitor, JanitorState, Sweep};

type EntryMap<V> = DashMap<String, Arc<Entry<V>>>;

/// State shared by every handle of one cache.
///
/// The map is held through an atomic pointer so `flush` can swap in an empty
/// one without any operation waiting on another.
struct Shared<V> {
    entries: ArcSwap<EntryMap<V>>,
    stats: StatsRecorder,
}

impl<V> Shared<V> {
    fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(DashMap::new()),
            stats: StatsRecorder::new(),
        }
    }

    fn map(&self) -> Guard<Arc<EntryMap<V>>> {
        self.entries.load()
    }

    fn delete_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        // Pinned for the whole pass. A flush mid-pass leaves the pass
        // finishing on the discarded map.
        let map = self.entries.load_full();
        map.retain(|_, entry| {
            if entry.is_expired_at(now) {
                removed += 1;
                false
            } else {
                true
            }
        });

        self.stats.record_sweep(removed);
        removed
    }
}

impl<V> Sweep for Shared<V> {
    fn sweep(&self) -> usize {
        self.delete_expired()
    }
}

// == TTL Cache ==
/// Concurrent key-value cache with per-entry TTL.
///
/// `TtlCache` is a handle: clones share the same entries and janitor. The
/// janitor stops on [`TtlCache::close`], on [`TtlCache::shutdown`], or once
/// every handle has been dropped.
///
/// # Example
/// ```ignore
/// let cache = TtlCache::new(Duration::from_millis(100))?;
/// cache.set("a", 42, Duration::from_millis(50));
/// assert_eq!(cache.get_value("a"), Some(42));
/// ```
pub struct TtlCache<V> {
    shared: Arc<Shared<V>>,
    janitor: Arc<Janitor>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            janitor: Arc::clone(&self.janitor),
        }
    }
}

impl<V> TtlCache<V>
where
    V: Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache whose janitor sweeps every `cleanup_interval`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    /// * `cleanup_interval` - Time between two janitor sweeps, fixed for the cache's lifetime
    ///
    /// # Errors
    /// - `InvalidCleanupInterval` if `cleanup_interval` is zero
    /// - `RuntimeUnavailable` if no tokio runtime is running
    pub fn new(cleanup_interval: Duration) -> Result<Self> {
        Self::with_config(CacheConfig::new().with_cleanup_interval(cleanup_interval))
    }

    /// Creates a cache from a full configuration.
    ///
    /// # Arguments
    /// * `config` - Validated before anything is spawned
    ///
    /// # Errors
    /// Same as [`TtlCache::new`].
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared::new());
        let janitor = Janitor::spawn(Arc::downgrade(&shared), config.cleanup_interval)?;

        Ok(Self {
            shared,
            janitor: Arc::new(janitor),
        })
    }
}

impl<V> TtlCache<V> {
    // == Set ==
    /// Stores a value under `key`, replacing any previous entry.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - A `Duration` or [`Ttl`]; a zero duration or [`Ttl::Never`]
    ///   stores the entry without expiration
    pub fn set(&self, key: impl Into<String>, value: V, ttl: impl Into<Ttl>) {
        let key = key.into();
        let entry = Arc::new(Entry::new(value, ttl));
        trace!(key = %key, expires = entry.expires_at().is_some(), "set");
        self.shared.map().insert(key, entry);
    }

    // == Get ==
    /// Returns the entry for `key` if it is present and not expired.
    ///
    /// An expired entry is hidden but left in place for the janitor.
    pub fn get(&self, key: &str) -> Option<Arc<Entry<V>>> {
        match self.lookup(key) {
            Some(entry) if entry.is_expired() => {
                self.shared.stats.record_expired_read();
                None
            }
            Some(entry) => {
                self.shared.stats.record_hit();
                Some(entry)
            }
            None => {
                self.shared.stats.record_miss();
                None
            }
        }
    }

    /// Returns a copy of the live value for `key`.
    pub fn get_value(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        self.get(key).map(|entry| entry.value().clone())
    }

    // == Load ==
    /// Like [`TtlCache::get`], also reporting whether the entry is fresh
    /// according to `freshness`.
    ///
    /// # Arguments
    /// * `key` - The key to retrieve
    /// * `freshness` - Policy evaluated on the live entry
    ///
    /// # Returns
    /// - `Some((entry, true))` if the entry is live and fresh
    /// - `Some((entry, false))` if the entry is live but due for a refresh
    /// - `None` if the key is absent or expired
    pub fn load<F>(&self, key: &str, freshness: &F) -> Option<(Arc<Entry<V>>, bool)>
    where
        F: Freshness<V> + ?Sized,
    {
        let entry = self.get(key)?;
        let fresh = freshness.is_fresh(&entry);
        Some((entry, fresh))
    }

    // == Delete ==
    /// Removes `key`. Returns whether an entry was present, expired or not.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.shared.map().remove(key).is_some();
        if removed {
            trace!(key = %key, "delete");
        }
        removed
    }

    // == Delete Expired ==
    /// Removes every entry whose deadline has passed as of now.
    ///
    /// This is the sweep the janitor runs. Returns the number removed.
    pub fn delete_expired(&self) -> usize {
        let removed = self.shared.delete_expired();
        debug!("Manual sweep: removed {} expired entries", removed);
        removed
    }

    // == Flush ==
    /// Discards every entry by swapping in an empty map.
    ///
    /// Writes that start after the swap land in the new map. A write racing
    /// the swap may land in either map.
    ///
    /// # Returns
    /// The number of entries in the discarded map at the time of the swap.
    pub fn flush(&self) -> usize {
        let old = self.shared.entries.swap(Arc::new(DashMap::new()));

        let discarded = old.len();
        self.shared.stats.record_flush(discarded);
        if discarded > 0 {
            warn!("Flushed {} entries", discarded);
        }
        discarded
    }

    /// Whether `key` holds a live entry. Does not touch the statistics.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lookup(key).is_some_and(|entry| !entry.is_expired())
    }

    /// Whether `key` is physically stored, expired or not.
    pub fn is_resident(&self, key: &str) -> bool {
        self.shared.map().contains_key(key)
    }

    // == Length ==
    /// Number of stored entries, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.shared.map().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.shared.map().is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.shared.stats.snapshot(self.len())
    }

    // == Lifecycle ==
    /// The janitor's sweep interval.
    pub fn cleanup_interval(&self) -> Duration {
        self.janitor.interval()
    }

    /// Current janitor state.
    pub fn janitor_state(&self) -> JanitorState {
        self.janitor.state()
    }

    /// Signals the janitor to stop without waiting for it.
    ///
    /// The cache stays usable: expired entries are still hidden on read and
    /// can be reclaimed with [`TtlCache::delete_expired`].
    pub fn close(&self) {
        self.janitor.close();
    }

    /// Stops the janitor and waits for its task to exit.
    pub async fn shutdown(&self) {
        self.janitor.shutdown().await;
    }

    fn lookup(&self, key: &str) -> Option<Arc<Entry<V>>> {
        self.shared
            .map()
            .get(key)
            .map(|entry| Arc::clone(entry.value()))
    }
}

impl<V> fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("len", &self.len())
            .field("cleanup_interval", &self.cleanup_interval())
            .field("janitor", &self.janitor_state())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{AlwaysFresh, MaxAge};
    use crate::error::CacheError;
    use std::thread::sleep;

    const LONG_INTERVAL: Duration = Duration::from_secs(3600);

    fn quiet_cache<V: Send + Sync + 'static>() -> TtlCache<V> {
        TtlCache::new(LONG_INTERVAL).unwrap()
    }

    #[tokio::test]
    async fn test_store_new() {
        let cache: TtlCache<String> = quiet_cache();
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.cleanup_interval(), LONG_INTERVAL);
    }

    #[tokio::test]
    async fn test_store_rejects_zero_interval() {
        let result = TtlCache::<u32>::new(Duration::ZERO);
        assert!(matches!(result, Err(CacheError::InvalidCleanupInterval(_))));
    }

    #[test]
    fn test_store_requires_runtime() {
        let result = TtlCache::<u32>::new(Duration::from_secs(1));
        assert!(matches!(result, Err(CacheError::RuntimeUnavailable)));
    }

    #[tokio::test]
    async fn test_store_set_and_get() {
        let cache = quiet_cache();

        cache.set("key1", "value1".to_string(), Duration::from_secs(60));

        let entry = cache.get("key1").unwrap();
        assert_eq!(entry.value(), "value1");
        assert_eq!(cache.get_value("key1").as_deref(), Some("value1"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_store_get_nonexistent() {
        let cache: TtlCache<u32> = quiet_cache();
        assert!(cache.get("nonexistent").is_none());
    }

    #[tokio::test]
    async fn test_store_delete() {
        let cache = quiet_cache();

        cache.set("key1", 1, Ttl::Never);
        assert!(cache.delete("key1"));

        assert!(cache.is_empty());
        assert!(cache.get("key1").is_none());
    }

    #[tokio::test]
    async fn test_store_delete_is_idempotent() {
        let cache: TtlCache<u32> = quiet_cache();

        assert!(!cache.delete("nonexistent"));
        assert!(!cache.delete("nonexistent"));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_store_overwrite() {
        let cache = quiet_cache();

        cache.set("key1", "value1", Duration::from_millis(20));
        cache.set("key1", "value2", Ttl::Never);

        sleep(Duration::from_millis(40));

        assert_eq!(cache.get_value("key1"), Some("value2"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.delete_expired(), 0);
    }

    #[tokio::test]
    async fn test_store_overwrite_shortens_deadline() {
        let cache = quiet_cache();

        cache.set("key1", 1, Ttl::Never);
        cache.set("key1", 2, Duration::from_millis(20));

        sleep(Duration::from_millis(40));

        assert!(cache.get("key1").is_none());
    }

    #[tokio::test]
    async fn test_store_old_entry_survives_in_reader_hands() {
        let cache = quiet_cache();

        cache.set("key1", 1, Ttl::Never);
        let before = cache.get("key1").unwrap();
        cache.set("key1", 2, Ttl::Never);

        assert_eq!(*before.value(), 1);
        assert_eq!(cache.get_value("key1"), Some(2));
    }

    #[tokio::test]
    async fn test_store_lazy_expiration() {
        let cache = quiet_cache();

        cache.set("key1", "value1", Duration::from_millis(20));
        assert!(cache.get("key1").is_some());

        sleep(Duration::from_millis(40));

        // Hidden from readers, still resident until swept.
        assert!(cache.get("key1").is_none());
        assert!(!cache.contains_key("key1"));
        assert!(cache.is_resident("key1"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_store_delete_expired() {
        let cache = quiet_cache();

        cache.set("short", 1, Duration::from_millis(20));
        cache.set("long", 2, Duration::from_secs(60));
        cache.set("forever", 3, Ttl::Never);

        sleep(Duration::from_millis(40));

        assert_eq!(cache.delete_expired(), 1);
        assert!(!cache.is_resident("short"));
        assert_eq!(cache.get_value("long"), Some(2));
        assert_eq!(cache.get_value("forever"), Some(3));
    }

    #[tokio::test]
    async fn test_store_load_reports_freshness() {
        let cache = quiet_cache();

        cache.set("key1", 10, Ttl::Never);

        let (entry, fresh) = cache.load("key1", &AlwaysFresh).unwrap();
        assert_eq!(*entry.value(), 10);
        assert!(fresh);

        let (_, fresh) = cache.load("key1", &MaxAge(Duration::ZERO)).unwrap();
        assert!(!fresh);

        let (_, fresh) = cache
            .load("key1", &|entry: &Entry<i32>| *entry.value() > 5)
            .unwrap();
        assert!(fresh);

        assert!(cache.load("missing", &AlwaysFresh).is_none());
    }

    #[tokio::test]
    async fn test_store_load_hides_expired() {
        let cache = quiet_cache();

        cache.set("key1", 10, Duration::from_millis(20));
        sleep(Duration::from_millis(40));

        assert!(cache.load("key1", &AlwaysFresh).is_none());
    }

    #[tokio::test]
    async fn test_store_flush() {
        let cache = quiet_cache();

        cache.set("key1", 1, Ttl::Never);
        cache.set("key2", 2, Duration::from_secs(60));

        assert_eq!(cache.flush(), 2);
        assert!(cache.is_empty());
        assert!(cache.get("key1").is_none());

        cache.set("key3", 3, Ttl::Never);
        assert_eq!(cache.get_value("key3"), Some(3));
        assert_eq!(cache.flush(), 1);
        assert_eq!(cache.flush(), 0);
    }

    #[tokio::test]
    async fn test_store_flush_does_not_wait_for_sweep() {
        let cache = quiet_cache();

        cache.set("old", 1, Ttl::Never);

        // Pin the current map the way a sweep in progress does.
        let in_sweep = cache.shared.entries.load_full();

        assert_eq!(cache.flush(), 1);
        cache.set("new", 2, Ttl::Never);

        assert_eq!(cache.get_value("new"), Some(2));
        assert!(cache.get("old").is_none());
        assert!(in_sweep.contains_key("old"));
        assert!(!in_sweep.contains_key("new"));
    }

    #[test]
    fn test_store_flush_during_sweep_keeps_later_writes() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();
        let cache = quiet_cache();

        for i in 0..200_000 {
            cache.set(format!("key{}", i), i, Ttl::Never);
        }

        let sweeper = {
            let cache = cache.clone();
            std::thread::spawn(move || cache.delete_expired())
        };
        let flusher = {
            let cache = cache.clone();
            std::thread::spawn(move || cache.flush())
        };

        // Whatever the interleaving, writes after the flush returned are kept.
        let discarded = flusher.join().unwrap();
        cache.set("hot", 7, Ttl::Never);
        assert_eq!(cache.get_value("hot"), Some(7));

        assert_eq!(sweeper.join().unwrap(), 0);
        assert!(discarded <= 200_000);
        assert_eq!(cache.get_value("hot"), Some(7));
    }

    #[tokio::test]
    async fn test_store_clones_share_entries() {
        let cache = quiet_cache();
        let other = cache.clone();

        cache.set("key1", 1, Ttl::Never);
        assert_eq!(other.get_value("key1"), Some(1));

        other.flush();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_store_stats() {
        let cache = quiet_cache();

        cache.set("key1", 1, Ttl::Never);
        cache.set("key2", 2, Duration::from_millis(20));
        cache.get("key1"); // hit
        cache.get("missing"); // miss

        sleep(Duration::from_millis(40));
        cache.get("key2"); // expired miss
        cache.delete_expired();

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.expired_reads, 1);
        assert_eq!(stats.reclaimed, 1);
        assert_eq!(stats.sweeps, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test]
    async fn test_store_close_keeps_cache_usable() {
        let cache = quiet_cache();

        cache.shutdown().await;
        assert_eq!(cache.janitor_state(), JanitorState::Stopped);

        cache.set("key1", 1, Duration::from_millis(20));
        sleep(Duration::from_millis(40));

        assert!(cache.get("key1").is_none());
        assert!(cache.is_resident("key1"));
        assert_eq!(cache.delete_expired(), 1);
    }

    #[tokio::test]
    async fn test_store_debug() {
        let cache: TtlCache<u32> = quiet_cache();
        let rendered = format!("{:?}", cache);
        assert!(rendered.contains("TtlCache"));
        assert!(rendered.contains("Waiting"));
    }
}
