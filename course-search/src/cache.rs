//! In-memory result cache with mean-age eviction.
//!
//! Caches the ranked refs (never hydrated records) of a search keyed by
//! `(term id, normalised query)`. Hits refresh the entry's `last_touched`
//! timestamp. Entries are only ever removed by a sweep, which keeps an entry
//! when it is younger than the horizon *and* younger than the mean age of all
//! entries. Busy periods shrink the mean age and evict faster; quiet periods
//! let more entries survive.
//!
//! A sweep builds the surviving map from a snapshot and swaps it in as a
//! whole, so a concurrent lookup sees either the old or the new map.
//! Sweeps run on a timer ([`ResultCache::start`]) and as deferred tasks
//! ([`ResultCache::schedule_sweep`]) once the entry count passes the
//! high-water mark.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::SearchConfig;
use crate::types::ScoredRef;

/// Source of "now" for cache timestamps, in milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(start_millis),
        }
    }

    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.millis.fetch_add(by, Ordering::SeqCst);
    }

    pub fn set_millis(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Composite cache key. Kept structured so that distinct `(term, query)`
/// pairs can never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    term_id: String,
    query: String,
}

impl CacheKey {
    /// Build a key from a term id and an already-normalised query.
    pub fn new(term_id: impl Into<String>, normalized_query: impl Into<String>) -> Self {
        Self {
            term_id: term_id.into(),
            query: normalized_query.into(),
        }
    }

    pub fn term_id(&self) -> &str {
        &self.term_id
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Cached outcome of resolving one query's refs.
#[derive(Debug)]
pub struct CacheEntry {
    pub refs: Vec<ScoredRef>,
    pub was_subject_match: bool,
    pub subject_name: Option<String>,
    pub subject_count: Option<usize>,
    last_touched: AtomicU64,
}

impl CacheEntry {
    pub fn new(
        refs: Vec<ScoredRef>,
        was_subject_match: bool,
        subject_name: Option<String>,
        subject_count: Option<usize>,
        now_millis: u64,
    ) -> Self {
        Self {
            refs,
            was_subject_match,
            subject_name,
            subject_count,
            last_touched: AtomicU64::new(now_millis),
        }
    }

    /// Millisecond timestamp of the last insert or hit.
    pub fn last_touched(&self) -> u64 {
        self.last_touched.load(Ordering::Relaxed)
    }

    /// Later writers win; there is no ordering between concurrent hits.
    fn touch(&self, now_millis: u64) {
        self.last_touched.store(now_millis, Ordering::Relaxed);
    }
}

/// What a sweep did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepStats {
    /// Entries in the snapshot the sweep examined.
    pub examined: usize,
    /// Entries from the snapshot that survived.
    pub kept: usize,
    /// Mean age of the examined entries in milliseconds.
    pub mean_age_ms: f64,
}

type EntryMap = HashMap<CacheKey, Arc<CacheEntry>>;

/// Shared result cache. Wrap in an [`Arc`] to share between requests and
/// the sweep tasks.
pub struct ResultCache {
    entries: RwLock<EntryMap>,
    clock: Arc<dyn Clock>,
    horizon_ms: u64,
    high_water_mark: usize,
    sweep_interval: Duration,
    sweep_pending: AtomicBool,
    sweeper: Mutex<Option<CancellationToken>>,
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.len())
            .field("horizon_ms", &self.horizon_ms)
            .field("high_water_mark", &self.high_water_mark)
            .finish()
    }
}

impl ResultCache {
    pub fn new(
        clock: Arc<dyn Clock>,
        horizon: Duration,
        high_water_mark: usize,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            horizon_ms: u64::try_from(horizon.as_millis()).unwrap_or(u64::MAX),
            high_water_mark,
            sweep_interval,
            sweep_pending: AtomicBool::new(false),
            sweeper: Mutex::new(None),
        }
    }

    /// Build a cache from the eviction settings of `config`.
    pub fn from_config(config: &SearchConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            clock,
            Duration::from_secs(config.cache_horizon_secs),
            config.high_water_mark,
            Duration::from_secs(config.sweep_interval_secs),
        )
    }

    /// "Now" according to the cache's clock.
    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, EntryMap> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, EntryMap> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up an entry, refreshing its `last_touched` on a hit.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        let entry = self.read().get(key).cloned()?;
        entry.touch(self.clock.now_millis());
        Some(entry)
    }

    /// Store the refs for a key and return the stored entry.
    ///
    /// If another request stored the same key first, that entry is kept
    /// and returned.
    pub fn put(
        &self,
        key: CacheKey,
        refs: Vec<ScoredRef>,
        was_subject_match: bool,
        subject_name: Option<String>,
        subject_count: Option<usize>,
    ) -> Arc<CacheEntry> {
        let now = self.clock.now_millis();
        let mut entries = self.write();
        Arc::clone(entries.entry(key).or_insert_with(|| {
            Arc::new(CacheEntry::new(
                refs,
                was_subject_match,
                subject_name,
                subject_count,
                now,
            ))
        }))
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the entry count has passed the high-water mark.
    pub fn over_high_water_mark(&self) -> bool {
        self.len() > self.high_water_mark
    }

    /// Sweep against the injected clock.
    pub fn sweep_now(&self) -> SweepStats {
        self.sweep(self.clock.now_millis())
    }

    /// Evict every entry that is not younger than both the horizon and the
    /// mean age of all entries at `now_millis`.
    pub fn sweep(&self, now_millis: u64) -> SweepStats {
        let snapshot: EntryMap = self.read().clone();
        let examined = snapshot.len();
        if examined == 0 {
            return SweepStats {
                examined,
                kept: 0,
                mean_age_ms: 0.0,
            };
        }

        let age = |entry: &CacheEntry| now_millis.saturating_sub(entry.last_touched());
        let total_age: f64 = snapshot.values().map(|e| age(e) as f64).sum();
        let mean_age_ms = total_age / examined as f64;

        let mut next: EntryMap = snapshot
            .iter()
            .filter(|(_, entry)| {
                let entry_age = age(entry);
                entry_age < self.horizon_ms && (entry_age as f64) < mean_age_ms
            })
            .map(|(key, entry)| (key.clone(), Arc::clone(entry)))
            .collect();
        let kept = next.len();

        {
            let mut entries = self.write();
            // Entries stored while the snapshot was being filtered are new
            // and survive this sweep.
            for (key, entry) in entries.iter() {
                if !snapshot.contains_key(key) {
                    next.insert(key.clone(), Arc::clone(entry));
                }
            }
            *entries = next;
        }

        tracing::info!(examined, kept, mean_age_ms, "swept search cache");
        SweepStats {
            examined,
            kept,
            mean_age_ms,
        }
    }

    /// Submit a sweep to the runtime without waiting for it.
    ///
    /// Returns `None` when a deferred sweep is already pending or no tokio
    /// runtime is available; the periodic sweep still runs in that case.
    pub fn schedule_sweep(self: &Arc<Self>) -> Option<JoinHandle<SweepStats>> {
        if self.sweep_pending.swap(true, Ordering::AcqRel) {
            return None;
        }
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(err) => {
                self.sweep_pending.store(false, Ordering::Release);
                tracing::warn!(error = %err, "no runtime available for deferred cache sweep");
                return None;
            }
        };
        let cache = Arc::clone(self);
        Some(handle.spawn(async move {
            // Let the request that triggered this finish first.
            tokio::task::yield_now().await;
            let stats = cache.sweep_now();
            cache.sweep_pending.store(false, Ordering::Release);
            stats
        }))
    }

    /// Start the periodic sweep. Restarting replaces the previous timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self: &Arc<Self>) {
        let cancel = CancellationToken::new();
        let previous = self
            .sweeper
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(cancel.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.sweep_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("cache sweeper stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        let Some(cache) = weak.upgrade() else {
                            break;
                        };
                        cache.sweep_now();
                    }
                }
            }
        });
        tracing::debug!(interval_secs = period.as_secs(), "cache sweeper started");
    }

    /// Stop the periodic sweep, if running.
    pub fn stop(&self) {
        if let Some(cancel) = self.sweeper.lock().unwrap_or_else(|e| e.into_inner()).take() {
            cancel.cancel();
        }
    }

    /// Whether the periodic sweep is running.
    pub fn is_running(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

impl Drop for ResultCache {
    fn drop(&mut self) {
        self.stop();
    }
}
