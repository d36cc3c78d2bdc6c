//! Planner statistics collection.
//!
//! A process-wide collector brackets every ad-hoc planning call: the
//! facade takes a [`CollectionStart`] token up front and reports the
//! outcome (cache use, cache sizes, elapsed time) when the call finishes,
//! success or failure. The collector is a lazily initialized singleton
//! created the first time a planner facade is constructed; any host-wide
//! metric agent consumes it through [`PlannerStats::snapshot`].

use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

static PLANNER_STATS: LazyLock<PlannerStats> = LazyLock::new(PlannerStats::new);

/// How the plan cache served one planning call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum CacheUse {
    /// Served straight from the literal cache.
    Hit,
    /// The cache was consulted and missed; planning proceeded.
    Miss,
    /// Planning failed before a cache verdict was reached.
    Fail,
}

/// Opaque token pairing a `start` with its matching `end`.
///
/// Carries the start instant so concurrent planners do not interleave
/// their timings through shared state.
#[derive(Debug)]
pub struct CollectionStart {
    started_at: Instant,
}

/// Point-in-time view of the collector's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PlannerStatsSnapshot {
    pub plans_total: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub failures: u64,
    pub plan_nanos_total: u64,
    pub literal_cache_size: u64,
    pub core_cache_size: u64,
}

/// Process-wide planner statistics collector.
#[derive(Debug, Default)]
pub struct PlannerStats {
    plans_total: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    failures: AtomicU64,
    plan_nanos_total: AtomicU64,
    literal_cache_size: AtomicU64,
    core_cache_size: AtomicU64,
}

impl PlannerStats {
    fn new() -> Self {
        Self::default()
    }

    /// The process-wide collector, created on first touch.
    pub fn global() -> &'static Self {
        &PLANNER_STATS
    }

    /// Begin bracketing one planning call.
    #[must_use]
    pub fn start_collection(&self) -> CollectionStart {
        CollectionStart {
            started_at: Instant::now(),
        }
    }

    /// Finish bracketing one planning call.
    pub fn end_collection(
        &self,
        literal_cache_size: u64,
        core_cache_size: u64,
        cache_use: CacheUse,
        start: CollectionStart,
    ) {
        let elapsed = u64::try_from(start.started_at.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.plans_total.fetch_add(1, Ordering::Relaxed);
        self.plan_nanos_total.fetch_add(elapsed, Ordering::Relaxed);
        self.literal_cache_size
            .store(literal_cache_size, Ordering::Relaxed);
        self.core_cache_size.store(core_cache_size, Ordering::Relaxed);
        match cache_use {
            CacheUse::Hit => self.cache_hits.fetch_add(1, Ordering::Relaxed),
            CacheUse::Miss => self.cache_misses.fetch_add(1, Ordering::Relaxed),
            CacheUse::Fail => self.failures.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Snapshot the counters.
    #[must_use]
    pub fn snapshot(&self) -> PlannerStatsSnapshot {
        PlannerStatsSnapshot {
            plans_total: self.plans_total.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            plan_nanos_total: self.plan_nanos_total.load(Ordering::Relaxed),
            literal_cache_size: self.literal_cache_size.load(Ordering::Relaxed),
            core_cache_size: self.core_cache_size.load(Ordering::Relaxed),
        }
    }
}
