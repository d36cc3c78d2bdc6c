//! The serialized planner facade.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use estuary_error::{EstuaryError, Result};
use estuary_observability::{CacheUse, PlannerStats};
use estuary_types::ColumnValue;
use parking_lot::Mutex;
use rand::Rng;

use crate::cache::PlanCache;
use crate::compile::{CompiledQuery, PlanRequest, QueryCompiler, MAX_PARAM_COUNT};
use crate::config::PlannerConfig;
use crate::plan::{CorePlan, ParameterSet, PlannedStatement, StatementPartitioning};

/// Serialized front door for ad-hoc planning.
///
/// All planning runs under one lock because the external optimizer is not
/// reentrant; callers must tolerate contention. The facade consults the
/// plan cache, invokes the compiler on misses, enforces the parameter
/// policy, and brackets everything with planner statistics.
pub struct AdHocPlanner<C: QueryCompiler> {
    inner: Mutex<PlannerInner<C>>,
    large_mode_ratio: f64,
    large_mode_count: AtomicU64,
    large_fallback_count: AtomicU64,
}

struct PlannerInner<C> {
    compiler: C,
    cache: PlanCache,
    catalog_hash: Vec<u8>,
}

impl<C: QueryCompiler> AdHocPlanner<C> {
    pub fn new(compiler: C, catalog_hash: Vec<u8>, config: &PlannerConfig) -> Self {
        // Force the process-wide collector into existence before the first
        // planning call.
        let _ = PlannerStats::global();
        Self {
            inner: Mutex::new(PlannerInner {
                compiler,
                cache: PlanCache::new(),
                catalog_hash,
            }),
            large_mode_ratio: config.large_mode_ratio.clamp(0.0, 1.0),
            large_mode_count: AtomicU64::new(0),
            large_fallback_count: AtomicU64::new(0),
        }
    }

    /// Plan one ad-hoc statement.
    pub fn plan(
        &self,
        sql: &str,
        partitioning: StatementPartitioning,
        is_explain: bool,
        user_params: &[ColumnValue],
        is_swap_tables: bool,
        is_large: bool,
    ) -> Result<Arc<PlannedStatement>> {
        let mut large = is_large;
        if self.large_mode_ratio > 0.0 && !large {
            if self.large_mode_ratio >= 1.0
                || self.large_mode_ratio > rand::thread_rng().gen::<f64>()
            {
                large = true;
                self.large_mode_count.fetch_add(1, Ordering::Relaxed);
            }
        }

        let stats = PlannerStats::global();
        let start = stats.start_collection();
        let mut cache_use = CacheUse::Fail;

        let mut inner = self.inner.lock();
        let result = self.plan_locked(
            &mut inner,
            sql,
            partitioning,
            is_explain,
            user_params,
            is_swap_tables,
            large,
            &mut cache_use,
        );
        let literal_size = inner.cache.literal_size() as u64;
        let core_size = inner.cache.core_size() as u64;
        drop(inner);

        stats.end_collection(literal_size, core_size, cache_use, start);
        result
    }

    /// Convenience wrapper used by tests: inferred partitioning, no
    /// parameters, nothing forced.
    pub fn plan_sql_for_test(&self, sql: &str) -> Result<Arc<PlannedStatement>> {
        self.plan(sql, StatementPartitioning::Inferred, false, &[], false, false)
    }

    #[allow(clippy::too_many_arguments)]
    fn plan_locked(
        &self,
        inner: &mut PlannerInner<C>,
        sql: &str,
        partitioning: StatementPartitioning,
        is_explain: bool,
        user_params: &[ColumnValue],
        is_swap_tables: bool,
        large: bool,
        cache_use: &mut CacheUse,
    ) -> Result<Arc<PlannedStatement>> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(EstuaryError::EmptySql);
        }

        // Only inferred, non-large statements are cacheable: forced modes
        // produce plans that may be wrong in other contexts, and large
        // plans differ from normal plans for the same text.
        if partitioning.is_inferred() && !large {
            if let Some(hit) = inner.cache.get_with_sql(sql) {
                *cache_use = CacheUse::Hit;
                tracing::debug!(target: "estuary.planner", sql, "literal cache hit");
                return Ok(hit);
            }
            *cache_use = CacheUse::Miss;
        }

        let request = PlanRequest {
            sql,
            partitioning,
            swap_tables: is_swap_tables,
            large_query: large,
        };
        let compiled = match inner.compiler.compile(&request) {
            Ok(compiled) => compiled,
            Err(err) => {
                // Parse and validation failures are expected and carry
                // their own message; anything else gets logged with
                // context before being surfaced.
                if !err.is_planning() {
                    tracing::error!(target: "estuary.planner", error = %err, sql, "error compiling query");
                }
                return Err(err);
            }
        };

        if compiled.param_count > MAX_PARAM_COUNT {
            return Err(EstuaryError::TooManyParameters {
                count: compiled.param_count,
                max: MAX_PARAM_COUNT,
            });
        }
        let mut wrong_parameter_count = false;
        if compiled.param_count != user_params.len() {
            wrong_parameter_count = true;
            if !is_explain {
                return Err(EstuaryError::WrongParameterCount {
                    expected: compiled.param_count,
                    passed: user_params.len(),
                });
            }
        }
        let has_question_mark = compiled.param_count > 0;
        let partitioning = compiled.plan.partitioning;

        if compiled.plan.is_large_query != large {
            self.large_fallback_count.fetch_add(1, Ordering::Relaxed);
        }

        let cacheable = !wrong_parameter_count && partitioning.is_inferred() && !large;

        // Parameterized level: reuse a compatible pre-compiled variant and
        // just rebind its parameters.
        if cacheable {
            if let Some(variants) = inner.cache.get_with_parsed_token(&compiled.parsed_token) {
                let matched = variants
                    .iter()
                    .find(|variant| variant.allows_params(&compiled.extracted_literals));
                if let Some(matched) = matched {
                    let statement = Arc::new(PlannedStatement {
                        sql: sql.to_owned(),
                        core: Arc::clone(&matched.core),
                        params: bind_params(&compiled, user_params, has_question_mark),
                        bound_constants: matched.constants.clone(),
                    });
                    // A variant served from the cache parameterized cleanly.
                    inner.cache.put(
                        sql,
                        &compiled.parsed_token,
                        &statement,
                        &compiled.extracted_literals,
                        has_question_mark,
                        false,
                    );
                    tracing::debug!(target: "estuary.planner", sql, "parameterized cache hit");
                    return Ok(statement);
                }
            }
        }

        // Full finalize: wrap the compiled plan with the current catalog.
        let core = Arc::new(CorePlan::new(&compiled.plan, inner.catalog_hash.clone()));
        let statement = Arc::new(PlannedStatement {
            sql: sql.to_owned(),
            core,
            params: bind_params(&compiled, user_params, has_question_mark),
            bound_constants: None,
        });
        if cacheable {
            inner.cache.put(
                sql,
                &compiled.parsed_token,
                &statement,
                &compiled.extracted_literals,
                has_question_mark,
                compiled.bad_parameterization,
            );
        }
        Ok(statement)
    }

    /// Swap in the hash of a newly deployed catalog. The cache is keyed
    /// per catalog, so the old entries are dropped with it.
    pub fn update_catalog(&self, catalog_hash: Vec<u8>) {
        let mut inner = self.inner.lock();
        inner.catalog_hash = catalog_hash;
        inner.cache = PlanCache::new();
    }

    /// Queries sampled into large mode by the configured ratio.
    pub fn large_mode_count(&self) -> u64 {
        self.large_mode_count.load(Ordering::Relaxed)
    }

    /// Plans whose actual large mode differed from the requested one.
    pub fn large_fallback_count(&self) -> u64 {
        self.large_fallback_count.load(Ordering::Relaxed)
    }

    /// Current (literal, core) cache sizes.
    pub fn cache_sizes(&self) -> (usize, usize) {
        let inner = self.inner.lock();
        (inner.cache.literal_size(), inner.cache.core_size())
    }
}

fn bind_params(
    compiled: &CompiledQuery,
    user_params: &[ColumnValue],
    has_question_mark: bool,
) -> ParameterSet {
    if compiled.compiled_as_parameterized {
        compiled.extracted_param_values.clone()
    } else if has_question_mark {
        ParameterSet::from_values(user_params.to_vec())
    } else {
        ParameterSet::empty()
    }
}
