//! Two-level ad-hoc plan cache.
//!
//! The literal level maps exact SQL text to a finished statement; the core
//! level maps the parameter-normalized "parsed token" to the list of bound
//! plan variants compiled for it, in insertion order. Both levels are
//! LRU-bounded. Admission policy that depends on how the statement was
//! planned (inferred partitioning, correct parameter count, not large)
//! lives in the facade; the cache itself only refuses core-level entries
//! for statements that failed parameterization.

use std::num::NonZeroUsize;
use std::sync::Arc;

use estuary_types::ColumnValue;
use lru::LruCache;

use crate::plan::{BoundPlan, ParameterSet, PlannedStatement};

/// Default bound for each cache level.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// The two-keyed plan cache.
pub struct PlanCache {
    literal: LruCache<String, Arc<PlannedStatement>>,
    core: LruCache<String, Vec<BoundPlan>>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Bound each level to at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            literal: LruCache::new(capacity),
            core: LruCache::new(capacity),
        }
    }

    /// Exact-SQL lookup.
    pub fn get_with_sql(&mut self, sql: &str) -> Option<Arc<PlannedStatement>> {
        self.literal.get(sql).cloned()
    }

    /// Parameterized-form lookup. The caller picks the first variant whose
    /// placeholder schema admits its extracted literals.
    pub fn get_with_parsed_token(&mut self, parsed_token: &str) -> Option<Vec<BoundPlan>> {
        self.core.get(parsed_token).cloned()
    }

    /// Insert a planned statement under both keys.
    ///
    /// The literal entry is always written. A core-level variant is added
    /// only when the statement parameterized cleanly and no equal variant
    /// exists; variants keep their insertion order.
    pub fn put(
        &mut self,
        sql: &str,
        parsed_token: &str,
        statement: &Arc<PlannedStatement>,
        extracted_literals: &[ColumnValue],
        had_user_question_mark: bool,
        bad_parameterization: bool,
    ) {
        self.literal.put(sql.to_owned(), Arc::clone(statement));

        if bad_parameterization {
            return;
        }

        let constants = if had_user_question_mark {
            None
        } else {
            Some(ParameterSet::from_values(extracted_literals.to_vec()))
        };
        let candidate = BoundPlan {
            core: Arc::clone(&statement.core),
            constants,
        };

        if let Some(variants) = self.core.get_mut(parsed_token) {
            if !variants.contains(&candidate) {
                variants.push(candidate);
            }
        } else {
            self.core.put(parsed_token.to_owned(), vec![candidate]);
        }
    }

    /// Entries in the literal level.
    pub fn literal_size(&self) -> usize {
        self.literal.len()
    }

    /// Entries in the core level.
    pub fn core_size(&self) -> usize {
        self.core.len()
    }
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::new()
    }
}
