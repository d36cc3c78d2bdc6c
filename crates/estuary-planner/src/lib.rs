//! Ad-hoc plan cache and serialized planner facade.
//!
//! The facade ([`AdHocPlanner`]) accepts raw SQL, consults a two-level
//! [`PlanCache`] (exact SQL text, then parameter-normalized "parsed
//! token"), and otherwise invokes an external [`QueryCompiler`] under a
//! global lock — the underlying optimizer is not reentrant. Statistics
//! bracket every call through the process-wide
//! [`PlannerStats`](estuary_observability::PlannerStats) collector.

pub mod cache;
pub mod compile;
pub mod config;
pub mod plan;
pub mod planner;

pub use cache::PlanCache;
pub use compile::{CompiledPlan, CompiledQuery, PlanRequest, QueryCompiler, MAX_PARAM_COUNT};
pub use config::PlannerConfig;
pub use plan::{BoundPlan, CorePlan, ParameterSet, PlannedStatement, StatementPartitioning};
pub use planner::AdHocPlanner;
