//! Estuary: per-partition transactional export streaming plus an ad-hoc
//! plan cache behind a serialized planner facade.
//!
//! The [`stream`] side accumulates row-level change events into a chain of
//! fixed-capacity blocks, tracks committed versus in-flight bytes through
//! a universal stream offset, rolls back precisely, fences schema
//! generations, and hands committed blocks to a top-end sink. The
//! [`planner`] side maps raw SQL and parameter-normalized tokens to
//! precompiled plans with a strict admission policy.

pub use estuary_error as error;
pub use estuary_observability as observability;
pub use estuary_planner as planner;
pub use estuary_stream as stream;
pub use estuary_types as types;

pub use estuary_error::{EstuaryError, Result};
pub use estuary_observability::{CacheUse, PlannerStats};
pub use estuary_planner::{AdHocPlanner, PlanCache, PlannerConfig, QueryCompiler};
pub use estuary_stream::{ExportSink, ExportStream, StreamBlock};
pub use estuary_types::{
    ColumnType, ColumnValue, GenerationId, PartitionId, SiteId, StreamOffset, TxnId,
};
