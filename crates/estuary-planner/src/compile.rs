//! The seam to the external parser/optimizer.

use estuary_error::Result;
use estuary_types::{ColumnType, ColumnValue};

use crate::plan::{ParameterSet, StatementPartitioning};

/// Most placeholders a single statement may declare.
pub const MAX_PARAM_COUNT: usize = 1025;

/// One planning request handed to the compiler.
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    /// Trimmed, non-empty SQL text.
    pub sql: &'a str,
    pub partitioning: StatementPartitioning,
    pub swap_tables: bool,
    pub large_query: bool,
}

/// The compiled plan produced by the external optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPlan {
    /// Serialized plan fragment, opaque to this crate.
    pub fragment: Vec<u8>,
    pub read_only: bool,
    /// Whether the optimizer actually planned on the large-query path;
    /// may differ from the requested mode.
    pub is_large_query: bool,
    /// Placeholder schema, in parameter order.
    pub parameter_types: Vec<ColumnType>,
    /// Partitioning as resolved during planning.
    pub partitioning: StatementPartitioning,
    pub partitioning_param_index: Option<usize>,
    pub partitioning_param_value: Option<ColumnValue>,
}

/// Everything the compiler reports about one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub plan: CompiledPlan,
    /// SQL with literal constants replaced by placeholders; the
    /// parameterized cache key.
    pub parsed_token: String,
    /// Number of placeholders the user wrote in the statement.
    pub param_count: usize,
    /// Literal constants pulled out during parameterization, in order.
    pub extracted_literals: Vec<ColumnValue>,
    /// Whether the plan was compiled against the parameterized form.
    pub compiled_as_parameterized: bool,
    /// Values of the extracted parameters when compiled as parameterized.
    pub extracted_param_values: ParameterSet,
    /// The statement hit an exception while being parameterized; its plan
    /// is usable but must not join the parameterized cache level.
    pub bad_parameterization: bool,
}

/// External parser + optimizer.
///
/// Implementations are not reentrant; the facade serializes all calls
/// through a global lock. Parse and semantic failures come back as
/// planning errors; anything unexpected as an internal error, which the
/// facade logs before surfacing.
pub trait QueryCompiler: Send {
    fn compile(&mut self, request: &PlanRequest<'_>) -> Result<CompiledQuery>;
}
