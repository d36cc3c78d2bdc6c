use thiserror::Error;

/// Primary error type for Estuary operations.
///
/// Two families share the enum: unrecoverable stream invariant violations
/// (the owning site has no recovery strategy and must tear down — see
/// [`EstuaryError::is_fatal`]) and planning errors, which are expected,
/// carry a human-readable message across the facade boundary, and are not
/// logged with a backtrace.
#[derive(Error, Debug)]
pub enum EstuaryError {
    // === Stream invariant violations (fatal) ===
    /// A transaction id moved backwards within one stream.
    #[error("active transactions moving backwards: open txn#{open}, incoming txn#{incoming}")]
    TxnRegression { open: i64, incoming: i64 },

    /// Rollback was asked to discard bytes that were never written.
    #[error("truncating the future: mark {mark} is past the stream tail {uso}")]
    TruncatingFuture { mark: u64, uso: u64 },

    /// A block was asked to truncate outside its own byte range.
    #[error("truncate mark {mark} outside block range [{base}, {tail}]")]
    TruncateOutOfRange { mark: u64, base: u64, tail: u64 },

    /// A block was asked to consume more bytes than it has room for.
    #[error("block overflow: consumed {requested} bytes with {remaining} remaining")]
    BlockOverflow { requested: usize, remaining: usize },

    /// A single row cannot fit in an empty block of the default capacity.
    #[error("row of up to {required} bytes exceeds the block capacity {capacity}")]
    OversizeRow { required: usize, capacity: usize },

    /// The default block capacity can only change before the stream is used.
    #[error("default capacity only settable before the stream is used")]
    CapacityLocked,

    /// Block capacity must be nonzero.
    #[error("invalid block capacity {capacity}")]
    InvalidCapacity { capacity: usize },

    /// Schema generations never move backwards.
    #[error("generation moving backwards: current {current}, requested {requested}")]
    GenerationRegression { current: i64, requested: i64 },

    /// A stream's signature is fixed once assigned.
    #[error("signature mismatch: stream is '{current}', requested '{requested}'")]
    SignatureMismatch { current: String, requested: String },

    /// The top end refused a block; the stream cannot recover.
    #[error("export sink failure: {detail}")]
    SinkFailure { detail: String },

    // === Planning errors (expected) ===
    /// Empty or whitespace-only SQL.
    #[error("can't plan empty or null SQL")]
    EmptySql,

    /// Parse or semantic validation failure from the external optimizer.
    #[error("SQL error while compiling query: {detail}")]
    Planning { detail: String },

    /// The statement declares more placeholders than the engine supports.
    #[error("the statement's parameter count {count} must not exceed the maximum {max}")]
    TooManyParameters { count: usize, max: usize },

    /// Caller-supplied parameters do not match the statement's placeholders.
    #[error("incorrect number of parameters passed: expected {expected}, passed {passed}")]
    WrongParameterCount { expected: usize, passed: usize },

    /// Unexpected failure inside the compile pipeline; logged with context
    /// before being surfaced.
    #[error("SQL error while compiling query: {detail} (stack trace has been written to the log)")]
    Internal { detail: String },
}

impl EstuaryError {
    /// Whether this error leaves the component in an unusable state.
    ///
    /// Fatal errors are never caught inside the core; the owner tears the
    /// stream (or process) down.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::TxnRegression { .. }
                | Self::TruncatingFuture { .. }
                | Self::TruncateOutOfRange { .. }
                | Self::BlockOverflow { .. }
                | Self::OversizeRow { .. }
                | Self::CapacityLocked
                | Self::InvalidCapacity { .. }
                | Self::GenerationRegression { .. }
                | Self::SignatureMismatch { .. }
                | Self::SinkFailure { .. }
        )
    }

    /// Whether this is an expected planning failure, carrying a message the
    /// client can act on.
    pub const fn is_planning(&self) -> bool {
        matches!(
            self,
            Self::EmptySql
                | Self::Planning { .. }
                | Self::TooManyParameters { .. }
                | Self::WrongParameterCount { .. }
        )
    }

    /// Create a planning error.
    pub fn planning(detail: impl Into<String>) -> Self {
        Self::Planning {
            detail: detail.into(),
        }
    }

    /// Create an internal compile error.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
        }
    }

    /// Create a sink failure.
    pub fn sink(detail: impl Into<String>) -> Self {
        Self::SinkFailure {
            detail: detail.into(),
        }
    }
}

/// Result type alias using `EstuaryError`.
pub type Result<T> = std::result::Result<T, EstuaryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = EstuaryError::TxnRegression {
            open: 101,
            incoming: 100,
        };
        assert_eq!(
            err.to_string(),
            "active transactions moving backwards: open txn#101, incoming txn#100"
        );

        let err = EstuaryError::TruncatingFuture { mark: 10, uso: 5 };
        assert_eq!(
            err.to_string(),
            "truncating the future: mark 10 is past the stream tail 5"
        );
    }

    #[test]
    fn fatal_classification() {
        assert!(EstuaryError::CapacityLocked.is_fatal());
        assert!(EstuaryError::sink("closed").is_fatal());
        assert!(EstuaryError::OversizeRow {
            required: 100,
            capacity: 64
        }
        .is_fatal());
        assert!(!EstuaryError::EmptySql.is_fatal());
        assert!(!EstuaryError::planning("no such table: t").is_fatal());
        assert!(!EstuaryError::internal("optimizer bug").is_fatal());
    }

    #[test]
    fn planning_classification() {
        assert!(EstuaryError::EmptySql.is_planning());
        assert!(EstuaryError::WrongParameterCount {
            expected: 2,
            passed: 0
        }
        .is_planning());
        // Internal errors are surfaced like planning errors but are not
        // "expected", so they get logged.
        assert!(!EstuaryError::internal("x").is_planning());
        assert!(!EstuaryError::CapacityLocked.is_planning());
    }

    #[test]
    fn internal_display_carries_log_hint() {
        let err = EstuaryError::internal("index out of bounds");
        assert_eq!(
            err.to_string(),
            "SQL error while compiling query: index out of bounds (stack trace has been written to the log)"
        );
    }
}
