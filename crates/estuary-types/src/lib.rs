//! Core identifier and value types shared across the Estuary export engine.
//!
//! Everything here is `Copy`-friendly plumbing: newtype identifiers for
//! transactions, stream offsets, schema generations and topology ids, plus
//! the dynamically-typed column values that cross the export wire format.

pub mod encoding;
pub mod value;

pub use value::{ColumnType, ColumnValue};

use std::fmt;

/// Transaction identifier as presented by the execution engine.
///
/// A freshly created stream considers transaction 0 open; real transaction
/// ids handed in by the engine are positive and must never move backwards
/// within one stream.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct TxnId(i64);

impl TxnId {
    /// The id a stream starts out with before any transaction touched it.
    pub const ZERO: Self = Self(0);

    #[inline]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Get the raw i64 value.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn#{}", self.0)
    }
}

/// Universal stream offset: a per-stream byte counter that never resets.
///
/// Every byte ever appended to a stream owns exactly one offset. Rollback
/// may move the tail backwards, but only to an offset previously returned
/// by an append.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct StreamOffset(u64);

impl StreamOffset {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw u64 value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The offset `n` bytes past this one.
    #[inline]
    pub const fn advanced(self, n: u64) -> Self {
        Self(self.0 + n)
    }
}

impl fmt::Display for StreamOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uso:{}", self.0)
    }
}

/// Schema generation (epoch), advanced by the catalog on DDL.
///
/// The minimum i64 is reserved as the "uninitialized" sentinel; a stream
/// that has never seen a real generation reports the sentinel and
/// suppresses end-of-stream injection for it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct GenerationId(i64);

impl GenerationId {
    /// Sentinel for "no generation observed yet".
    pub const SENTINEL: Self = Self(i64::MIN);

    #[inline]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Get the raw i64 value.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_sentinel(self) -> bool {
        self.0 == i64::MIN
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sentinel() {
            f.write_str("gen:uninitialized")
        } else {
            write!(f, "gen:{}", self.0)
        }
    }
}

/// Partition identifier, fixed for the lifetime of a stream.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct PartitionId(i32);

impl PartitionId {
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Get the raw i32 value.
    #[inline]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Site identifier of the execution site that owns the stream's partition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct SiteId(i32);

impl SiteId {
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Get the raw i32 value.
    #[inline]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}
