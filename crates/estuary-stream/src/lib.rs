//! Per-partition transactional export tuple stream.
//!
//! Row-level change events are serialized into a chain of fixed-capacity
//! [`StreamBlock`]s. The stream tracks which bytes belong to committed
//! versus in-flight transactions through a universal stream offset (USO),
//! supports precise rollback to any previously returned offset, fences
//! blocks across schema generations, and hands fully committed blocks to
//! an [`ExportSink`].
//!
//! A stream has exactly one writer: the owning partition's execution
//! thread. Nothing here locks.

pub mod block;
pub mod codec;
pub mod sink;
pub mod stream;

pub use block::StreamBlock;
pub use codec::{OpType, RowMetadata};
pub use sink::{ExportPayload, ExportSink, PushedBuffer, RecordingSink};
pub use stream::ExportStream;

/// Fixed metadata columns leading every export row.
pub const METADATA_COLUMN_COUNT: usize = 6;

/// A block older than this is flushed by `periodic_flush`.
pub const MAX_BUFFER_AGE_MS: i64 = 4000;

/// Default capacity of newly allocated stream blocks.
pub const DEFAULT_BLOCK_CAPACITY: usize = 2 * 1024 * 1024;
