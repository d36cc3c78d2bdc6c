//! The buffer-chain manager: one export stream per partition.

use std::collections::VecDeque;

use estuary_error::{EstuaryError, Result};
use estuary_types::{ColumnValue, GenerationId, PartitionId, SiteId, StreamOffset, TxnId};

use crate::block::StreamBlock;
use crate::codec::{self, OpType, RowMetadata};
use crate::sink::{ExportPayload, ExportSink};
use crate::{DEFAULT_BLOCK_CAPACITY, MAX_BUFFER_AGE_MS};

/// Per-partition transactional export stream.
///
/// Owns one in-progress block plus a FIFO of blocks awaiting commit and
/// handoff. The universal stream offset (`uso`) counts every byte ever
/// appended; `committed_uso` marks the durable-committable prefix. A
/// single writer thread drives all operations.
pub struct ExportStream<S: ExportSink> {
    partition_id: PartitionId,
    site_id: SiteId,
    sink: S,

    uso: StreamOffset,
    current_block: Option<StreamBlock>,
    pending: VecDeque<StreamBlock>,

    open_txn_id: TxnId,
    open_txn_uso: StreamOffset,
    committed_txn_id: TxnId,
    committed_uso: StreamOffset,

    generation: GenerationId,
    prev_block_generation: GenerationId,
    signature: String,

    last_flush_millis: i64,
    default_capacity: usize,
}

impl<S: ExportSink> ExportStream<S> {
    /// Create a stream with an initial empty block of the default capacity.
    pub fn new(partition_id: PartitionId, site_id: SiteId, sink: S) -> Self {
        let mut stream = Self {
            partition_id,
            site_id,
            sink,
            uso: StreamOffset::ZERO,
            current_block: None,
            pending: VecDeque::new(),
            open_txn_id: TxnId::ZERO,
            open_txn_uso: StreamOffset::ZERO,
            committed_txn_id: TxnId::ZERO,
            committed_uso: StreamOffset::ZERO,
            generation: GenerationId::SENTINEL,
            prev_block_generation: GenerationId::SENTINEL,
            signature: String::new(),
            last_flush_millis: 0,
            default_capacity: DEFAULT_BLOCK_CAPACITY,
        };
        stream.current_block = Some(stream.allocate_block());
        stream
    }

    /// Change the capacity used for newly allocated blocks.
    ///
    /// Only valid before any bytes were appended or any transaction has
    /// opened; the existing managed buffers are discarded and replaced.
    pub fn set_default_capacity(&mut self, capacity: usize) -> Result<()> {
        if capacity == 0 {
            return Err(EstuaryError::InvalidCapacity { capacity });
        }
        if self.uso != StreamOffset::ZERO
            || self.open_txn_id != TxnId::ZERO
            || self.open_txn_uso != StreamOffset::ZERO
            || self.committed_txn_id != TxnId::ZERO
        {
            return Err(EstuaryError::CapacityLocked);
        }
        self.cleanup_managed_buffers();
        self.default_capacity = capacity;
        self.current_block = Some(self.allocate_block());
        Ok(())
    }

    /// Install the stream's signature and advance its schema generation.
    ///
    /// `generation` must be strictly greater than the current one and the
    /// signature is fixed once assigned. On a non-initial generation change
    /// the stream force-commits at the new generation, force-extends the
    /// chain and drains, so the closing epoch's blocks reach the sink
    /// before any new-epoch bytes.
    pub fn set_signature_and_generation(
        &mut self,
        signature: &str,
        generation: GenerationId,
    ) -> Result<()> {
        if generation <= self.generation {
            return Err(EstuaryError::GenerationRegression {
                current: self.generation.get(),
                requested: generation.get(),
            });
        }
        if !self.signature.is_empty() && signature != self.signature {
            return Err(EstuaryError::SignatureMismatch {
                current: self.signature.clone(),
                requested: signature.to_owned(),
            });
        }

        if !self.generation.is_sentinel() {
            // The generation id is the catalog transaction that produced
            // it, so committing at it closes everything written before.
            let txn = TxnId::new(generation.get());
            self.commit(txn, txn, false)?;
            self.extend_buffer_chain(0)?;
            self.drain_pending_blocks()?;
        }
        self.signature.clear();
        self.signature.push_str(signature);
        self.generation = generation;
        Ok(())
    }

    /// Serialize one row into the stream.
    ///
    /// If `txn_id` opens a new transaction, previously open data is
    /// committed first. Returns the pre-append offset: the mark a caller
    /// hands to [`rollback_to`](Self::rollback_to) to undo this append.
    #[allow(clippy::too_many_arguments)]
    pub fn append_tuple(
        &mut self,
        last_committed_txn_id: TxnId,
        txn_id: TxnId,
        seq_no: i64,
        timestamp: i64,
        generation_id: GenerationId,
        tuple: &[ColumnValue],
        op_type: OpType,
    ) -> Result<StreamOffset> {
        if txn_id < self.open_txn_id {
            return Err(EstuaryError::TxnRegression {
                open: self.open_txn_id.get(),
                incoming: txn_id.get(),
            });
        }

        self.commit(last_committed_txn_id, txn_id, false)?;

        let max_length = codec::max_row_size(tuple);

        if generation_id > self.generation {
            // Generation fence: no block ever mixes rows from two epochs.
            self.generation = generation_id;
            self.extend_buffer_chain(self.default_capacity)?;
        }

        let needs_new_block = match &self.current_block {
            Some(block) => max_length > block.remaining(),
            None => true,
        };
        if needs_new_block {
            self.extend_buffer_chain(max_length)?;
        }

        self.drain_pending_blocks()?;

        let partition_id = self.partition_id;
        let site_id = self.site_id;
        let generation = self.generation;
        let signature = &self.signature;
        let block = self
            .current_block
            .as_mut()
            .ok_or_else(|| EstuaryError::internal("no current block after chain extension"))?;

        // First row in the block stamps the epoch it belongs to.
        if block.offset() == 0 {
            block.set_generation_id(generation);
            block.set_signature(signature);
        }

        let meta = RowMetadata {
            txn_id,
            timestamp,
            seq_no,
            partition_id,
            site_id,
            op_type,
        };
        let written = codec::encode_row(block.mutable_tail(), &meta, tuple).ok_or(
            EstuaryError::BlockOverflow {
                requested: max_length,
                remaining: block.remaining(),
            },
        )?;
        block.consumed(written)?;

        let starting_uso = self.uso;
        self.uso = self.uso.advanced(written as u64);
        Ok(starting_uso)
    }

    /// Advance the open/committed transaction boundaries.
    ///
    /// This is the only writer of `open_txn_id`, `open_txn_uso`,
    /// `committed_txn_id` and `committed_uso`. The `sync` bit is carried
    /// on the interface but currently has no effect downstream.
    pub fn commit(
        &mut self,
        last_committed_txn_id: TxnId,
        current_txn_id: TxnId,
        _sync: bool,
    ) -> Result<()> {
        if current_txn_id < self.open_txn_id {
            return Err(EstuaryError::TxnRegression {
                open: self.open_txn_id.get(),
                incoming: current_txn_id.get(),
            });
        }

        // More data for the ongoing transaction with no new committed data.
        if current_txn_id == self.open_txn_id && last_committed_txn_id == self.committed_txn_id {
            return Ok(());
        }

        // The current txn id advanced: the old open transaction has closed
        // and the current transaction now owns the tail.
        if self.open_txn_id < current_txn_id {
            self.committed_uso = self.uso;
            self.committed_txn_id = self.open_txn_id;
            self.open_txn_id = current_txn_id;
            self.open_txn_uso = self.uso;
        }

        // The now-open transaction may itself already be committed.
        if self.open_txn_id <= last_committed_txn_id {
            self.committed_uso = self.uso;
            self.committed_txn_id = self.open_txn_id;
        }
        Ok(())
    }

    /// Discard all bytes with offset at or past `mark`.
    ///
    /// The caller is responsible for only rolling back uncommitted bytes;
    /// commit state and the generation are left untouched.
    pub fn rollback_to(&mut self, mark: StreamOffset) -> Result<()> {
        if mark > self.uso {
            return Err(EstuaryError::TruncatingFuture {
                mark: mark.get(),
                uso: self.uso.get(),
            });
        }

        self.uso = mark;

        // Fast path: the mark falls inside the current block.
        if let Some(block) = self.current_block.as_mut() {
            if block.base_uso() < mark {
                return block.truncate_to(mark);
            }
        }

        // Otherwise walk newest to oldest: discard blocks fully past the
        // mark, truncate the one containing it and make it current again.
        self.current_block = None;
        while let Some(mut block) = self.pending.pop_back() {
            if block.base_uso() >= mark {
                continue;
            }
            block.truncate_to(mark)?;
            self.current_block = Some(block);
            break;
        }
        Ok(())
    }

    /// Create a new head block and push out all pending committed data.
    ///
    /// A negative `now_ms` forces a mandatory flush; otherwise the stream
    /// only flushes when the head block is older than
    /// [`MAX_BUFFER_AGE_MS`](crate::MAX_BUFFER_AGE_MS).
    pub fn periodic_flush(
        &mut self,
        now_ms: i64,
        last_committed_txn_id: TxnId,
        current_txn_id: TxnId,
    ) -> Result<()> {
        if now_ms >= 0 && now_ms - self.last_flush_millis <= MAX_BUFFER_AGE_MS {
            return Ok(());
        }
        if now_ms >= 0 {
            self.last_flush_millis = now_ms;
        }

        // The engine is not guaranteed to present transaction ids in order
        // across streams; whichever of the open or the handed-in id is
        // larger keeps commit's monotone precondition intact.
        let effective_txn_id = if self.open_txn_id > current_txn_id {
            self.open_txn_id
        } else {
            current_txn_id
        };

        self.extend_buffer_chain(0)?;
        self.commit(last_committed_txn_id, effective_txn_id, now_ms < 0)?;
        self.drain_pending_blocks()
    }

    /// Discard the current block and the whole pending queue. Shutdown.
    pub fn cleanup_managed_buffers(&mut self) {
        self.current_block = None;
        self.pending.clear();
    }

    fn allocate_block(&self) -> StreamBlock {
        let mut block = StreamBlock::new(self.default_capacity, self.uso);
        block.set_generation_id(self.generation);
        block.set_signature(&self.signature);
        block
    }

    /// Preserve the current block in the pending queue and start a fresh
    /// one of the default capacity at the stream tail.
    fn extend_buffer_chain(&mut self, min_length: usize) -> Result<()> {
        if self.default_capacity < min_length {
            return Err(EstuaryError::OversizeRow {
                required: min_length,
                capacity: self.default_capacity,
            });
        }
        if let Some(block) = self.current_block.take() {
            self.pending.push_back(block);
        }
        self.current_block = Some(self.allocate_block());
        Ok(())
    }

    /// Hand fully committed pending blocks to the sink, front to back,
    /// injecting an end-of-stream marker wherever the generation changes
    /// at the sink's input.
    fn drain_pending_blocks(&mut self) -> Result<()> {
        loop {
            let (generation_id, base_uso, tail_uso) = match self.pending.front() {
                Some(block) => (block.generation_id(), block.base_uso(), block.tail_uso()),
                None => break,
            };

            if generation_id > self.prev_block_generation && !self.prev_block_generation.is_sentinel()
            {
                let eos =
                    StreamBlock::eos_marker(base_uso, self.prev_block_generation, &self.signature);
                self.push_export_block(eos)?;
            }
            self.prev_block_generation = generation_id;

            // Only hand the block off once its entire remainder committed.
            if self.committed_uso >= tail_uso {
                if let Some(block) = self.pending.pop_front() {
                    self.push_export_block(block)?;
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    /// Transfer a block's payload to the sink.
    ///
    /// Empty blocks are only pushed when they carry the end-of-stream
    /// marker, and then with no payload at all.
    fn push_export_block(&mut self, block: StreamBlock) -> Result<()> {
        if block.offset() > 0 {
            tracing::debug!(
                target: "estuary.stream",
                generation = block.generation_id().get(),
                base_uso = block.base_uso().get(),
                offset = block.offset(),
                end_of_stream = block.end_of_stream(),
                "pushing export block"
            );
            let generation_id = block.generation_id();
            let end_of_stream = block.end_of_stream();
            let signature = block.signature().to_owned();
            let payload = ExportPayload {
                base_uso: block.base_uso(),
                bytes: block.into_payload(),
            };
            self.sink.push_export_buffer(
                generation_id,
                self.partition_id,
                &signature,
                Some(payload),
                false,
                end_of_stream,
            )
        } else if block.end_of_stream() {
            tracing::debug!(
                target: "estuary.stream",
                generation = block.generation_id().get(),
                base_uso = block.base_uso().get(),
                "pushing end-of-stream marker"
            );
            self.sink.push_export_buffer(
                block.generation_id(),
                self.partition_id,
                block.signature(),
                None,
                false,
                true,
            )
        } else {
            Ok(())
        }
    }

    #[inline]
    pub const fn partition_id(&self) -> PartitionId {
        self.partition_id
    }

    #[inline]
    pub const fn site_id(&self) -> SiteId {
        self.site_id
    }

    #[inline]
    pub const fn uso(&self) -> StreamOffset {
        self.uso
    }

    #[inline]
    pub const fn committed_uso(&self) -> StreamOffset {
        self.committed_uso
    }

    #[inline]
    pub const fn open_txn_id(&self) -> TxnId {
        self.open_txn_id
    }

    #[inline]
    pub const fn committed_txn_id(&self) -> TxnId {
        self.committed_txn_id
    }

    #[inline]
    pub const fn generation(&self) -> GenerationId {
        self.generation
    }

    #[inline]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The block currently receiving writes, for inspection.
    pub fn current_block(&self) -> Option<&StreamBlock> {
        self.current_block.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;

    fn stream_with_capacity(capacity: usize) -> ExportStream<RecordingSink> {
        let mut stream = ExportStream::new(PartitionId::new(7), SiteId::new(1), RecordingSink::new());
        stream.set_default_capacity(capacity).unwrap();
        stream
    }

    fn append_bigint(
        stream: &mut ExportStream<RecordingSink>,
        txn: i64,
        value: i64,
    ) -> StreamOffset {
        stream
            .append_tuple(
                TxnId::ZERO,
                TxnId::new(txn),
                value,
                1_000,
                GenerationId::new(1),
                &[ColumnValue::BigInt(value)],
                OpType::Insert,
            )
            .unwrap()
    }

    // One bigint row: 4 + 1 (bitmap) + 48 (metadata) + 8 = 61 bytes.
    const BIGINT_ROW: u64 = 61;

    #[test]
    fn append_returns_pre_append_uso() {
        let mut stream = stream_with_capacity(4096);
        let mark_a = append_bigint(&mut stream, 1, 10);
        let mark_b = append_bigint(&mut stream, 1, 11);
        assert_eq!(mark_a, StreamOffset::ZERO);
        assert_eq!(mark_b, StreamOffset::new(BIGINT_ROW));
        assert_eq!(stream.uso(), StreamOffset::new(2 * BIGINT_ROW));
    }

    #[test]
    fn txn_ids_must_not_regress() {
        let mut stream = stream_with_capacity(4096);
        append_bigint(&mut stream, 5, 1);
        let err = stream
            .append_tuple(
                TxnId::ZERO,
                TxnId::new(4),
                0,
                0,
                GenerationId::new(1),
                &[ColumnValue::BigInt(1)],
                OpType::Insert,
            )
            .unwrap_err();
        assert!(matches!(err, EstuaryError::TxnRegression { .. }));
    }

    #[test]
    fn commit_tracks_open_and_committed() {
        let mut stream = stream_with_capacity(4096);
        append_bigint(&mut stream, 1, 10);
        assert_eq!(stream.open_txn_id(), TxnId::new(1));
        assert_eq!(stream.committed_uso(), StreamOffset::ZERO);

        // Txn 2 opening tells the stream txn 1 closed.
        stream.commit(TxnId::new(1), TxnId::new(2), false).unwrap();
        assert_eq!(stream.committed_txn_id(), TxnId::new(1));
        assert_eq!(stream.committed_uso(), StreamOffset::new(BIGINT_ROW));
        assert_eq!(stream.open_txn_id(), TxnId::new(2));
    }

    #[test]
    fn commit_no_op_keeps_state() {
        let mut stream = stream_with_capacity(4096);
        append_bigint(&mut stream, 1, 10);
        let committed = stream.committed_uso();
        stream.commit(TxnId::ZERO, TxnId::new(1), false).unwrap();
        assert_eq!(stream.committed_uso(), committed);
    }

    #[test]
    fn commit_last_committed_covers_open_txn() {
        let mut stream = stream_with_capacity(4096);
        append_bigint(&mut stream, 3, 10);
        stream.commit(TxnId::new(3), TxnId::new(3), false).unwrap();
        assert_eq!(stream.committed_txn_id(), TxnId::new(3));
        assert_eq!(stream.committed_uso(), stream.uso());
    }

    #[test]
    fn rollback_inside_current_block() {
        let mut stream = stream_with_capacity(4096);
        append_bigint(&mut stream, 1, 10);
        let mark = append_bigint(&mut stream, 1, 11);
        stream.rollback_to(mark).unwrap();
        assert_eq!(stream.uso(), mark);
        let block = stream.current_block().unwrap();
        assert_eq!(block.offset() as u64, BIGINT_ROW);

        // The next append lands exactly at the mark.
        let mark_c = append_bigint(&mut stream, 1, 12);
        assert_eq!(mark_c, mark);
    }

    #[test]
    fn rollback_across_blocks() {
        let mut stream = stream_with_capacity(64);
        let m0 = append_bigint(&mut stream, 1, 10);
        let m1 = append_bigint(&mut stream, 1, 11);
        append_bigint(&mut stream, 1, 12);
        assert_eq!(stream.pending_len(), 2);

        stream.rollback_to(m1).unwrap();
        assert_eq!(stream.uso(), m1);
        assert_eq!(stream.pending_len(), 0);
        let block = stream.current_block().unwrap();
        assert_eq!(block.base_uso(), m0);
        assert_eq!(block.tail_uso(), m1);
    }

    #[test]
    fn rollback_to_zero_discards_everything() {
        let mut stream = stream_with_capacity(64);
        append_bigint(&mut stream, 1, 10);
        append_bigint(&mut stream, 1, 11);
        stream.rollback_to(StreamOffset::ZERO).unwrap();
        assert_eq!(stream.uso(), StreamOffset::ZERO);
        assert!(stream.current_block().is_none());

        // The stream recovers by allocating a fresh block on demand.
        let mark = append_bigint(&mut stream, 1, 12);
        assert_eq!(mark, StreamOffset::ZERO);
    }

    #[test]
    fn rollback_cannot_truncate_the_future() {
        let mut stream = stream_with_capacity(4096);
        append_bigint(&mut stream, 1, 10);
        let err = stream
            .rollback_to(StreamOffset::new(BIGINT_ROW + 1))
            .unwrap_err();
        assert!(matches!(err, EstuaryError::TruncatingFuture { .. }));
        assert_eq!(stream.uso(), StreamOffset::new(BIGINT_ROW));
    }

    #[test]
    fn rollback_replay_is_byte_identical() {
        let mut stream = stream_with_capacity(4096);
        append_bigint(&mut stream, 1, 10);
        let mark = append_bigint(&mut stream, 1, 11);
        append_bigint(&mut stream, 1, 12);
        let before = stream.current_block().unwrap().data().to_vec();

        stream.rollback_to(mark).unwrap();
        let replay_mark = append_bigint(&mut stream, 1, 11);
        append_bigint(&mut stream, 1, 12);

        assert_eq!(replay_mark, mark);
        assert_eq!(stream.current_block().unwrap().data(), &before[..]);
    }

    #[test]
    fn oversize_row_is_fatal_and_leaves_state() {
        let mut stream = stream_with_capacity(64);
        append_bigint(&mut stream, 1, 10);
        let uso_before = stream.uso();
        let offset_before = stream.current_block().unwrap().offset();

        let big = vec![ColumnValue::Binary(vec![0; 128])];
        let err = stream
            .append_tuple(
                TxnId::ZERO,
                TxnId::new(1),
                0,
                0,
                GenerationId::new(1),
                &big,
                OpType::Insert,
            )
            .unwrap_err();
        assert!(matches!(err, EstuaryError::OversizeRow { .. }));
        assert!(err.is_fatal());
        assert_eq!(stream.uso(), uso_before);
        assert_eq!(stream.pending_len(), 0);
        assert_eq!(stream.current_block().unwrap().offset(), offset_before);
    }

    #[test]
    fn capacity_locked_after_first_use() {
        let mut stream = stream_with_capacity(4096);
        append_bigint(&mut stream, 1, 10);
        let err = stream.set_default_capacity(1024).unwrap_err();
        assert!(matches!(err, EstuaryError::CapacityLocked));
    }

    #[test]
    fn capacity_zero_rejected() {
        let mut stream =
            ExportStream::new(PartitionId::new(0), SiteId::new(0), RecordingSink::new());
        assert!(matches!(
            stream.set_default_capacity(0),
            Err(EstuaryError::InvalidCapacity { .. })
        ));
    }

    #[test]
    fn periodic_flush_respects_buffer_age() {
        let mut stream = stream_with_capacity(4096);
        append_bigint(&mut stream, 1, 10);
        stream.commit(TxnId::new(1), TxnId::new(2), false).unwrap();

        // Young buffer: nothing pushed.
        stream
            .periodic_flush(MAX_BUFFER_AGE_MS, TxnId::new(1), TxnId::new(2))
            .unwrap();
        assert!(stream.sink().pushes().is_empty());

        // Old enough: the block reaches the sink.
        stream
            .periodic_flush(3 * MAX_BUFFER_AGE_MS, TxnId::new(1), TxnId::new(2))
            .unwrap();
        assert_eq!(stream.sink().pushes().len(), 1);
    }

    #[test]
    fn mandatory_flush_ignores_age() {
        let mut stream = stream_with_capacity(4096);
        append_bigint(&mut stream, 1, 10);
        stream.periodic_flush(-1, TxnId::new(1), TxnId::new(2)).unwrap();
        assert_eq!(stream.sink().pushes().len(), 1);
        assert_eq!(stream.uso(), StreamOffset::new(BIGINT_ROW));
        assert_eq!(stream.pending_len(), 0);
    }

    #[test]
    fn flush_tolerates_stale_txn_ids() {
        let mut stream = stream_with_capacity(4096);
        append_bigint(&mut stream, 10, 1);
        // A stale id from another stream must not trip the monotone check.
        stream.periodic_flush(-1, TxnId::new(10), TxnId::new(3)).unwrap();
        assert_eq!(stream.open_txn_id(), TxnId::new(10));
        assert_eq!(stream.sink().pushes().len(), 1);
    }

    #[test]
    fn generation_change_requires_increase() {
        let mut stream = stream_with_capacity(4096);
        stream
            .set_signature_and_generation("sig", GenerationId::new(5))
            .unwrap();
        let err = stream
            .set_signature_and_generation("sig", GenerationId::new(5))
            .unwrap_err();
        assert!(matches!(err, EstuaryError::GenerationRegression { .. }));
    }

    #[test]
    fn signature_is_fixed_once_assigned() {
        let mut stream = stream_with_capacity(4096);
        stream
            .set_signature_and_generation("sig", GenerationId::new(5))
            .unwrap();
        let err = stream
            .set_signature_and_generation("other", GenerationId::new(6))
            .unwrap_err();
        assert!(matches!(err, EstuaryError::SignatureMismatch { .. }));
    }

    #[test]
    fn blocks_never_mix_generations() {
        let mut stream = stream_with_capacity(4096);
        stream
            .append_tuple(
                TxnId::ZERO,
                TxnId::new(1),
                0,
                0,
                GenerationId::new(5),
                &[ColumnValue::BigInt(1)],
                OpType::Insert,
            )
            .unwrap();
        // A higher generation forces a fresh block even with room to spare.
        stream
            .append_tuple(
                TxnId::ZERO,
                TxnId::new(1),
                1,
                0,
                GenerationId::new(6),
                &[ColumnValue::BigInt(2)],
                OpType::Insert,
            )
            .unwrap();
        assert_eq!(stream.pending_len(), 1);
        assert_eq!(stream.generation(), GenerationId::new(6));
        let head = stream.current_block().unwrap();
        assert_eq!(head.generation_id(), GenerationId::new(6));
        assert_eq!(head.offset() as u64, BIGINT_ROW);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Replaying the exact appends after a rollback reproduces the
            // same marks and the same block content.
            #[test]
            fn prop_rollback_replay(
                values in prop::collection::vec(any::<i64>(), 2..12),
                cut in 1usize..11,
            ) {
                prop_assume!(cut < values.len());

                let mut stream = stream_with_capacity(8192);
                let mut marks = Vec::new();
                for (i, v) in values.iter().enumerate() {
                    marks.push(append_bigint(&mut stream, 1, *v));
                    prop_assert_eq!(marks[i], StreamOffset::new(i as u64 * BIGINT_ROW));
                }
                let full = stream.current_block().unwrap().data().to_vec();

                stream.rollback_to(marks[cut]).unwrap();
                prop_assert_eq!(stream.uso(), marks[cut]);

                for (i, v) in values.iter().enumerate().skip(cut) {
                    let mark = append_bigint(&mut stream, 1, *v);
                    prop_assert_eq!(mark, marks[i]);
                }
                prop_assert_eq!(stream.current_block().unwrap().data(), &full[..]);
            }
        }
    }
}
