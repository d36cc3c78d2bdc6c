//! A single fixed-capacity buffer in the export chain.

use estuary_error::{EstuaryError, Result};
use estuary_types::{GenerationId, StreamOffset};

/// One contiguous byte buffer owned by the stream.
///
/// A block is born at the stream tail, fills up through
/// [`mutable_tail`](Self::mutable_tail) / [`consumed`](Self::consumed),
/// ages through the pending queue, and dies when the sink accepts its
/// payload or rollback discards it. The owning stream serializes all
/// access; there is no internal locking.
#[derive(Debug)]
pub struct StreamBlock {
    buf: Vec<u8>,
    offset: usize,
    base_uso: StreamOffset,
    generation_id: GenerationId,
    signature: String,
    end_of_stream: bool,
}

impl StreamBlock {
    /// Allocate an empty block whose first byte owns `base_uso`.
    pub fn new(capacity: usize, base_uso: StreamOffset) -> Self {
        Self {
            buf: vec![0; capacity],
            offset: 0,
            base_uso,
            generation_id: GenerationId::SENTINEL,
            signature: String::new(),
            end_of_stream: false,
        }
    }

    /// Build a zero-length end-of-stream marker for a closing generation.
    pub fn eos_marker(base_uso: StreamOffset, generation_id: GenerationId, signature: &str) -> Self {
        Self {
            buf: Vec::new(),
            offset: 0,
            base_uso,
            generation_id,
            signature: signature.to_owned(),
            end_of_stream: true,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes written so far.
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub const fn base_uso(&self) -> StreamOffset {
        self.base_uso
    }

    /// The stream offset one past this block's last written byte.
    #[inline]
    pub const fn tail_uso(&self) -> StreamOffset {
        self.base_uso.advanced(self.offset as u64)
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    #[inline]
    pub const fn generation_id(&self) -> GenerationId {
        self.generation_id
    }

    pub fn set_generation_id(&mut self, generation_id: GenerationId) {
        self.generation_id = generation_id;
    }

    #[inline]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn set_signature(&mut self, signature: &str) {
        self.signature.clear();
        self.signature.push_str(signature);
    }

    #[inline]
    pub const fn end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    /// The writable tail of the buffer.
    pub fn mutable_tail(&mut self) -> &mut [u8] {
        &mut self.buf[self.offset..]
    }

    /// Advance the write offset after `n` bytes were written to the tail.
    pub fn consumed(&mut self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(EstuaryError::BlockOverflow {
                requested: n,
                remaining: self.remaining(),
            });
        }
        self.offset += n;
        Ok(())
    }

    /// Drop every byte at or past `mark`, which must fall inside this
    /// block's written range.
    pub fn truncate_to(&mut self, mark: StreamOffset) -> Result<()> {
        if mark < self.base_uso || mark > self.tail_uso() {
            return Err(EstuaryError::TruncateOutOfRange {
                mark: mark.get(),
                base: self.base_uso.get(),
                tail: self.tail_uso().get(),
            });
        }
        self.offset = (mark.get() - self.base_uso.get()) as usize;
        Ok(())
    }

    /// Written bytes, for inspection.
    pub fn data(&self) -> &[u8] {
        &self.buf[..self.offset]
    }

    /// Surrender the written payload, consuming the block.
    ///
    /// The sink owns the returned bytes; the metadata wrapper dies here.
    pub fn into_payload(mut self) -> Vec<u8> {
        self.buf.truncate(self.offset);
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_and_consume() {
        let mut b = StreamBlock::new(16, StreamOffset::new(100));
        assert_eq!(b.remaining(), 16);
        b.mutable_tail()[..4].copy_from_slice(&[1, 2, 3, 4]);
        b.consumed(4).unwrap();
        assert_eq!(b.offset(), 4);
        assert_eq!(b.remaining(), 12);
        assert_eq!(b.tail_uso(), StreamOffset::new(104));
        assert_eq!(b.data(), &[1, 2, 3, 4]);
    }

    #[test]
    fn consume_past_capacity_fails() {
        let mut b = StreamBlock::new(4, StreamOffset::ZERO);
        let err = b.consumed(5).unwrap_err();
        assert!(matches!(err, EstuaryError::BlockOverflow { .. }));
        assert_eq!(b.offset(), 0);
    }

    #[test]
    fn truncate_inside_range() {
        let mut b = StreamBlock::new(16, StreamOffset::new(100));
        b.consumed(10).unwrap();
        b.truncate_to(StreamOffset::new(104)).unwrap();
        assert_eq!(b.offset(), 4);
        assert_eq!(b.tail_uso(), StreamOffset::new(104));
        // Truncating to the tail itself is a no-op.
        b.truncate_to(StreamOffset::new(104)).unwrap();
        assert_eq!(b.offset(), 4);
    }

    #[test]
    fn truncate_outside_range_fails() {
        let mut b = StreamBlock::new(16, StreamOffset::new(100));
        b.consumed(10).unwrap();
        assert!(b.truncate_to(StreamOffset::new(99)).is_err());
        assert!(b.truncate_to(StreamOffset::new(111)).is_err());
        assert_eq!(b.offset(), 10);
    }

    #[test]
    fn payload_is_written_prefix() {
        let mut b = StreamBlock::new(8, StreamOffset::ZERO);
        b.mutable_tail()[..3].copy_from_slice(b"abc");
        b.consumed(3).unwrap();
        assert_eq!(b.into_payload(), b"abc".to_vec());
    }

    #[test]
    fn eos_marker_shape() {
        let b = StreamBlock::eos_marker(StreamOffset::new(50), GenerationId::new(4), "sig");
        assert_eq!(b.offset(), 0);
        assert_eq!(b.capacity(), 0);
        assert!(b.end_of_stream());
        assert_eq!(b.generation_id(), GenerationId::new(4));
        assert_eq!(b.signature(), "sig");
    }
}
