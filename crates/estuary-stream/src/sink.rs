//! The "top end" consumer seam.

use estuary_error::Result;
use estuary_types::{GenerationId, PartitionId, StreamOffset};

/// A committed block payload handed to the sink.
///
/// The sink takes ownership of the bytes; the stream keeps nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    /// Stream offset of the payload's first byte.
    pub base_uso: StreamOffset,
    pub bytes: Vec<u8>,
}

/// External consumer of committed export blocks.
///
/// Called from the stream's writer thread. The implementation may block on
/// backpressure — this is the only place the writer is allowed to wait. An
/// error return is unrecoverable for the stream.
pub trait ExportSink {
    /// Accept a committed block, or a pure end-of-stream marker when
    /// `payload` is `None` and `end_of_stream` is set.
    ///
    /// The `sync` bit is carried through from `commit` but currently has
    /// no effect downstream.
    fn push_export_buffer(
        &mut self,
        generation_id: GenerationId,
        partition_id: PartitionId,
        signature: &str,
        payload: Option<ExportPayload>,
        sync: bool,
        end_of_stream: bool,
    ) -> Result<()>;
}

/// One recorded `push_export_buffer` call.
#[derive(Debug, Clone, PartialEq)]
pub struct PushedBuffer {
    pub generation_id: GenerationId,
    pub partition_id: PartitionId,
    pub signature: String,
    pub payload: Option<ExportPayload>,
    pub sync: bool,
    pub end_of_stream: bool,
}

/// Sink that records every push, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pushes: Vec<PushedBuffer>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pushes(&self) -> &[PushedBuffer] {
        &self.pushes
    }

    pub fn take_pushes(&mut self) -> Vec<PushedBuffer> {
        std::mem::take(&mut self.pushes)
    }
}

impl ExportSink for RecordingSink {
    fn push_export_buffer(
        &mut self,
        generation_id: GenerationId,
        partition_id: PartitionId,
        signature: &str,
        payload: Option<ExportPayload>,
        sync: bool,
        end_of_stream: bool,
    ) -> Result<()> {
        self.pushes.push(PushedBuffer {
            generation_id,
            partition_id,
            signature: signature.to_owned(),
            payload,
            sync,
            end_of_stream,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_captures_pushes() {
        let mut sink = RecordingSink::new();
        sink.push_export_buffer(
            GenerationId::new(1),
            PartitionId::new(0),
            "sig",
            None,
            false,
            true,
        )
        .unwrap();
        assert_eq!(sink.pushes().len(), 1);
        assert!(sink.pushes()[0].end_of_stream);
        assert!(sink.pushes()[0].payload.is_none());
        assert_eq!(sink.take_pushes().len(), 1);
        assert!(sink.pushes().is_empty());
    }
}
