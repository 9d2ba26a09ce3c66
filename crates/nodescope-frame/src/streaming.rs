use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::aggregate::Aggregate;
use crate::checksum;
use crate::cursor::{frame_bounds, HEADER_SIZE};
use crate::error::{FrameError, Result};
use crate::message::{deserialize_payload, MessageSchema};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Incremental decoder over a growing byte stream.
///
/// Bytes are appended with [`feed`](Self::feed); every frame that is fully buffered is
/// extracted and the rest waits for the next call. The stream must already be past
/// its version field: the decoder treats the first byte it sees as a frame header.
///
/// Corrupted frames are dropped without a diagnostic. A frame whose header is buffered
/// but whose payload is not is pending, never invalid. One instance serves one stream;
/// it is not meant to be fed from several producers at once.
pub struct StreamingDecoder<S: MessageSchema> {
    schema: S,
    buf: BytesMut,
    consumed: usize,
    frames: usize,
    max_payload: Option<usize>,
    aggregate: Aggregate<S::Runtime, S::State>,
}

impl<S: MessageSchema> StreamingDecoder<S> {
    pub fn new(schema: S) -> Self {
        Self {
            schema,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            consumed: 0,
            frames: 0,
            max_payload: None,
            aggregate: Aggregate::default(),
        }
    }

    /// Reject any frame whose header declares more than `max` payload bytes.
    ///
    /// Checked as soon as a header is buffered, whether or not its payload has arrived.
    pub fn with_max_payload(mut self, max: usize) -> Self {
        self.max_payload = Some(max);
        self
    }

    pub fn max_payload(&self) -> Option<usize> {
        self.max_payload
    }

    /// Append `chunk` and extract every complete frame now buffered.
    ///
    /// If the schema rejects a payload, that frame is already consumed when the error
    /// is returned; frames buffered behind it are extracted on the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(chunk);
        self.extract_frames()
    }

    fn extract_frames(&mut self) -> Result<()> {
        while self.buf.len() >= HEADER_SIZE {
            let bounds = frame_bounds(&self.buf, 0)?;
            if let Some(max) = self.max_payload {
                if bounds.payload_len() > max {
                    return Err(FrameError::PayloadTooLarge {
                        size: bounds.payload_len(),
                        max,
                    });
                }
            }
            if !bounds.is_complete(self.buf.len()) {
                trace!(
                    buffered = self.buf.len(),
                    needed = bounds.payload_end,
                    "waiting for rest of frame"
                );
                break;
            }

            let start = self.consumed + HEADER_SIZE;
            let end = self.consumed + bounds.payload_end;
            self.buf.advance(HEADER_SIZE);
            let payload = self.buf.split_to(bounds.payload_len()).freeze();
            self.consumed = end;
            self.frames += 1;

            if checksum::verify(bounds.checksum, &payload).is_err() {
                trace!(start, end, "dropping corrupted frame");
                continue;
            }

            let message = deserialize_payload(&self.schema, &payload, start, end)?;
            self.aggregate.absorb(message);
        }
        Ok(())
    }

    /// Aggregate built so far.
    pub fn result(&self) -> &Aggregate<S::Runtime, S::State> {
        &self.aggregate
    }

    /// Drain the aggregate built since the previous drain.
    pub fn take(&mut self) -> Aggregate<S::Runtime, S::State> {
        std::mem::take(&mut self.aggregate)
    }

    /// Consume the decoder and return its aggregate.
    pub fn into_result(self) -> Aggregate<S::Runtime, S::State> {
        if !self.buf.is_empty() {
            debug!(leftover = self.buf.len(), "discarding partial trailing frame");
        }
        self.aggregate
    }

    /// Bytes buffered but not yet extracted.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Bytes permanently consumed from the front of the stream.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Frames extracted so far, valid or not.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Declared wire size (header + payload) of the frame waiting at the front, once
    /// its header is buffered.
    pub fn pending_frame_len(&self) -> Option<usize> {
        frame_bounds(&self.buf, 0)
            .ok()
            .map(|bounds| bounds.payload_end)
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }
}

impl<S: MessageSchema> std::fmt::Debug for StreamingDecoder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingDecoder")
            .field("buffered", &self.buf.len())
            .field("consumed", &self.consumed)
            .field("frames", &self.frames)
            .field("max_payload", &self.max_payload)
            .field("states", &self.aggregate.states.len())
            .field("has_runtime", &self.aggregate.runtime.is_some())
            .finish()
    }
}
