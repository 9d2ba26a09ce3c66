use std::fmt;

use tracing::{debug, warn};

use crate::aggregate::Aggregate;
use crate::checksum;
use crate::cursor::{frame_bounds, VERSION_SIZE};
use crate::error::{FrameError, Result};
use crate::message::{deserialize_payload, MessageSchema};

/// A non-fatal problem found while decoding a complete capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The payload in `[start, end)` did not match its checksum and was skipped.
    ChecksumMismatch {
        start: usize,
        end: usize,
        expected: u32,
        actual: u32,
    },
}

impl Diagnostic {
    /// Byte range of the skipped payload.
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        match self {
            Diagnostic::ChecksumMismatch { start, end, .. } => *start..*end,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ChecksumMismatch { start, end, .. } => {
                write!(f, "checksum mismatch, bytes [{start},{end}) skipped")
            }
        }
    }
}

/// Output of [`BoundedDecoder::decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<R, S> {
    pub aggregate: Aggregate<R, S>,
    pub diagnostics: Vec<Diagnostic>,
    /// Frames visited, valid or not.
    pub frames: usize,
}

impl<R, S> Default for Decoded<R, S> {
    fn default() -> Self {
        Self {
            aggregate: Aggregate::default(),
            diagnostics: Vec::new(),
            frames: 0,
        }
    }
}

impl<R, S> Decoded<R, S> {
    /// True when every frame passed its checksum.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Decodes a capture that is entirely in memory.
///
/// Corrupted frames are skipped and reported as [`Diagnostic`]s; decoding resumes at
/// the next frame boundary. A header or payload running past the end of the buffer
/// is a structural error and aborts the call.
#[derive(Debug, Clone)]
pub struct BoundedDecoder<S> {
    schema: S,
}

impl<S: MessageSchema> BoundedDecoder<S> {
    pub fn new(schema: S) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    /// Decode `bytes`, including its leading version field.
    pub fn decode(&self, bytes: &[u8]) -> Result<Decoded<S::Runtime, S::State>> {
        let mut decoded = Decoded::default();

        if bytes.len() < VERSION_SIZE {
            debug!(len = bytes.len(), "capture shorter than version field");
            return Ok(decoded);
        }

        let mut offset = VERSION_SIZE;
        while offset < bytes.len() {
            let bounds = frame_bounds(bytes, offset)?;
            let payload = bounds.payload(bytes)?;
            decoded.frames += 1;

            match checksum::verify(bounds.checksum, payload) {
                Ok(()) => {
                    let message = deserialize_payload(
                        &self.schema,
                        payload,
                        bounds.payload_start,
                        bounds.payload_end,
                    )?;
                    decoded.aggregate.absorb(message);
                }
                Err(FrameError::ChecksumMismatch { expected, actual }) => {
                    let diagnostic = Diagnostic::ChecksumMismatch {
                        start: bounds.payload_start,
                        end: bounds.payload_end,
                        expected,
                        actual,
                    };
                    warn!(%diagnostic, "skipping corrupted frame");
                    decoded.diagnostics.push(diagnostic);
                }
                Err(err) => return Err(err),
            }

            offset = bounds.payload_end;
        }

        debug!(
            frames = decoded.frames,
            states = decoded.aggregate.states.len(),
            skipped = decoded.diagnostics.len(),
            "decoded complete capture"
        );
        Ok(decoded)
    }
}
