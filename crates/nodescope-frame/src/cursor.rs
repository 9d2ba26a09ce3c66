//! Wire layout of a capture and the helpers that read it.
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────────────────────────┐
//! │ Version (4B) │ Frame, repeated                                      │
//! │ LE, ignored  │ ┌───────────────┬─────────────┬────────────────────┐ │
//! │              │ │ Checksum (4B) │ Length (4B) │ Payload            │ │
//! │              │ │ FNV-1a, LE    │ LE          │ (Length bytes)     │ │
//! │              │ └───────────────┴─────────────┴────────────────────┘ │
//! └──────────────┴──────────────────────────────────────────────────────┘
//! ```

use crate::error::{FrameError, Result};

/// Leading version field, never part of a frame.
pub const VERSION_SIZE: usize = 4;

/// Checksum field size.
pub const CHECKSUM_SIZE: usize = 4;

/// Length field size.
pub const LENGTH_SIZE: usize = 4;

/// Frame header: checksum (4) + length (4) = 8 bytes.
pub const HEADER_SIZE: usize = CHECKSUM_SIZE + LENGTH_SIZE;

/// Read a little-endian `u32` at `offset`.
pub fn read_u32_le(bytes: &[u8], offset: usize) -> Result<u32> {
    let field: [u8; 4] = offset
        .checked_add(4)
        .and_then(|end| bytes.get(offset..end))
        .and_then(|slice| slice.try_into().ok())
        .ok_or(FrameError::OutOfBounds {
            offset,
            needed: 4,
            available: bytes.len().saturating_sub(offset),
        })?;
    Ok(u32::from_le_bytes(field))
}

/// Boundaries of one frame, as declared by its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBounds {
    /// Declared FNV-1a checksum of the payload.
    pub checksum: u32,
    /// Offset of the first payload byte.
    pub payload_start: usize,
    /// Offset one past the last payload byte (also the next frame's offset).
    pub payload_end: usize,
}

impl FrameBounds {
    /// Declared payload length.
    pub fn payload_len(&self) -> usize {
        self.payload_end - self.payload_start
    }

    /// True when the whole payload lies within `available` bytes.
    pub fn is_complete(&self, available: usize) -> bool {
        self.payload_end <= available
    }

    /// Slice the payload out of `bytes`, failing if it is truncated.
    pub fn payload<'a>(&self, bytes: &'a [u8]) -> Result<&'a [u8]> {
        bytes
            .get(self.payload_start..self.payload_end)
            .ok_or(FrameError::OutOfBounds {
                offset: self.payload_start,
                needed: self.payload_len(),
                available: bytes.len().saturating_sub(self.payload_start),
            })
    }
}

/// Compute the bounds of the frame whose header starts at `offset`.
///
/// Only the header is required to be present. Whether the payload is fully
/// available is left to the caller.
pub fn frame_bounds(bytes: &[u8], offset: usize) -> Result<FrameBounds> {
    let checksum = read_u32_le(bytes, offset)?;
    let length = read_u32_le(bytes, offset + CHECKSUM_SIZE)?;
    let payload_start = offset + HEADER_SIZE;
    let payload_end =
        payload_start
            .checked_add(length as usize)
            .ok_or(FrameError::OutOfBounds {
                offset: offset + CHECKSUM_SIZE,
                needed: length as usize,
                available: bytes.len().saturating_sub(payload_start),
            })?;

    Ok(FrameBounds {
        checksum,
        payload_start,
        payload_end,
    })
}
