//! Checksummed, length-prefixed frame decoding for nodescope captures.
//!
//! A capture is a 4-byte version field followed by frames of
//! `[FNV-1a checksum][length][payload]`, all integers little-endian `u32`.
//!
//! - [`BoundedDecoder`] decodes a capture that is fully in memory and reports
//!   corrupted frames as [`Diagnostic`]s.
//! - [`StreamingDecoder`] decodes bytes as they arrive, leaving a partial trailing
//!   frame buffered until the rest shows up.
//!
//! Payloads are handed to a [`MessageSchema`]; runtime and state facets are collected
//! into an [`Aggregate`].

pub mod aggregate;
pub mod bounded;
pub mod checksum;
pub mod cursor;
pub mod encode;
pub mod error;
pub mod message;
pub mod source;
pub mod streaming;

#[cfg(test)]
mod testing;

pub use aggregate::{Aggregate, Provenance, SourceKind};
pub use bounded::{BoundedDecoder, Decoded, Diagnostic};
pub use checksum::checksum;
pub use cursor::{frame_bounds, read_u32_le, FrameBounds, HEADER_SIZE, VERSION_SIZE};
pub use encode::{encode_capture, encode_frame, CaptureWriter, DEFAULT_VERSION};
pub use error::{FrameError, Result};
pub use message::{DecodedMessage, MessageSchema};
pub use source::{decode_complete, ByteSource, InputKind};
pub use streaming::StreamingDecoder;
