use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;

use crate::bounded::{BoundedDecoder, Decoded};
use crate::error::{FrameError, Result};
use crate::message::MessageSchema;

/// The recognized kinds of complete-capture input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Raw binary buffer.
    Buffer,
    /// Owned byte array, as handed over by a file reader.
    ArrayBuffer,
    /// Base64 text.
    Base64,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::Buffer => "buffer",
            InputKind::ArrayBuffer => "arraybuffer",
            InputKind::Base64 => "base64",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputKind {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buffer" | "binary" => Ok(InputKind::Buffer),
            "arraybuffer" | "array-buffer" => Ok(InputKind::ArrayBuffer),
            "base64" => Ok(InputKind::Base64),
            other => Err(FrameError::UnsupportedInputType(other.to_string())),
        }
    }
}

/// A complete capture in one of the recognized input forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteSource {
    Buffer(Bytes),
    ArrayBuffer(Vec<u8>),
    Base64(String),
}

impl ByteSource {
    /// Wrap raw input according to an explicitly chosen kind.
    ///
    /// Base64 input must be UTF-8 text.
    pub fn from_kind(kind: InputKind, raw: impl Into<Vec<u8>>) -> Result<Self> {
        let raw = raw.into();
        match kind {
            InputKind::Buffer => Ok(ByteSource::Buffer(Bytes::from(raw))),
            InputKind::ArrayBuffer => Ok(ByteSource::ArrayBuffer(raw)),
            InputKind::Base64 => String::from_utf8(raw)
                .map(ByteSource::Base64)
                .map_err(|err| FrameError::InvalidBase64(err.to_string())),
        }
    }

    pub fn kind(&self) -> InputKind {
        match self {
            ByteSource::Buffer(_) => InputKind::Buffer,
            ByteSource::ArrayBuffer(_) => InputKind::ArrayBuffer,
            ByteSource::Base64(_) => InputKind::Base64,
        }
    }

    /// Resolve the source to the capture bytes.
    pub fn into_bytes(self) -> Result<Bytes> {
        match self {
            ByteSource::Buffer(bytes) => Ok(bytes),
            ByteSource::ArrayBuffer(vec) => Ok(Bytes::from(vec)),
            ByteSource::Base64(text) => STANDARD
                .decode(text.trim())
                .map(Bytes::from)
                .map_err(|err| FrameError::InvalidBase64(err.to_string())),
        }
    }
}

impl From<Bytes> for ByteSource {
    fn from(bytes: Bytes) -> Self {
        ByteSource::Buffer(bytes)
    }
}

impl From<Vec<u8>> for ByteSource {
    fn from(vec: Vec<u8>) -> Self {
        ByteSource::ArrayBuffer(vec)
    }
}

/// Decode a complete capture from any recognized input form.
pub fn decode_complete<S: MessageSchema>(
    source: ByteSource,
    schema: &S,
) -> Result<Decoded<S::Runtime, S::State>> {
    let bytes = source.into_bytes()?;
    BoundedDecoder::new(schema).decode(&bytes)
}
