/// Errors that can occur while decoding or encoding capture frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A header field was requested past the end of the available bytes.
    #[error("field at offset {offset} needs {needed} bytes, only {available} available")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The payload does not hash to the checksum declared in its header.
    #[error("checksum mismatch (declared {expected:#010x}, computed {actual:#010x})")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// The caller named a byte source that is not buffer, arraybuffer or base64.
    #[error("unsupported input type: {0}")]
    UnsupportedInputType(String),

    /// Base64 text could not be turned into bytes.
    #[error("invalid base64 input: {0}")]
    InvalidBase64(String),

    /// A payload passed its checksum but the message schema rejected it.
    #[error("payload at bytes [{start},{end}) could not be deserialized: {source}")]
    Schema {
        start: usize,
        end: usize,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The payload does not fit the 32-bit length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while writing a capture.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
