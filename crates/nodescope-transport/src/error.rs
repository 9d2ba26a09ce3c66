use std::path::PathBuf;

use nodescope_frame::FrameError;

/// Errors that can occur while moving capture bytes into a decoder.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the underlying reader.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// The decoder rejected the stream.
    #[error("decode error: {0}")]
    Frame(#[from] FrameError),

    /// A frame header declared more payload than the session accepts.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// A pushed message was too short to hold its version field.
    #[error("message of {len} bytes has no room for a version field")]
    ShortMessage { len: usize },

    /// The stream ended in the middle of a frame.
    #[error("stream ended with {leftover} bytes of an incomplete frame")]
    TruncatedStream { leftover: usize },
}

pub type Result<T> = std::result::Result<T, TransportError>;
