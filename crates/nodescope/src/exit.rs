use std::fmt;
use std::io;

use nodescope_frame::FrameError;
use nodescope_schema::SchemaError;
use nodescope_transport::TransportError;

// Exit code constants (sysexits-style where one exists).
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const NOT_FOUND: i32 = 66;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => NOT_FOUND,
        io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::UnsupportedInputType(_) => CliError::new(USAGE, format!("{context}: {err}")),
        FrameError::OutOfBounds { .. }
        | FrameError::ChecksumMismatch { .. }
        | FrameError::InvalidBase64(_)
        | FrameError::Schema { .. }
        | FrameError::PayloadTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
    }
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        TransportError::Frame(err) => frame_error(context, err),
        TransportError::FrameTooLarge { .. }
        | TransportError::ShortMessage { .. }
        | TransportError::TruncatedStream { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    match err {
        SchemaError::LoadFailed(_) | SchemaError::CompileFailed(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}
