//! Decode checksummed peer-to-peer node telemetry captures.
//!
//! # Crate Structure
//!
//! - [`frame`]: Wire envelope: checksum, bounded and streaming decoders, aggregation
//! - [`transport`]: Stream sessions, chunked readers, Unix socket live feeds
//! - [`schema`]: JSON envelope message schema (behind `schema` feature)

/// Re-export frame types.
pub mod frame {
    pub use nodescope_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use nodescope_transport::*;
}

/// Re-export schema types (requires `schema` feature).
#[cfg(feature = "schema")]
pub mod schema {
    pub use nodescope_schema::*;
}
