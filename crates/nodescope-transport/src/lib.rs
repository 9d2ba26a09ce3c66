//! Moving capture bytes from the outside world into a decoder.
//!
//! A [`StreamSession`] is the unit of ownership: one per upload, fetched sample or
//! live connection, holding exactly one streaming decoder. It strips the version
//! field according to a [`VersionPolicy`], caps frame sizes, and tags what it hands
//! out with [`Provenance`](nodescope_frame::Provenance).

pub mod error;
pub mod reader;
pub mod session;

#[cfg(unix)]
pub mod uds;

#[cfg(test)]
mod testing;

pub use error::{Result, TransportError};
pub use reader::read_chunks;
pub use session::{
    SessionConfig, StreamSession, VersionPolicy, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_FRAME_SIZE,
};

#[cfg(unix)]
pub use uds::FeedListener;
