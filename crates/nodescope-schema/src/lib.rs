//! JSON envelope message schema for nodescope captures.
//!
//! Each frame payload is a JSON object that may carry a `runtime` member, a `state`
//! member, both, or neither. [`EnvelopeSchema`] plugs into the frame decoders and can
//! validate each facet against a JSON Schema (2020-12) registered in a
//! [`FacetRegistry`].

pub mod config;
pub mod envelope;
pub mod error;
pub mod facet;
pub mod registry;

pub use config::SchemaConfig;
pub use envelope::{Envelope, EnvelopeSchema};
pub use error::{Result, SchemaError};
pub use facet::Facet;
pub use registry::FacetRegistry;
