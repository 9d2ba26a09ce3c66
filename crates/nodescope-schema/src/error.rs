use crate::facet::Facet;

/// Errors that can occur while loading schemas or deserializing envelopes.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The schema file could not be loaded.
    #[error("failed to load schema: {0}")]
    LoadFailed(String),

    /// The schema could not be compiled.
    #[error("failed to compile schema: {0}")]
    CompileFailed(String),

    /// A facet failed schema validation.
    #[error("validation failed for {facet} facet: {message}")]
    ValidationFailed { facet: Facet, message: String },

    /// The payload is not a valid JSON envelope.
    #[error("payload is not a valid JSON envelope: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// No schema registered for the given facet.
    #[error("no schema registered for {0} facet")]
    NoSchema(Facet),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
