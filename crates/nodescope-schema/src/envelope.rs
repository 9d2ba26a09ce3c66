use std::sync::Arc;

use nodescope_frame::{DecodedMessage, MessageSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::facet::Facet;
use crate::registry::FacetRegistry;

/// One application message: a JSON object with optional `runtime` and `state` members.
///
/// Other members (for example `event`) are accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

impl Envelope {
    pub fn runtime(value: Value) -> Self {
        Self {
            runtime: Some(value),
            state: None,
        }
    }

    pub fn state(value: Value) -> Self {
        Self {
            runtime: None,
            state: Some(value),
        }
    }

    pub fn facet(&self, facet: Facet) -> Option<&Value> {
        match facet {
            Facet::Runtime => self.runtime.as_ref(),
            Facet::State => self.state.as_ref(),
        }
    }

    /// Serialize as a frame payload.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl DecodedMessage for Envelope {
    type Runtime = Value;
    type State = Value;

    fn into_facets(self) -> (Option<Value>, Option<Value>) {
        (self.runtime, self.state)
    }
}

/// [`MessageSchema`] for JSON envelopes, validating facets when a registry is attached.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeSchema {
    registry: Option<Arc<FacetRegistry>>,
}

impl EnvelopeSchema {
    /// Schema that only checks envelope shape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema that also validates each present facet against `registry`.
    pub fn with_registry(registry: FacetRegistry) -> Self {
        Self {
            registry: Some(Arc::new(registry)),
        }
    }

    pub fn registry(&self) -> Option<&FacetRegistry> {
        self.registry.as_deref()
    }
}

impl MessageSchema for EnvelopeSchema {
    type Runtime = Value;
    type State = Value;
    type Message = Envelope;
    type Error = crate::error::SchemaError;

    fn deserialize(&self, payload: &[u8]) -> Result<Envelope> {
        let envelope: Envelope = serde_json::from_slice(payload)?;
        if let Some(registry) = &self.registry {
            for facet in Facet::ALL {
                if let Some(value) = envelope.facet(facet) {
                    registry.validate(facet, value)?;
                }
            }
        }
        Ok(envelope)
    }
}
