//! The seam between frame decoding and the application message schema.
//!
//! The decoders never look inside a payload. They hand validated payload bytes to a
//! [`MessageSchema`] and keep whatever runtime and state facets it extracts.

use crate::error::{FrameError, Result};

/// A deserialized application message.
pub trait DecodedMessage {
    /// Runtime descriptor of the observed node.
    type Runtime;
    /// Time-series state snapshot.
    type State;

    /// Split the message into its optional runtime and state facets.
    fn into_facets(self) -> (Option<Self::Runtime>, Option<Self::State>);
}

/// Deserializes frame payloads into application messages.
pub trait MessageSchema {
    type Runtime;
    type State;
    type Message: DecodedMessage<Runtime = Self::Runtime, State = Self::State>;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Deserialize one checksum-validated payload.
    fn deserialize(&self, payload: &[u8]) -> std::result::Result<Self::Message, Self::Error>;
}

impl<S: MessageSchema + ?Sized> MessageSchema for &S {
    type Runtime = S::Runtime;
    type State = S::State;
    type Message = S::Message;
    type Error = S::Error;

    fn deserialize(&self, payload: &[u8]) -> std::result::Result<Self::Message, Self::Error> {
        (**self).deserialize(payload)
    }
}

/// Deserialize `payload`, tagging a failure with the payload's byte range.
pub(crate) fn deserialize_payload<S: MessageSchema>(
    schema: &S,
    payload: &[u8],
    start: usize,
    end: usize,
) -> Result<S::Message> {
    schema
        .deserialize(payload)
        .map_err(|err| FrameError::Schema {
            start,
            end,
            source: Box::new(err),
        })
}
