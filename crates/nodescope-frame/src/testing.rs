//! Tag-prefixed toy schema used by the unit tests.
//!
//! Payload = one tag byte + UTF-8 body. `R` runtime, `S` state, `B` both, `N` neither.

use crate::encode::{encode_capture, DEFAULT_VERSION};
use crate::message::{DecodedMessage, MessageSchema};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestMessage {
    pub runtime: Option<String>,
    pub state: Option<String>,
}

impl DecodedMessage for TestMessage {
    type Runtime = String;
    type State = String;

    fn into_facets(self) -> (Option<String>, Option<String>) {
        (self.runtime, self.state)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown message tag {0:#04x}")]
pub struct UnknownTag(pub u8);

#[derive(Debug, Clone, Copy, Default)]
pub struct TestSchema;

impl MessageSchema for TestSchema {
    type Runtime = String;
    type State = String;
    type Message = TestMessage;
    type Error = UnknownTag;

    fn deserialize(&self, payload: &[u8]) -> Result<TestMessage, UnknownTag> {
        let Some((&tag, body)) = payload.split_first() else {
            return Err(UnknownTag(0));
        };
        let body = String::from_utf8_lossy(body).into_owned();
        match tag {
            b'R' => Ok(TestMessage {
                runtime: Some(body),
                state: None,
            }),
            b'S' => Ok(TestMessage {
                runtime: None,
                state: Some(body),
            }),
            b'B' => Ok(TestMessage {
                runtime: Some(body.clone()),
                state: Some(body),
            }),
            b'N' => Ok(TestMessage::default()),
            other => Err(UnknownTag(other)),
        }
    }
}

pub fn state(body: &str) -> Vec<u8> {
    tagged(b'S', body)
}

pub fn runtime(body: &str) -> Vec<u8> {
    tagged(b'R', body)
}

pub fn tagged(tag: u8, body: &str) -> Vec<u8> {
    let mut payload = vec![tag];
    payload.extend_from_slice(body.as_bytes());
    payload
}

/// Version field followed by one frame per payload.
pub fn capture(payloads: &[Vec<u8>]) -> Vec<u8> {
    encode_capture(DEFAULT_VERSION, payloads.iter().map(Vec::as_slice))
        .expect("test payloads fit in a frame")
        .to_vec()
}
