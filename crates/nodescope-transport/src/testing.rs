//! Plain-text schema for the unit tests: `runtime:<body>` is a runtime message,
//! anything else is a state.

use nodescope_frame::{encode_capture, DecodedMessage, MessageSchema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Runtime(String),
    State(String),
}

impl DecodedMessage for Line {
    type Runtime = String;
    type State = String;

    fn into_facets(self) -> (Option<String>, Option<String>) {
        match self {
            Line::Runtime(body) => (Some(body), None),
            Line::State(body) => (None, Some(body)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LineSchema;

impl MessageSchema for LineSchema {
    type Runtime = String;
    type State = String;
    type Message = Line;
    type Error = std::str::Utf8Error;

    fn deserialize(&self, payload: &[u8]) -> Result<Line, std::str::Utf8Error> {
        let text = std::str::from_utf8(payload)?;
        Ok(match text.strip_prefix("runtime:") {
            Some(body) => Line::Runtime(body.to_string()),
            None => Line::State(text.to_string()),
        })
    }
}

pub fn capture(version: u32, lines: &[&str]) -> Vec<u8> {
    encode_capture(version, lines.iter().map(|line| line.as_bytes()))
        .expect("test payloads fit in a frame")
        .to_vec()
}
