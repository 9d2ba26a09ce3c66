use nodescope_frame::{
    read_u32_le, Aggregate, FrameError, MessageSchema, Provenance, StreamingDecoder,
    VERSION_SIZE,
};
use tracing::{debug, warn};

use crate::error::{Result, TransportError};

/// Default cap on a single frame's payload: 16 MiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Default read size for chunked uploads.
pub const DEFAULT_CHUNK_SIZE: usize = 1000 * 1024;

/// Where the 4-byte version field shows up in the inbound bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionPolicy {
    /// Once, at the very start of the stream (files, fetched samples, socket captures).
    Once,
    /// At the start of every pushed message (message-oriented live feeds).
    PerMessage,
}

/// Limits for one stream session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Largest payload a frame header may declare. Default: 16 MiB.
    pub max_frame_size: usize,
    /// Read size used by [`read_chunks`](crate::read_chunks). Default: 1000 KiB.
    pub chunk_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// One logical inbound stream and the decoder that belongs to it.
///
/// Created by whatever owns the connection or upload and dropped with it. After an
/// error the session should be abandoned.
pub struct StreamSession<S: MessageSchema> {
    decoder: StreamingDecoder<S>,
    policy: VersionPolicy,
    config: SessionConfig,
    provenance: Option<Provenance>,
    version_bytes: Vec<u8>,
    version: Option<u32>,
    messages: usize,
}

impl<S: MessageSchema> StreamSession<S> {
    pub fn new(schema: S, policy: VersionPolicy) -> Self {
        Self::with_config(schema, policy, SessionConfig::default())
    }

    pub fn with_config(schema: S, policy: VersionPolicy, config: SessionConfig) -> Self {
        Self {
            decoder: StreamingDecoder::new(schema).with_max_payload(config.max_frame_size),
            policy,
            config,
            provenance: None,
            version_bytes: Vec::with_capacity(VERSION_SIZE),
            version: None,
            messages: 0,
        }
    }

    /// Tag every aggregate this session hands out.
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// Accept the next inbound chunk (or message, under [`VersionPolicy::PerMessage`]).
    pub fn push(&mut self, chunk: &[u8]) -> Result<()> {
        let body = match self.policy {
            VersionPolicy::Once => self.strip_stream_version(chunk),
            VersionPolicy::PerMessage => self.strip_message_version(chunk)?,
        };
        self.messages += 1;

        self.decoder.feed(body).map_err(|err| match err {
            FrameError::PayloadTooLarge { size, max } => {
                warn!(size, max, "rejecting oversized frame");
                TransportError::FrameTooLarge { size, max }
            }
            other => TransportError::Frame(other),
        })
    }

    fn strip_stream_version<'a>(&mut self, chunk: &'a [u8]) -> &'a [u8] {
        let missing = VERSION_SIZE - self.version_bytes.len();
        if missing == 0 {
            return chunk;
        }
        let take = missing.min(chunk.len());
        self.version_bytes.extend_from_slice(&chunk[..take]);
        if let Ok(version) = read_u32_le(&self.version_bytes, 0) {
            self.record_version(version);
        }
        &chunk[take..]
    }

    fn strip_message_version<'a>(&mut self, message: &'a [u8]) -> Result<&'a [u8]> {
        if message.len() < VERSION_SIZE {
            return Err(TransportError::ShortMessage { len: message.len() });
        }
        self.record_version(read_u32_le(message, 0)?);
        Ok(&message[VERSION_SIZE..])
    }

    fn record_version(&mut self, version: u32) {
        if self.version != Some(version) {
            debug!(version, "stream version");
        }
        self.version = Some(version);
    }

    /// Aggregate accumulated since the last [`take`](Self::take).
    pub fn result(&self) -> &Aggregate<S::Runtime, S::State> {
        self.decoder.result()
    }

    /// Drain the messages decoded since the previous call, tagged with provenance.
    pub fn take(&mut self) -> Aggregate<S::Runtime, S::State> {
        let delta = self.decoder.take();
        self.tag(delta)
    }

    /// End the stream, failing if it stopped inside a frame or version field.
    pub fn finish(self) -> Result<Aggregate<S::Runtime, S::State>> {
        let leftover = self.decoder.buffered() + self.partial_version_len();
        if leftover > 0 {
            return Err(TransportError::TruncatedStream { leftover });
        }
        Ok(self.into_result())
    }

    /// End the stream, discarding any partial trailing frame.
    pub fn into_result(self) -> Aggregate<S::Runtime, S::State> {
        let provenance = self.provenance;
        let aggregate = self.decoder.into_result();
        match provenance {
            Some(provenance) => aggregate.with_provenance(provenance),
            None => aggregate,
        }
    }

    fn tag(&self, aggregate: Aggregate<S::Runtime, S::State>) -> Aggregate<S::Runtime, S::State> {
        match &self.provenance {
            Some(provenance) => aggregate.with_provenance(provenance.clone()),
            None => aggregate,
        }
    }

    fn partial_version_len(&self) -> usize {
        match self.version_bytes.len() {
            VERSION_SIZE => 0,
            n => n,
        }
    }

    /// Version number read from the stream, once seen.
    pub fn version(&self) -> Option<u32> {
        self.version
    }

    pub fn policy(&self) -> VersionPolicy {
        self.policy
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.as_ref()
    }

    /// Chunks or messages pushed so far.
    pub fn messages(&self) -> usize {
        self.messages
    }

    pub fn decoder(&self) -> &StreamingDecoder<S> {
        &self.decoder
    }
}
