use std::io::{ErrorKind, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum::checksum;
use crate::cursor::{HEADER_SIZE, VERSION_SIZE};
use crate::error::{FrameError, Result};

/// Version number written by [`CaptureWriter`] unless told otherwise.
pub const DEFAULT_VERSION: u32 = 1;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Encode one payload as `[checksum][length][payload]`.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u32_le(checksum(payload));
    dst.put_u32_le(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Encode a complete capture: the version field followed by one frame per payload.
pub fn encode_capture<'a>(
    version: u32,
    payloads: impl IntoIterator<Item = &'a [u8]>,
) -> Result<Bytes> {
    let mut dst = BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY);
    dst.put_u32_le(version);
    for payload in payloads {
        encode_frame(payload, &mut dst)?;
    }
    Ok(dst.freeze())
}

/// Writes a capture to any `Write` sink, one frame at a time.
///
/// The version field goes out with the first frame, or on [`finish`](Self::finish)
/// when no frame was written.
pub struct CaptureWriter<W> {
    inner: W,
    buf: BytesMut,
    version: u32,
    version_written: bool,
    frames: usize,
}

impl<W: Write> CaptureWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_version(inner, DEFAULT_VERSION)
    }

    pub fn with_version(inner: W, version: u32) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            version,
            version_written: false,
            frames: 0,
        }
    }

    /// Encode and write one payload as a frame.
    pub fn write_payload(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        if !self.version_written {
            self.buf.reserve(VERSION_SIZE);
            self.buf.put_u32_le(self.version);
        }
        encode_frame(payload, &mut self.buf)?;
        write_all(&mut self.inner, &self.buf)?;
        self.version_written = true;
        self.frames += 1;
        Ok(())
    }

    /// Number of frames written so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Make sure the version field is out, flush, and return the sink.
    pub fn finish(mut self) -> Result<W> {
        if !self.version_written {
            write_all(&mut self.inner, &self.version.to_le_bytes())?;
            self.version_written = true;
        }
        self.flush()?;
        Ok(self.inner)
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

fn write_all<W: Write>(inner: &mut W, bytes: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < bytes.len() {
        match inner.write(&bytes[offset..]) {
            Ok(0) => return Err(FrameError::Io(ErrorKind::WriteZero.into())),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{frame_bounds, read_u32_le};

    #[test]
    fn frame_layout() {
        let mut buf = BytesMut::new();
        encode_frame(b"hello", &mut buf).unwrap();

        assert_eq!(buf.len(), HEADER_SIZE + 5);
        assert_eq!(read_u32_le(&buf, 0).unwrap(), checksum(b"hello"));
        assert_eq!(read_u32_le(&buf, 4).unwrap(), 5);
        assert_eq!(&buf[HEADER_SIZE..], b"hello");
    }

    #[test]
    fn empty_payload_frame() {
        let mut buf = BytesMut::new();
        encode_frame(b"", &mut buf).unwrap();

        let bounds = frame_bounds(&buf, 0).unwrap();
        assert_eq!(bounds.checksum, 0x811c_9dc5);
        assert_eq!(bounds.payload_len(), 0);
    }

    #[test]
    fn capture_starts_with_version() {
        let capture = encode_capture(7, [b"one".as_slice(), b"two".as_slice()]).unwrap();
        assert_eq!(read_u32_le(&capture, 0).unwrap(), 7);

        let first = frame_bounds(&capture, VERSION_SIZE).unwrap();
        assert_eq!(first.payload(&capture).unwrap(), b"one");
        let second = frame_bounds(&capture, first.payload_end).unwrap();
        assert_eq!(second.payload(&capture).unwrap(), b"two");
        assert_eq!(second.payload_end, capture.len());
    }

    #[test]
    fn writer_matches_encode_capture() {
        let mut writer = CaptureWriter::with_version(Vec::new(), 3);
        writer.write_payload(b"first").unwrap();
        writer.write_payload(b"second").unwrap();
        assert_eq!(writer.frames(), 2);
        let written = writer.finish().unwrap();

        let expected = encode_capture(3, [b"first".as_slice(), b"second".as_slice()]).unwrap();
        assert_eq!(written, expected.to_vec());
    }

    #[test]
    fn empty_writer_still_emits_version() {
        let written = CaptureWriter::new(Vec::new()).finish().unwrap();
        assert_eq!(written, DEFAULT_VERSION.to_le_bytes().to_vec());
    }
}
