use std::io::{ErrorKind, Read};

use nodescope_frame::{Aggregate, MessageSchema};
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::session::StreamSession;

/// Drive `session` from `reader` in `chunk_size` pieces until EOF.
///
/// `on_chunk` receives the messages decoded from each chunk as they become
/// available. Returns the number of bytes read.
pub fn read_chunks<R, S, F>(
    reader: &mut R,
    session: &mut StreamSession<S>,
    mut on_chunk: F,
) -> Result<usize>
where
    R: Read,
    S: MessageSchema,
    F: FnMut(Aggregate<S::Runtime, S::State>),
{
    let mut chunk = vec![0u8; session.config().chunk_size.max(1)];
    let mut total = 0usize;

    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        };
        total += read;

        session.push(&chunk[..read])?;
        on_chunk(session.take());
    }

    debug!(bytes = total, chunks = session.messages(), "reader exhausted");
    Ok(total)
}
