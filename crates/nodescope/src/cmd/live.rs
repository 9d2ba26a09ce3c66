use std::io::{ErrorKind, Read};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nodescope_frame::{Aggregate, Provenance, SourceKind};
use nodescope_schema::EnvelopeSchema;
use nodescope_transport::{
    FeedListener, SessionConfig, StreamSession, TransportError, VersionPolicy,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cmd::LiveArgs;
use crate::exit::{transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_delta, OutputFormat};

/// How long a blocked accept or read waits before re-checking for Ctrl-C.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run(args: LiveArgs, format: OutputFormat, schema: EnvelopeSchema) -> CliResult<i32> {
    let listener =
        FeedListener::bind(&args.path).map_err(|err| transport_error("bind failed", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| transport_error("bind failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut feeds = Feeds {
        schema: &schema,
        config: SessionConfig {
            max_frame_size: args.max_frame_size,
            ..SessionConfig::default()
        },
        format,
        count: args.count,
        running: &running,
        printed: 0,
        sequence: 0,
    };
    let mut feed = 0usize;

    while running.load(Ordering::SeqCst) {
        let stream = match listener.try_accept() {
            Ok(Some(stream)) => stream,
            Ok(None) => {
                std::thread::sleep(POLL_INTERVAL);
                continue;
            }
            Err(err) => return Err(transport_error("accept failed", err)),
        };
        feed += 1;
        debug!(feed, "live feed connected");

        match feeds.serve(feed, stream) {
            Ok(FeedEnd::CountReached) => return Ok(SUCCESS),
            Ok(FeedEnd::Closed) => debug!(feed, "live feed closed"),
            Err(err) => warn!(feed, error = %err, "abandoning live feed"),
        }
    }

    Ok(SUCCESS)
}

enum FeedEnd {
    Closed,
    CountReached,
}

/// State shared by every feed the listener serves.
struct Feeds<'a> {
    schema: &'a EnvelopeSchema,
    config: SessionConfig,
    format: OutputFormat,
    count: Option<usize>,
    running: &'a AtomicBool,
    printed: usize,
    sequence: usize,
}

impl Feeds<'_> {
    /// Decode one connection with its own session. An error ends this feed only.
    fn serve(&mut self, feed: usize, mut stream: UnixStream) -> Result<FeedEnd, TransportError> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(POLL_INTERVAL))?;

        let mut session =
            StreamSession::with_config(self.schema, VersionPolicy::Once, self.config.clone())
                .with_provenance(Provenance::new(SourceKind::Live, format!("feed-{feed}")));
        let mut chunk = vec![0u8; self.config.chunk_size.max(1)];

        while self.running.load(Ordering::SeqCst) {
            let read = match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err)
                    if matches!(
                        err.kind(),
                        ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
                    ) =>
                {
                    continue
                }
                Err(err) => return Err(TransportError::Io(err)),
            };

            session.push(&chunk[..read])?;
            let delta: Aggregate<Value, Value> = session.take();
            if delta.is_empty() {
                continue;
            }

            self.sequence += 1;
            self.printed = self.printed.saturating_add(delta.states.len());
            print_delta(self.sequence, &delta, self.format);

            if let Some(count) = self.count {
                if self.printed >= count {
                    return Ok(FeedEnd::CountReached);
                }
            }
        }

        session.finish()?;
        Ok(FeedEnd::Closed)
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
