use std::fs::File;

use nodescope_frame::{Aggregate, Provenance, SourceKind};
use nodescope_schema::EnvelopeSchema;
use nodescope_transport::{read_chunks, SessionConfig, StreamSession, VersionPolicy};
use serde_json::Value;
use tracing::info;

use crate::cmd::{source_name, StreamArgs};
use crate::exit::{io_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_delta, print_summary, CaptureSummary, OutputFormat};

pub fn run(args: StreamArgs, format: OutputFormat, schema: EnvelopeSchema) -> CliResult<i32> {
    if args.chunk_size == 0 {
        return Err(CliError::new(USAGE, "--chunk-size must be greater than zero"));
    }

    let mut file = File::open(&args.path)
        .map_err(|err| io_error(&format!("failed to open {}", args.path.display()), err))?;

    let name = source_name(&args.path);
    let config = SessionConfig {
        max_frame_size: args.max_frame_size,
        chunk_size: args.chunk_size,
    };
    let mut session = StreamSession::with_config(schema, VersionPolicy::Once, config)
        .with_provenance(Provenance::new(SourceKind::from(args.source), name.clone()));

    let mut aggregate: Aggregate<Value, Value> = Aggregate::new();
    let mut sequence = 0usize;
    let bytes = read_chunks(&mut file, &mut session, |delta| {
        sequence += 1;
        if args.per_chunk && !delta.is_empty() {
            print_delta(sequence, &delta, format);
        }
        aggregate.merge(delta);
    })
    .map_err(|err| transport_error("stream failed", err))?;

    let frames = session.decoder().frames();
    aggregate.merge(
        session
            .finish()
            .map_err(|err| transport_error("stream failed", err))?,
    );

    info!(
        source = %name,
        chunks = sequence,
        frames,
        states = aggregate.states.len(),
        "capture streamed"
    );

    let summary = CaptureSummary::new(
        "streaming",
        args.path.display().to_string(),
        bytes,
        frames,
        &aggregate,
        &[],
        args.states,
    );
    print_summary(&summary, format);
    Ok(SUCCESS)
}
