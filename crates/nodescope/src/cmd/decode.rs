use nodescope_frame::{decode_complete, ByteSource, InputKind, Provenance, SourceKind};
use nodescope_schema::EnvelopeSchema;
use tracing::info;

use crate::cmd::{source_name, DecodeArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_summary, CaptureSummary, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat, schema: EnvelopeSchema) -> CliResult<i32> {
    let kind: InputKind = args
        .input_type
        .parse()
        .map_err(|err| frame_error("invalid --input-type", err))?;

    let raw = std::fs::read(&args.path)
        .map_err(|err| io_error(&format!("failed to read {}", args.path.display()), err))?;
    let capture = ByteSource::from_kind(kind, raw)
        .and_then(ByteSource::into_bytes)
        .map_err(|err| frame_error("decode failed", err))?;
    let bytes = capture.len();

    let name = source_name(&args.path);
    let mut decoded = decode_complete(ByteSource::Buffer(capture), &schema)
        .map_err(|err| frame_error("decode failed", err))?;
    decoded
        .aggregate
        .set_provenance(Provenance::new(SourceKind::from(args.source), name.clone()));

    info!(
        source = %name,
        input_type = %kind,
        frames = decoded.frames,
        states = decoded.aggregate.states.len(),
        skipped = decoded.diagnostics.len(),
        "capture decoded"
    );

    let summary = CaptureSummary::new(
        "bounded",
        args.path.display().to_string(),
        bytes,
        decoded.frames,
        &decoded.aggregate,
        &decoded.diagnostics,
        args.states,
    );
    print_summary(&summary, format);

    if args.strict && !decoded.is_clean() {
        return Err(CliError::new(
            DATA_INVALID,
            format!(
                "{} frame(s) failed checksum verification",
                decoded.diagnostics.len()
            ),
        ));
    }
    Ok(SUCCESS)
}
