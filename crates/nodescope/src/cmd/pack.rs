use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};

use nodescope_frame::{CaptureWriter, MessageSchema};
use nodescope_schema::{Envelope, EnvelopeSchema};
use serde_json::json;
use tracing::{debug, info};

use crate::cmd::PackArgs;
use crate::exit::{frame_error, io_error, schema_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: PackArgs, format: OutputFormat, schema: EnvelopeSchema) -> CliResult<i32> {
    let input = File::open(&args.input)
        .map_err(|err| io_error(&format!("failed to open {}", args.input.display()), err))?;
    let output = File::create(&args.output)
        .map_err(|err| io_error(&format!("failed to create {}", args.output.display()), err))?;

    let mut writer = CaptureWriter::with_version(BufWriter::new(output), args.capture_version);
    let mut bytes = 0usize;

    for (index, line) in BufReader::new(input).lines().enumerate() {
        let line = line.map_err(|err| io_error("failed to read input", err))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let envelope: Envelope = serde_json::from_str(line).map_err(|err| {
            CliError::new(DATA_INVALID, format!("line {}: invalid envelope: {err}", index + 1))
        })?;
        let payload = envelope
            .to_payload()
            .map_err(|err| schema_error(&format!("line {}", index + 1), err))?;
        schema
            .deserialize(&payload)
            .map_err(|err| schema_error(&format!("line {}", index + 1), err))?;

        writer
            .write_payload(&payload)
            .map_err(|err| frame_error("write failed", err))?;
        bytes += payload.len();
        debug!(line = index + 1, len = payload.len(), "envelope packed");
    }

    let frames = writer.frames();
    writer
        .finish()
        .map_err(|err| frame_error("write failed", err))?;

    info!(output = %args.output.display(), frames, "capture written");

    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "output": args.output.display().to_string(),
                "version": args.capture_version,
                "frames": frames,
                "payload_bytes": bytes,
            })
        ),
        OutputFormat::Table | OutputFormat::Pretty => println!(
            "wrote {frames} frame(s) ({bytes} payload bytes) to {}",
            args.output.display()
        ),
    }
    Ok(SUCCESS)
}
