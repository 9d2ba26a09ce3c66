mod cmd;
mod exit;
mod logging;
mod output;

use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "nodescope", version, about = "Node telemetry capture decoder")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Directory holding runtime.schema.json and state.schema.json.
    #[arg(long, value_name = "DIR", env = "NODESCOPE_SCHEMA_DIR", global = true)]
    schema_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format, cli.schema_dir.as_deref());

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decode_subcommand() {
        let cli = Cli::try_parse_from([
            "nodescope",
            "decode",
            "/tmp/capture.bin",
            "--input-type",
            "base64",
            "--strict",
        ])
        .expect("decode args should parse");

        match cli.command {
            Command::Decode(args) => {
                assert_eq!(args.input_type, "base64");
                assert!(args.strict);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn stream_uses_default_chunk_size() {
        let cli = Cli::try_parse_from(["nodescope", "stream", "/tmp/capture.bin"])
            .expect("stream args should parse");
        match cli.command {
            Command::Stream(args) => {
                assert_eq!(args.chunk_size, nodescope_transport::DEFAULT_CHUNK_SIZE)
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn source_defaults_to_upload_and_accepts_sample() {
        let cli = Cli::try_parse_from(["nodescope", "decode", "/tmp/capture.bin"])
            .expect("decode args should parse");
        assert!(matches!(
            cli.command,
            Command::Decode(ref args) if args.source == cmd::CaptureSource::Upload
        ));

        let cli = Cli::try_parse_from(["nodescope", "stream", "/tmp/s.bin", "--source", "sample"])
            .expect("stream args should parse");
        assert!(matches!(
            cli.command,
            Command::Stream(ref args) if args.source == cmd::CaptureSource::Sample
        ));

        let err = Cli::try_parse_from(["nodescope", "decode", "/tmp/c.bin", "--source", "live"])
            .expect_err("live is not a file source");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn global_format_after_subcommand() {
        let cli = Cli::try_parse_from(["nodescope", "version", "--format", "json"])
            .expect("global flag should parse after subcommand");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }

    #[test]
    fn pack_requires_output_path() {
        let err = Cli::try_parse_from(["nodescope", "pack", "/tmp/in.jsonl"])
            .expect_err("missing output should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
