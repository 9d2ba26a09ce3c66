use std::path::{Path, PathBuf};

use clap::{Args, Subcommand, ValueEnum};
use nodescope_frame::SourceKind;
use nodescope_schema::{EnvelopeSchema, FacetRegistry};
use nodescope_transport::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_FRAME_SIZE};

use crate::exit::{schema_error, CliResult};
use crate::output::OutputFormat;

pub mod decode;
#[cfg(unix)]
pub mod live;
pub mod pack;
pub mod stream;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a complete capture file in one pass.
    Decode(DecodeArgs),
    /// Decode a capture file incrementally, chunk by chunk.
    Stream(StreamArgs),
    #[cfg(unix)]
    /// Listen on a Unix socket and decode live captures as they arrive.
    Live(LiveArgs),
    /// Encode JSON envelopes (one per line) into a capture file.
    Pack(PackArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat, schema_dir: Option<&Path>) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format, load_schema(schema_dir)?),
        Command::Stream(args) => stream::run(args, format, load_schema(schema_dir)?),
        #[cfg(unix)]
        Command::Live(args) => live::run(args, format, load_schema(schema_dir)?),
        Command::Pack(args) => pack::run(args, format, load_schema(schema_dir)?),
        Command::Version(args) => version::run(args),
    }
}

fn load_schema(schema_dir: Option<&Path>) -> CliResult<EnvelopeSchema> {
    match schema_dir {
        Some(dir) => {
            let registry = FacetRegistry::from_directory(dir)
                .map_err(|err| schema_error("schema load failed", err))?;
            Ok(EnvelopeSchema::with_registry(registry))
        }
        None => Ok(EnvelopeSchema::new()),
    }
}

/// File name used as provenance for a capture path.
pub(crate) fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Where a capture file came from, recorded as its provenance.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CaptureSource {
    /// A capture the user recorded and uploaded.
    #[default]
    Upload,
    /// A bundled sample capture.
    Sample,
}

impl From<CaptureSource> for SourceKind {
    fn from(source: CaptureSource) -> Self {
        match source {
            CaptureSource::Upload => SourceKind::Upload,
            CaptureSource::Sample => SourceKind::Sample,
        }
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file to decode.
    pub path: PathBuf,
    /// How to interpret the file: buffer, arraybuffer or base64.
    #[arg(long, default_value = "buffer")]
    pub input_type: String,
    /// Provenance recorded for the capture.
    #[arg(long, value_enum, default_value_t = CaptureSource::Upload)]
    pub source: CaptureSource,
    /// Exit with a data error when any frame failed its checksum.
    #[arg(long)]
    pub strict: bool,
    /// Include every decoded state in JSON output.
    #[arg(long)]
    pub states: bool,
}

#[derive(Args, Debug)]
pub struct StreamArgs {
    /// Capture file to decode.
    pub path: PathBuf,
    /// Bytes read per chunk.
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
    /// Largest frame payload accepted, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: usize,
    /// Provenance recorded for the capture.
    #[arg(long, value_enum, default_value_t = CaptureSource::Upload)]
    pub source: CaptureSource,
    /// Print the messages decoded from each chunk as it is processed.
    #[arg(long)]
    pub per_chunk: bool,
    /// Include every decoded state in JSON output.
    #[arg(long)]
    pub states: bool,
}

#[derive(Args, Debug)]
pub struct LiveArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Exit after printing N state messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Largest frame payload accepted, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: usize,
}

#[derive(Args, Debug)]
pub struct PackArgs {
    /// JSON Lines file with one envelope per line.
    pub input: PathBuf,
    /// Capture file to write.
    pub output: PathBuf,
    /// Version number written at the start of the capture.
    #[arg(long, default_value_t = nodescope_frame::DEFAULT_VERSION)]
    pub capture_version: u32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
