use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use nodescope_frame::{Aggregate, Diagnostic, Provenance};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub const SUMMARY_SCHEMA_ID: &str =
    "https://schemas.nodescope.dev/cli/v1/capture-summary.schema.json";
pub const DELTA_SCHEMA_ID: &str = "https://schemas.nodescope.dev/cli/v1/capture-delta.schema.json";

#[derive(Serialize)]
struct ProvenanceOutput {
    #[serde(rename = "type")]
    kind: &'static str,
    name: String,
}

impl From<&Provenance> for ProvenanceOutput {
    fn from(provenance: &Provenance) -> Self {
        Self {
            kind: provenance.kind.as_str(),
            name: provenance.name.clone(),
        }
    }
}

#[derive(Serialize)]
struct DiagnosticOutput {
    kind: &'static str,
    start: usize,
    end: usize,
    expected: String,
    actual: String,
    message: String,
}

impl From<&Diagnostic> for DiagnosticOutput {
    fn from(diagnostic: &Diagnostic) -> Self {
        match diagnostic {
            Diagnostic::ChecksumMismatch {
                start,
                end,
                expected,
                actual,
            } => Self {
                kind: "checksum_mismatch",
                start: *start,
                end: *end,
                expected: format!("{expected:#010x}"),
                actual: format!("{actual:#010x}"),
                message: diagnostic.to_string(),
            },
        }
    }
}

/// What `decode` and `stream` print once a capture has been consumed.
#[derive(Serialize)]
pub struct CaptureSummary {
    schema_id: &'static str,
    mode: &'static str,
    source: String,
    bytes: usize,
    frames: usize,
    states: usize,
    runtime: Option<Value>,
    provenance: Option<ProvenanceOutput>,
    diagnostics: Vec<DiagnosticOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_messages: Option<Vec<Value>>,
}

impl CaptureSummary {
    pub fn new(
        mode: &'static str,
        source: impl Into<String>,
        bytes: usize,
        frames: usize,
        aggregate: &Aggregate<Value, Value>,
        diagnostics: &[Diagnostic],
        include_states: bool,
    ) -> Self {
        Self {
            schema_id: SUMMARY_SCHEMA_ID,
            mode,
            source: source.into(),
            bytes,
            frames,
            states: aggregate.states.len(),
            runtime: aggregate.runtime.clone(),
            provenance: aggregate.provenance.as_ref().map(ProvenanceOutput::from),
            diagnostics: diagnostics.iter().map(DiagnosticOutput::from).collect(),
            state_messages: include_states.then(|| aggregate.states.clone()),
        }
    }
}

pub fn print_summary(summary: &CaptureSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_json(summary)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["mode", summary.mode])
                .add_row(vec!["source", summary.source.as_str()])
                .add_row(vec!["bytes".to_string(), summary.bytes.to_string()])
                .add_row(vec!["frames".to_string(), summary.frames.to_string()])
                .add_row(vec!["states".to_string(), summary.states.to_string()])
                .add_row(vec!["runtime".to_string(), runtime_preview(&summary.runtime)])
                .add_row(vec![
                    "diagnostics".to_string(),
                    summary.diagnostics.len().to_string(),
                ]);
            if let Some(provenance) = &summary.provenance {
                table.add_row(vec![
                    "provenance".to_string(),
                    format!("{} ({})", provenance.name, provenance.kind),
                ]);
            }
            println!("{table}");

            if !summary.diagnostics.is_empty() {
                let mut diagnostics = Table::new();
                diagnostics
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec!["KIND", "BYTES", "DECLARED", "COMPUTED"]);
                for d in &summary.diagnostics {
                    diagnostics.add_row(vec![
                        d.kind.to_string(),
                        format!("[{},{})", d.start, d.end),
                        d.expected.clone(),
                        d.actual.clone(),
                    ]);
                }
                println!("{diagnostics}");
            }
        }
        OutputFormat::Pretty => {
            println!(
                "{} {}: {} bytes, {} frames, {} states, runtime={}",
                summary.mode,
                summary.source,
                summary.bytes,
                summary.frames,
                summary.states,
                runtime_preview(&summary.runtime)
            );
            for d in &summary.diagnostics {
                println!("  warning: {}", d.message);
            }
        }
    }
}

#[derive(Serialize)]
struct DeltaOutput<'a> {
    schema_id: &'static str,
    sequence: usize,
    states: &'a [Value],
    runtime: Option<&'a Value>,
    provenance: Option<ProvenanceOutput>,
}

/// Print the messages decoded from one chunk or live push.
pub fn print_delta(sequence: usize, delta: &Aggregate<Value, Value>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = DeltaOutput {
                schema_id: DELTA_SCHEMA_ID,
                sequence,
                states: &delta.states,
                runtime: delta.runtime.as_ref(),
                provenance: delta.provenance.as_ref().map(ProvenanceOutput::from),
            };
            println!("{}", to_json(&out));
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SEQ", "FACET", "CONTENT"]);
            if let Some(runtime) = &delta.runtime {
                table.add_row(vec![sequence.to_string(), "runtime".to_string(), preview(runtime)]);
            }
            for state in &delta.states {
                table.add_row(vec![sequence.to_string(), "state".to_string(), preview(state)]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if let Some(runtime) = &delta.runtime {
                println!("#{sequence} runtime {}", preview(runtime));
            }
            for state in &delta.states {
                println!("#{sequence} state {}", preview(state));
            }
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

fn runtime_preview(runtime: &Option<Value>) -> String {
    runtime
        .as_ref()
        .map(preview)
        .unwrap_or_else(|| "absent".to_string())
}

fn preview(value: &Value) -> String {
    const MAX_PREVIEW: usize = 96;
    let text = value.to_string();
    if text.chars().count() <= MAX_PREVIEW {
        return text;
    }
    let cut: String = text.chars().take(MAX_PREVIEW).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use nodescope_frame::SourceKind;
    use serde_json::json;

    use super::*;

    fn aggregate() -> Aggregate<Value, Value> {
        let mut aggregate = Aggregate::new()
            .with_provenance(Provenance::new(SourceKind::Upload, "capture.mock"));
        aggregate.states.push(json!({"instantTs": 1}));
        aggregate.runtime = Some(json!({"peerId": "Qm"}));
        aggregate
    }

    #[test]
    fn summary_json_shape() {
        let diagnostics = [Diagnostic::ChecksumMismatch {
            start: 12,
            end: 20,
            expected: 1,
            actual: 2,
        }];
        let summary = CaptureSummary::new("bounded", "x", 64, 2, &aggregate(), &diagnostics, false);
        let json: Value = serde_json::from_str(&to_json(&summary)).unwrap();

        assert_eq!(json["schema_id"], SUMMARY_SCHEMA_ID);
        assert_eq!(json["states"], 1);
        assert_eq!(json["provenance"]["type"], "upload");
        assert_eq!(json["diagnostics"][0]["kind"], "checksum_mismatch");
        assert_eq!(json["diagnostics"][0]["expected"], "0x00000001");
        assert!(json.get("state_messages").is_none());
    }

    #[test]
    fn summary_can_include_states() {
        let summary = CaptureSummary::new("streaming", "x", 0, 1, &aggregate(), &[], true);
        let json: Value = serde_json::from_str(&to_json(&summary)).unwrap();
        assert_eq!(json["state_messages"][0]["instantTs"], 1);
    }

    #[test]
    fn long_values_are_truncated() {
        let long = json!({"blob": "x".repeat(500)});
        let text = preview(&long);
        assert_eq!(text.chars().count(), 97);
        assert!(text.ends_with('…'));
    }
}
