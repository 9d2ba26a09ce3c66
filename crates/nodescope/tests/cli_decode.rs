#![cfg(feature = "cli")]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value;

const LINES: &str = r#"{"runtime": {"peerId": "QmA", "listen": ["/ip4/127.0.0.1/tcp/4001"]}}
{"state": {"instantTs": 1000, "peers": 3}}
{"event": "ignored"}
{"state": {"instantTs": 2000, "peers": 4}, "runtime": {"peerId": "QmB"}}
"#;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "nodescope-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn nodescope(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_nodescope"))
        .env_remove("NODESCOPE_SCHEMA_DIR")
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .output()
        .expect("nodescope should run")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are utf-8")
}

fn pack(dir: &Path) -> PathBuf {
    let input = dir.join("messages.jsonl");
    let output = dir.join("capture.bin");
    std::fs::write(&input, LINES).expect("input should be writable");

    let out = nodescope(&["pack", path_str(&input), path_str(&output)]);
    assert!(out.status.success(), "pack failed: {}", String::from_utf8_lossy(&out.stderr));
    let json: Value = serde_json::from_slice(&out.stdout).expect("pack prints json");
    assert_eq!(json["frames"], 4);
    output
}

fn summary(out: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&out.stdout);
    let last = stdout.lines().last().expect("summary line");
    serde_json::from_str(last).expect("summary should be json")
}

#[test]
fn pack_then_decode_reports_states_and_last_runtime() {
    let dir = unique_temp_dir("decode");
    let capture = pack(&dir);

    let out = nodescope(&["decode", path_str(&capture), "--states"]);
    assert!(out.status.success());
    let json = summary(&out);

    assert_eq!(json["mode"], "bounded");
    assert_eq!(json["frames"], 4);
    assert_eq!(json["states"], 2);
    assert_eq!(json["runtime"]["peerId"], "QmB");
    assert_eq!(json["provenance"]["type"], "upload");
    assert_eq!(json["provenance"]["name"], "capture.bin");
    assert_eq!(json["state_messages"][1]["instantTs"], 2000);
    assert_eq!(json["diagnostics"].as_array().map(Vec::len), Some(0));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn stream_matches_decode_with_small_chunks() {
    let dir = unique_temp_dir("stream");
    let capture = pack(&dir);

    let out = nodescope(&["stream", path_str(&capture), "--chunk-size", "7"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let json = summary(&out);

    assert_eq!(json["mode"], "streaming");
    assert_eq!(json["states"], 2);
    assert_eq!(json["runtime"]["peerId"], "QmB");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn corrupted_frame_is_reported_and_skipped() {
    let dir = unique_temp_dir("corrupt");
    let capture = pack(&dir);

    let mut bytes = std::fs::read(&capture).expect("capture should be readable");
    // First payload byte: 4 version + 4 checksum + 4 length.
    bytes[12] ^= 0xff;
    std::fs::write(&capture, &bytes).expect("capture should be writable");

    let out = nodescope(&["decode", path_str(&capture)]);
    assert!(out.status.success());
    let json = summary(&out);
    assert_eq!(json["diagnostics"][0]["kind"], "checksum_mismatch");
    assert_eq!(json["diagnostics"][0]["start"], 12);
    assert_eq!(json["states"], 2);
    assert_eq!(json["runtime"]["peerId"], "QmB");

    let strict = nodescope(&["decode", path_str(&capture), "--strict"]);
    assert_eq!(strict.status.code(), Some(60));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decodes_base64_input() {
    let dir = unique_temp_dir("base64");
    let capture = pack(&dir);
    let encoded = dir.join("capture.b64");
    let bytes = std::fs::read(&capture).expect("capture should be readable");
    std::fs::write(&encoded, STANDARD.encode(&bytes)).expect("base64 should be writable");

    let out = nodescope(&["decode", path_str(&encoded), "--input-type", "base64"]);
    assert!(out.status.success());
    let json = summary(&out);
    assert_eq!(json["states"], 2);
    assert_eq!(json["bytes"], bytes.len());

    let raw = summary(&nodescope(&["decode", path_str(&capture)]));
    assert_eq!(raw["bytes"], json["bytes"]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn sample_source_is_recorded_as_provenance() {
    let dir = unique_temp_dir("sample");
    let capture = pack(&dir);

    let decoded = summary(&nodescope(&["decode", path_str(&capture), "--source", "sample"]));
    assert_eq!(decoded["provenance"]["type"], "sample");
    assert_eq!(decoded["provenance"]["name"], "capture.bin");

    let streamed = summary(&nodescope(&["stream", path_str(&capture), "--source", "sample"]));
    assert_eq!(streamed["provenance"]["type"], "sample");
    assert_eq!(streamed["states"], 2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn oversized_frame_fails_stream_at_any_chunk_size() {
    let dir = unique_temp_dir("oversized");
    let capture = pack(&dir);

    for chunk in ["4096", "7"] {
        let out = nodescope(&[
            "stream",
            path_str(&capture),
            "--chunk-size",
            chunk,
            "--max-frame-size",
            "40",
        ]);
        assert_eq!(out.status.code(), Some(60), "chunk size {chunk}");
        assert!(String::from_utf8_lossy(&out.stderr).contains("frame too large"));
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unsupported_input_type_is_usage_error() {
    let dir = unique_temp_dir("usage");
    let capture = pack(&dir);

    let out = nodescope(&["decode", path_str(&capture), "--input-type", "json"]);
    assert_eq!(out.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&out.stderr).contains("json"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_file_is_not_found() {
    let out = nodescope(&["decode", "/nonexistent/nodescope/capture.bin"]);
    assert_eq!(out.status.code(), Some(66));
}

#[test]
fn schema_dir_rejects_invalid_state() {
    let dir = unique_temp_dir("schema");
    let capture = pack(&dir);
    let schemas = dir.join("schemas");
    std::fs::create_dir_all(&schemas).expect("schema dir should be creatable");
    std::fs::write(
        schemas.join("state.schema.json"),
        r#"{"type": "object", "required": ["instantTs", "mem"]}"#,
    )
    .expect("schema should be writable");

    let out = nodescope(&[
        "--schema-dir",
        path_str(&schemas),
        "decode",
        path_str(&capture),
    ]);
    assert_eq!(out.status.code(), Some(60));

    let _ = std::fs::remove_dir_all(&dir);
}
