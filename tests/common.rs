#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use vloop_crash::{parse_snapshot, write_report, ReportOptions, ReportOutcome};

/// Checked-in crash snapshot shared by the integration tests
pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/vltest.json")
}

/// Render a report for `json` into a string
pub fn render(json: &str, options: &ReportOptions) -> (ReportOutcome, String) {
    let snapshot = parse_snapshot(json).expect("snapshot should parse");
    let mut out = Vec::new();
    let outcome = write_report(&snapshot, options, &mut out).expect("report should render");
    (outcome, String::from_utf8(out).expect("report is utf-8"))
}

/// Render with the default options
pub fn render_default(json: &str) -> String {
    render(json, &ReportOptions::default()).1
}

/// Write `contents` to a temporary file that lives as long as the handle
pub fn temp_snapshot(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("unable to create temp file");
    file.write_all(contents.as_bytes())
        .expect("unable to write temp file");
    file.flush().unwrap();
    file
}

/// Minimal looper slot JSON with the given buckets and counters
pub fn looper_json(
    loop_length: i64,
    current_pulse: i64,
    buckets: &str,
    debug: &str,
) -> String {
    format!(
        r#"{{"slots": [{{
            "guid": "VLOP",
            "loopLength": {loop_length},
            "currentPulse": {current_pulse},
            "isRecording": true,
            "isPlaying": false,
            "debug": {debug},
            "buckets": {buckets}
        }}]}}"#
    )
}
