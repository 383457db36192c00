//! Integration tests for `sugo build`.

use pretty_assertions::assert_eq;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

#[derive(Debug, Deserialize)]
struct JsonDiagnostic {
    #[serde(rename = "type")]
    diagnostic_type: String,
    filename: String,
    start: JsonPosition,
    code: String,
    #[serde(default, rename = "missingCases")]
    missing_cases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct JsonPosition {
    line: u32,
    column: u32,
}

fn sugo(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sugo"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run sugo")
}

#[test]
fn test_build_emits_go_and_map() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("main.sugo"),
        "package main\n\nfunc main() {\n\tlet x = 1\n\t_ = x\n}\n",
    )
    .unwrap();

    let output = sugo(dir.path(), &["build", "--emit"]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sugo found 0 errors and 0 warnings in 1 file, wrote 1 Go files"));
    let generated = fs::read_to_string(dir.path().join("main.go")).unwrap();
    assert_eq!(generated, "package main\n\nfunc main() {\n\tx := 1\n\t_ = x\n}\n");
    assert!(dir.path().join("main.go.map").is_file());
}

#[test]
fn test_build_reports_json_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("show.sugo"),
        "package main\n\nfunc show(v *int) {\n\tmatch v {\n\t\tSome(n) => use(n)\n\t}\n}\n",
    )
    .unwrap();

    let output = sugo(dir.path(), &["build", "--output", "json"]);
    assert_eq!(output.status.code(), Some(1));

    let diagnostics: Vec<JsonDiagnostic> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(diagnostics.len(), 1);
    let diag = &diagnostics[0];
    assert_eq!(diag.diagnostic_type, "Error");
    assert_eq!(diag.filename, "show.sugo");
    assert_eq!(diag.code, "non-exhaustive-match");
    assert_eq!((diag.start.line, diag.start.column), (4, 2));
    assert_eq!(diag.missing_cases, vec!["None".to_string()]);
    assert!(!dir.path().join("show.go").exists());
}

#[test]
fn test_missing_explicit_config_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let output = sugo(dir.path(), &["build", "--config", "missing.toml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("config file not found"));
}
