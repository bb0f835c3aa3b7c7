#![cfg(unix)]

use std::path::PathBuf;
use std::time::Duration;

use batchconv_engine::{
    CommandConverter, CommandSettings, ConversionRequest, ConversionService, FailureKind,
    INPUT_PLACEHOLDER, OUTPUT_DIR_PLACEHOLDER, SYMBOL_FILE_PLACEHOLDER,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn shell(script: &str) -> CommandConverter {
    CommandConverter::new(CommandSettings {
        program: PathBuf::from("sh"),
        args: vec![
            "-c".to_string(),
            script.to_string(),
            "converter".to_string(),
            INPUT_PLACEHOLDER.to_string(),
            OUTPUT_DIR_PLACEHOLDER.to_string(),
        ],
        timeout: None,
    })
}

fn request(input: &str, output_dir: &str) -> ConversionRequest {
    ConversionRequest {
        input: PathBuf::from(input),
        output_dir: PathBuf::from(output_dir),
        symbol_file: None,
    }
}

#[test]
fn placeholders_expand_per_request() {
    let converter = CommandConverter::new(CommandSettings::default());

    let args = converter.expand_args(&request("/a/one.elibz", "/out"));

    assert_eq!(
        args,
        vec![
            "--input",
            "/a/one.elibz",
            "--output-dir",
            "/out",
            "--symbol-file",
            "",
        ]
    );
}

#[test]
fn symbol_file_expands_when_present() {
    let converter = CommandConverter::new(CommandSettings {
        program: PathBuf::from("conv"),
        args: vec![format!("--sym={}", SYMBOL_FILE_PLACEHOLDER)],
        timeout: None,
    });
    let mut req = request("/a/one.elibz", "/out");
    req.symbol_file = Some(PathBuf::from("/lib/parts.kicad_sym"));

    assert_eq!(
        converter.expand_args(&req),
        vec!["--sym=/lib/parts.kicad_sym"]
    );
}

#[tokio::test]
async fn success_returns_trimmed_stdout_and_writes_artifacts() {
    let out = TempDir::new().unwrap();
    let converter = shell("touch \"$2/part.kicad_mod\"; echo \"converted $1\"");
    let out_dir = out.path().to_string_lossy().into_owned();

    let text = converter
        .convert(&request("/a/one.elibz", &out_dir), &CancellationToken::new())
        .await
        .expect("conversion ok");

    assert_eq!(text, "converted /a/one.elibz");
    assert!(out.path().join("part.kicad_mod").exists());
}

#[tokio::test]
async fn failure_uses_stderr_as_reason() {
    let converter = shell("echo partial; echo 'bad header' >&2; exit 3");

    let err = converter
        .convert(&request("/a/two.elibz", "/out"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::ExitStatus(Some(3)));
    assert_eq!(err.to_string(), "bad header");
}

#[tokio::test]
async fn failure_without_output_reports_status() {
    let converter = shell("exit 2");

    let err = converter
        .convert(&request("/a/two.elibz", "/out"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::ExitStatus(Some(2)));
    assert!(err.message.starts_with("converter exited with"));
}

#[tokio::test]
async fn missing_program_is_a_spawn_failure() {
    let converter = CommandConverter::new(CommandSettings {
        program: PathBuf::from("/nonexistent/batchconv-converter"),
        ..CommandSettings::default()
    });

    let err = converter
        .convert(&request("/a/one.elibz", "/out"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Spawn);
}

#[tokio::test]
async fn timeout_is_reported() {
    let converter = CommandConverter::new(CommandSettings {
        program: PathBuf::from("sh"),
        args: vec!["-c".to_string(), "sleep 5".to_string()],
        timeout: Some(Duration::from_millis(100)),
    });

    let err = converter
        .convert(&request("/a/one.elibz", "/out"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn cancel_kills_running_converter() {
    let converter = shell("sleep 5");
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = tokio::time::timeout(
        Duration::from_secs(3),
        converter.convert(&request("/a/one.elibz", "/out"), &cancel),
    )
    .await
    .expect("cancel should return promptly")
    .unwrap_err();

    assert_eq!(err.kind, FailureKind::Cancelled);
}
