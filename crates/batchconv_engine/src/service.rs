use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use conv_logging::{conv_debug, conv_warn};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::{ConversionError, ConversionRequest, FailureKind};

/// External conversion backend. One call is one attempt; implementations do not retry.
#[async_trait::async_trait]
pub trait ConversionService: Send + Sync {
    async fn convert(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> Result<String, ConversionError>;
}

pub const INPUT_PLACEHOLDER: &str = "{input}";
pub const OUTPUT_DIR_PLACEHOLDER: &str = "{output_dir}";
pub const SYMBOL_FILE_PLACEHOLDER: &str = "{symbol_file}";

#[derive(Debug, Clone)]
pub struct CommandSettings {
    pub program: PathBuf,
    /// Argument template; placeholders are replaced per request.
    pub args: Vec<String>,
    /// `None` lets the converter run for as long as it needs.
    pub timeout: Option<Duration>,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from("elibz2kicad"),
            args: vec![
                "--input".to_string(),
                INPUT_PLACEHOLDER.to_string(),
                "--output-dir".to_string(),
                OUTPUT_DIR_PLACEHOLDER.to_string(),
                "--symbol-file".to_string(),
                SYMBOL_FILE_PLACEHOLDER.to_string(),
            ],
            timeout: None,
        }
    }
}

/// Runs an external converter executable once per request.
///
/// Exit status 0 yields the trimmed stdout. Any other status fails with the
/// converter's stderr (or stdout when stderr is empty) as the reason.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    settings: CommandSettings,
}

impl CommandConverter {
    pub fn new(settings: CommandSettings) -> Self {
        Self { settings }
    }

    pub fn expand_args(&self, request: &ConversionRequest) -> Vec<String> {
        let input = request.input.to_string_lossy();
        let output_dir = request.output_dir.to_string_lossy();
        let symbol_file = request
            .symbol_file
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.settings
            .args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_DIR_PLACEHOLDER, &output_dir)
                    .replace(SYMBOL_FILE_PLACEHOLDER, &symbol_file)
            })
            .collect()
    }

    async fn wait(&self, child: tokio::process::Child) -> Result<Output, ConversionError> {
        let output = match self.settings.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    ConversionError::new(
                        FailureKind::Timeout,
                        format!("conversion did not finish within {}s", limit.as_secs_f64()),
                    )
                })?,
            None => child.wait_with_output().await,
        };
        output.map_err(|err| ConversionError::new(FailureKind::Io, err.to_string()))
    }
}

#[async_trait::async_trait]
impl ConversionService for CommandConverter {
    async fn convert(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> Result<String, ConversionError> {
        let args = self.expand_args(request);
        conv_debug!(
            "Spawning {} with {} argument(s)",
            self.settings.program.display(),
            args.len()
        );

        let child = Command::new(&self.settings.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                ConversionError::new(
                    FailureKind::Spawn,
                    format!(
                        "failed to start {}: {}",
                        self.settings.program.display(),
                        err
                    ),
                )
            })?;

        // Dropping the pending wait kills the child.
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ConversionError::cancelled()),
            result = self.wait(child) => result?,
        };

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
        }

        let reason = failure_reason(&output);
        conv_warn!(
            "Converter failed for {}: {}",
            request.input.display(),
            reason
        );
        Err(ConversionError::new(
            FailureKind::ExitStatus(output.status.code()),
            reason,
        ))
    }
}

fn failure_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        return stderr.trim().to_string();
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        return stdout.trim().to_string();
    }
    format!("converter exited with {}", output.status)
}
