use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use batchconv_core::{WorkflowSettings, DEFAULT_SUCCESS_FLASH};
use batchconv_engine::{CommandSettings, FailurePolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::logging::LogDestination;

pub const SETTINGS_FILENAME: &str = "batchconv.ron";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid settings file: {0}")]
    Parse(String),
    #[error("could not serialize settings: {0}")]
    Serialize(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicySetting {
    /// Stop at the first failing file and report only that failure.
    #[default]
    Abort,
    /// Convert every file and list failures in the report.
    Continue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub converter_program: PathBuf,
    pub converter_args: Vec<String>,
    pub conversion_timeout_secs: Option<u64>,
    pub success_flash_ms: u64,
    pub failure_policy: FailurePolicySetting,
    /// Extension accepted when picking archives, without the dot.
    pub archive_extension: String,
    pub log_destination: LogDestination,
}

impl Default for AppSettings {
    fn default() -> Self {
        let command = CommandSettings::default();
        Self {
            converter_program: command.program,
            converter_args: command.args,
            conversion_timeout_secs: None,
            success_flash_ms: DEFAULT_SUCCESS_FLASH.as_millis() as u64,
            failure_policy: FailurePolicySetting::default(),
            archive_extension: "elibz".to_string(),
            log_destination: LogDestination::default(),
        }
    }
}

impl AppSettings {
    pub fn command_settings(&self) -> CommandSettings {
        CommandSettings {
            program: self.converter_program.clone(),
            args: self.converter_args.clone(),
            timeout: self.conversion_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            success_flash: Duration::from_millis(self.success_flash_ms),
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        match self.failure_policy {
            FailurePolicySetting::Abort => FailurePolicy::AbortOnFirstFailure,
            FailurePolicySetting::Continue => FailurePolicy::ContinueOnFailure,
        }
    }
}

/// Reads settings from `path`. A missing file is not an error and yields `None`.
pub(crate) fn read_settings(path: &Path) -> Result<Option<AppSettings>, SettingsError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    ron::from_str(&content)
        .map(Some)
        .map_err(|err| SettingsError::Parse(err.to_string()))
}

pub(crate) fn write_default_settings(path: &Path) -> Result<(), SettingsError> {
    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(&AppSettings::default(), pretty)
        .map_err(|err| SettingsError::Serialize(err.to_string()))?;
    fs::write(path, content)?;
    Ok(())
}
