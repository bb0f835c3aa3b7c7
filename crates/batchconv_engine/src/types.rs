use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type RunId = u64;

/// One call to the conversion backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    /// Optional symbol library target. The shell never sets it today.
    pub symbol_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success(String),
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutcome {
    pub input: PathBuf,
    pub status: OutcomeStatus,
}

/// Outcomes of a finished batch, in selection order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchReport {
    pub outcomes: Vec<ConversionOutcome>,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Failure(_)))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// A single conversion failed and the batch stopped there.
    #[error("{reason}")]
    AggregateFailure { input: PathBuf, reason: String },
    #[error("conversion cancelled after {completed} file(s)")]
    Cancelled { completed: usize },
    /// Another batch still held the engine when this one was submitted.
    #[error("batch {running} is still running")]
    Busy { running: RunId },
    #[error("conversion engine crashed: {reason}")]
    Crashed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    pub kind: FailureKind,
    pub message: String,
}

impl ConversionError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Failure reported by a backend, e.g. a test double.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Backend, message)
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "conversion cancelled")
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ConversionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Spawn,
    Io,
    ExitStatus(Option<i32>),
    Timeout,
    Cancelled,
    Backend,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Spawn => write!(f, "converter could not be started"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::ExitStatus(Some(code)) => write!(f, "exit status {code}"),
            FailureKind::ExitStatus(None) => write!(f, "terminated by signal"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Backend => write!(f, "backend error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStage {
    Started,
    Converted,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    pub run_id: RunId,
    pub index: usize,
    pub total: usize,
    pub input: PathBuf,
    pub stage: FileStage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(BatchProgress),
    BatchCompleted {
        run_id: RunId,
        result: Result<BatchReport, BatchError>,
    },
}
