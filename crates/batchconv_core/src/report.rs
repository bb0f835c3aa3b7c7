/// Result of converting exactly one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub input: String,
    pub status: FileStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Free-form summary returned by the conversion backend.
    Converted(String),
    /// Backend-supplied reason. Only present when the batch keeps going after a failure.
    Failed(String),
}

/// Final, read-only result of one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchReport {
    /// Every input was attempted; outcomes are in selection order.
    Completed { outcomes: Vec<FileOutcome> },
    /// The batch stopped early. Outcomes gathered before the failure are not kept.
    Failed { reason: String },
}

impl BatchReport {
    pub fn empty() -> Self {
        BatchReport::Completed {
            outcomes: Vec::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, BatchReport::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Success,
    Failure,
}

/// Display payload handed to the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPayload {
    pub title: String,
    pub body: String,
    pub kind: ReportKind,
}

pub const REPORT_TITLE: &str = "Conversion result";

/// Formats a finished report for display. Pure; never touches the conversion path.
pub fn present(report: &BatchReport) -> ReportPayload {
    match report {
        BatchReport::Completed { outcomes } => ReportPayload {
            title: REPORT_TITLE.to_string(),
            body: outcomes
                .iter()
                .map(format_outcome)
                .collect::<Vec<_>>()
                .join("\n\n"),
            kind: ReportKind::Success,
        },
        BatchReport::Failed { reason } => ReportPayload {
            title: REPORT_TITLE.to_string(),
            body: format!("Conversion failed: {reason}"),
            kind: ReportKind::Failure,
        },
    }
}

fn format_outcome(outcome: &FileOutcome) -> String {
    match &outcome.status {
        FileStatus::Converted(text) => format!("{}: {}", outcome.input, text),
        FileStatus::Failed(reason) => format!("{}: failed: {}", outcome.input, reason),
    }
}
