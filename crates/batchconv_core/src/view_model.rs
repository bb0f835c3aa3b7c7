use crate::{ReportPayload, RunId, WorkflowState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub workflow: WorkflowState,
    pub inputs: Vec<String>,
    pub output_dir: String,
    pub progress: Option<RunProgress>,
    pub cancel_pending: bool,
    pub report: Option<ReportPayload>,
    pub transient_success: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunProgress {
    pub run_id: RunId,
    pub total: usize,
    pub started: usize,
    pub finished: usize,
    /// Files that failed so far. Only non-zero when the batch continues past failures.
    pub failed: usize,
    pub current_input: Option<String>,
}
