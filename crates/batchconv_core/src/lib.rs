//! Batch converter core: pure workflow state machine and report presentation.
mod effect;
mod msg;
mod report;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use report::{
    present, BatchReport, FileOutcome, FileStatus, ReportKind, ReportPayload, REPORT_TITLE,
};
pub use state::{AppState, RunId, WorkflowSettings, WorkflowState, DEFAULT_SUCCESS_FLASH};
pub use update::update;
pub use view_model::{AppViewModel, RunProgress};
