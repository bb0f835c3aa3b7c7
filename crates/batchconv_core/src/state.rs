use std::time::Duration;

use crate::report::{present, BatchReport};
use crate::view_model::{AppViewModel, RunProgress};

pub type RunId = u64;

/// Default lifetime of the success acknowledgment.
pub const DEFAULT_SUCCESS_FLASH: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Running,
    ReportReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowSettings {
    /// How long `transient_success` stays set after a successful run.
    pub success_flash: Duration,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            success_flash: DEFAULT_SUCCESS_FLASH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ActiveRun {
    run_id: RunId,
    total: usize,
    started: usize,
    finished: usize,
    failed: usize,
    current_input: Option<String>,
    cancel_requested: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    settings: WorkflowSettings,
    inputs: Vec<String>,
    output_dir: String,
    workflow: WorkflowState,
    active: Option<ActiveRun>,
    last_run_id: RunId,
    report: Option<BatchReport>,
    transient_success: bool,
    flash_generation: u64,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: WorkflowSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> WorkflowSettings {
        self.settings
    }

    pub fn workflow(&self) -> WorkflowState {
        self.workflow
    }

    pub fn report(&self) -> Option<&BatchReport> {
        self.report.as_ref()
    }

    pub fn transient_success(&self) -> bool {
        self.transient_success
    }

    pub fn active_run_id(&self) -> Option<RunId> {
        self.active.as_ref().map(|run| run.run_id)
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            workflow: self.workflow,
            inputs: self.inputs.clone(),
            output_dir: self.output_dir.clone(),
            progress: self.active.as_ref().map(|run| RunProgress {
                run_id: run.run_id,
                total: run.total,
                started: run.started,
                finished: run.finished,
                failed: run.failed,
                current_input: run.current_input.clone(),
            }),
            cancel_pending: self
                .active
                .as_ref()
                .is_some_and(|run| run.cancel_requested),
            report: self.report.as_ref().map(present),
            transient_success: self.transient_success,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_inputs(&mut self, inputs: Vec<String>) {
        self.inputs = inputs;
        self.mark_dirty();
    }

    pub(crate) fn set_output_dir(&mut self, output_dir: String) {
        self.output_dir = output_dir;
        self.mark_dirty();
    }

    /// Moves to `Running` and returns the new run id together with the
    /// snapshot the run will operate on.
    pub(crate) fn begin_run(&mut self) -> (RunId, Vec<String>, String) {
        self.last_run_id += 1;
        let run_id = self.last_run_id;
        self.workflow = WorkflowState::Running;
        self.report = None;
        self.transient_success = false;
        self.active = Some(ActiveRun {
            run_id,
            total: self.inputs.len(),
            ..ActiveRun::default()
        });
        self.mark_dirty();
        (run_id, self.inputs.clone(), self.output_dir.clone())
    }

    /// Marks the active run as cancel-requested. Returns `None` when there is
    /// nothing to cancel or a cancel is already pending.
    pub(crate) fn request_cancel(&mut self) -> Option<RunId> {
        let run = self.active.as_mut()?;
        if run.cancel_requested {
            return None;
        }
        run.cancel_requested = true;
        let run_id = run.run_id;
        self.mark_dirty();
        Some(run_id)
    }

    fn active_run_mut(&mut self, run_id: RunId) -> Option<&mut ActiveRun> {
        self.active.as_mut().filter(|run| run.run_id == run_id)
    }

    pub(crate) fn apply_file_started(
        &mut self,
        run_id: RunId,
        index: usize,
        total: usize,
        input: String,
    ) {
        let Some(run) = self.active_run_mut(run_id) else {
            return;
        };
        run.total = total;
        run.started = run.started.max(index + 1);
        run.current_input = Some(input);
        self.mark_dirty();
    }

    pub(crate) fn apply_file_finished(&mut self, run_id: RunId, index: usize, succeeded: bool) {
        let Some(run) = self.active_run_mut(run_id) else {
            return;
        };
        // Each index is counted once.
        if index >= run.finished {
            run.finished = index + 1;
            if !succeeded {
                run.failed += 1;
            }
        }
        run.current_input = None;
        self.mark_dirty();
    }

    /// Stores the report for the active run. Returns `false` for stale runs.
    pub(crate) fn finish_run(&mut self, run_id: RunId, report: BatchReport) -> bool {
        if self.active_run_id() != Some(run_id) {
            return false;
        }
        self.active = None;
        self.workflow = WorkflowState::ReportReady;
        self.report = Some(report);
        self.mark_dirty();
        true
    }

    /// Sets the success flag and returns the generation of the timer that may clear it.
    pub(crate) fn raise_success_flag(&mut self) -> u64 {
        self.flash_generation += 1;
        self.transient_success = true;
        self.mark_dirty();
        self.flash_generation
    }

    pub(crate) fn expire_success_flag(&mut self, generation: u64) {
        if generation != self.flash_generation || !self.transient_success {
            return;
        }
        self.transient_success = false;
        self.mark_dirty();
    }

    pub(crate) fn dismiss_report(&mut self) {
        self.workflow = WorkflowState::Idle;
        self.report = None;
        self.mark_dirty();
    }
}
