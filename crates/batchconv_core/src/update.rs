use conv_logging::conv_debug;

use crate::{AppState, Effect, Msg, WorkflowState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputsPicked(Some(inputs)) => {
            // A run in flight keeps working on its own snapshot.
            state.set_inputs(normalize_paths(inputs));
            Vec::new()
        }
        Msg::OutputDirPicked(Some(dir)) => {
            state.set_output_dir(dir.trim().to_string());
            Vec::new()
        }
        Msg::InputsPicked(None) | Msg::OutputDirPicked(None) => Vec::new(),
        Msg::ConvertClicked => match state.workflow() {
            WorkflowState::Running => {
                conv_debug!("Convert ignored: a batch is already running");
                Vec::new()
            }
            WorkflowState::Idle | WorkflowState::ReportReady => {
                let (run_id, inputs, output_dir) = state.begin_run();
                vec![Effect::RunBatch {
                    run_id,
                    inputs,
                    output_dir,
                }]
            }
        },
        Msg::CancelClicked => match state.request_cancel() {
            Some(run_id) => vec![Effect::CancelBatch { run_id }],
            None => Vec::new(),
        },
        Msg::FileStarted {
            run_id,
            index,
            total,
            input,
        } => {
            state.apply_file_started(run_id, index, total, input);
            Vec::new()
        }
        Msg::FileFinished {
            run_id,
            index,
            succeeded,
        } => {
            state.apply_file_finished(run_id, index, succeeded);
            Vec::new()
        }
        Msg::BatchFinished { run_id, report } => {
            let failed = report.is_failure();
            if !state.finish_run(run_id, report) {
                conv_debug!("Ignoring result of stale run {}", run_id);
                return (state, Vec::new());
            }
            if failed {
                Vec::new()
            } else {
                let generation = state.raise_success_flag();
                vec![Effect::ArmSuccessTimer {
                    generation,
                    delay: state.settings().success_flash,
                }]
            }
        }
        Msg::ReportDismissed => {
            if state.workflow() == WorkflowState::ReportReady {
                state.dismiss_report();
            }
            Vec::new()
        }
        Msg::SuccessFlashExpired { generation } => {
            state.expire_success_flag(generation);
            Vec::new()
        }
    };

    (state, effects)
}

fn normalize_paths(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|path| path.trim().to_string())
        .filter(|path| !path.is_empty())
        .collect()
}
