use batchconv_core::{AppViewModel, ReportKind, ReportPayload, WorkflowState};

pub fn render_status(view: &AppViewModel) -> String {
    let state_label = match view.workflow {
        WorkflowState::Idle => "Idle",
        WorkflowState::Running => "Running",
        WorkflowState::ReportReady => "Report ready",
    };
    let output = if view.output_dir.is_empty() {
        "(not chosen)"
    } else {
        view.output_dir.as_str()
    };

    let mut text = format!(
        "State: {} | Files: {} | Output: {}",
        state_label,
        view.inputs.len(),
        output
    );

    if let Some(progress) = &view.progress {
        text.push_str(&format!(
            " | Done {}/{}",
            progress.finished, progress.total
        ));
        if progress.failed > 0 {
            text.push_str(&format!(" | Failed {}", progress.failed));
        }
        if let Some(current) = &progress.current_input {
            text.push_str(&format!(" | Converting {current}"));
        }
    }
    if view.cancel_pending {
        text.push_str(" | Cancelling...");
    }
    if view.transient_success {
        text.push_str(" | Conversion complete");
    }
    text
}

pub fn render_report(payload: &ReportPayload) -> String {
    let marker = match payload.kind {
        ReportKind::Success => "OK",
        ReportKind::Failure => "FAILED",
    };
    let rule = "=".repeat(60);
    let mut text = format!("{rule}\n{} [{}]\n{rule}\n", payload.title, marker);
    if !payload.body.is_empty() {
        text.push_str(&payload.body);
        text.push('\n');
    }
    text.push_str(&rule);
    text
}

pub fn render_selection(view: &AppViewModel) -> String {
    if view.inputs.is_empty() {
        return "No archives selected".to_string();
    }
    view.inputs
        .iter()
        .enumerate()
        .map(|(index, input)| format!("  {}. {}", index + 1, input))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchconv_core::{RunProgress, REPORT_TITLE};

    #[test]
    fn idle_status_without_output() {
        let view = AppViewModel::default();

        assert_eq!(
            render_status(&view),
            "State: Idle | Files: 0 | Output: (not chosen)"
        );
    }

    #[test]
    fn running_status_shows_progress() {
        let view = AppViewModel {
            workflow: WorkflowState::Running,
            inputs: vec!["/a/one.elibz".to_string(), "/a/two.elibz".to_string()],
            output_dir: "/out".to_string(),
            progress: Some(RunProgress {
                run_id: 1,
                total: 2,
                started: 2,
                finished: 1,
                failed: 0,
                current_input: Some("/a/two.elibz".to_string()),
            }),
            cancel_pending: true,
            ..AppViewModel::default()
        };

        assert_eq!(
            render_status(&view),
            "State: Running | Files: 2 | Output: /out | Done 1/2 | Converting /a/two.elibz | Cancelling..."
        );
    }

    #[test]
    fn failures_are_counted_in_status() {
        let view = AppViewModel {
            workflow: WorkflowState::Running,
            progress: Some(RunProgress {
                run_id: 1,
                total: 3,
                started: 3,
                finished: 2,
                failed: 1,
                current_input: None,
            }),
            ..AppViewModel::default()
        };

        assert!(render_status(&view).ends_with("| Done 2/3 | Failed 1"));
    }

    #[test]
    fn success_flag_is_visible() {
        let view = AppViewModel {
            workflow: WorkflowState::ReportReady,
            transient_success: true,
            ..AppViewModel::default()
        };

        assert!(render_status(&view).ends_with("| Conversion complete"));
    }

    #[test]
    fn report_frames_body() {
        let payload = ReportPayload {
            title: REPORT_TITLE.to_string(),
            body: "Conversion failed: bad header".to_string(),
            kind: ReportKind::Failure,
        };

        let text = render_report(&payload);

        assert!(text.contains("Conversion result [FAILED]"));
        assert!(text.contains("Conversion failed: bad header\n"));
    }

    #[test]
    fn selection_is_numbered() {
        let view = AppViewModel {
            inputs: vec!["/a/one.elibz".to_string(), "/a/two.elibz".to_string()],
            ..AppViewModel::default()
        };

        assert_eq!(
            render_selection(&view),
            "  1. /a/one.elibz\n  2. /a/two.elibz"
        );
    }
}
