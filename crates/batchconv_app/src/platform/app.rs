use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use anyhow::{bail, Context, Result};
use batchconv_core::{
    update, AppState, AppViewModel, Msg, ReportKind, ReportPayload, WorkflowState,
};
use clap::Parser;
use conv_logging::{conv_info, conv_warn};
use log::LevelFilter;

use super::cli::Cli;
use super::effects::EffectRunner;
use super::logging;
use super::settings::{self, AppSettings, SETTINGS_FILENAME};
use super::ui::console::{self, ConsoleCommand, ParseError};
use super::ui::render;

/// Everything the controller reacts to arrives on one channel.
pub enum ShellEvent {
    Msg(Msg),
    ShowStatus,
    Quit,
}

pub fn run_app() -> Result<ExitCode> {
    let cli = Cli::parse();
    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILENAME));

    if cli.init_settings {
        settings::write_default_settings(&settings_path)
            .with_context(|| format!("failed to write {}", settings_path.display()))?;
        println!("Wrote default settings to {}", settings_path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let (settings, settings_problem) = match settings::read_settings(&settings_path) {
        Ok(Some(settings)) => (settings, None),
        Ok(None) => (AppSettings::default(), None),
        Err(err) => (AppSettings::default(), Some(err)),
    };
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(settings.log_destination, level);
    if let Some(err) = settings_problem {
        conv_warn!(
            "Ignoring settings from {}: {}",
            settings_path.display(),
            err
        );
    }
    conv_info!(
        "Converter: {} (policy {:?})",
        settings.converter_program.display(),
        settings.failure_policy
    );

    let (tx, rx) = mpsc::channel();
    let effects =
        EffectRunner::new(&settings, tx.clone()).context("failed to start conversion engine")?;
    let mut controller = Controller::new(
        AppState::with_settings(settings.workflow_settings()),
        effects,
        rx,
    );

    if !cli.inputs.is_empty() {
        let picked = pick_archives(&cli.inputs, &settings.archive_extension);
        let _ = tx.send(ShellEvent::Msg(Msg::InputsPicked(picked)));
    }
    if let Some(output) = &cli.output {
        let dir = console::absolute(Path::new(output));
        let _ = tx.send(ShellEvent::Msg(Msg::OutputDirPicked(Some(dir))));
    }

    if cli.run {
        let _ = tx.send(ShellEvent::Msg(Msg::ConvertClicked));
        let report = controller.run_until_report()?;
        println!("{}", render::render_report(&report));
        return Ok(match report.kind {
            ReportKind::Success => ExitCode::SUCCESS,
            ReportKind::Failure => ExitCode::FAILURE,
        });
    }

    println!("{}", console::HELP);
    spawn_console_reader(tx, settings.archive_extension.clone());
    controller.run_interactive();
    Ok(ExitCode::SUCCESS)
}

/// Sole owner of the workflow state.
pub(crate) struct Controller {
    state: AppState,
    effects: EffectRunner,
    inbox: mpsc::Receiver<ShellEvent>,
}

impl Controller {
    pub(crate) fn new(
        state: AppState,
        effects: EffectRunner,
        inbox: mpsc::Receiver<ShellEvent>,
    ) -> Self {
        Self {
            state,
            effects,
            inbox,
        }
    }

    /// Applies a message, runs its effects and returns the new view if anything changed.
    fn dispatch(&mut self, msg: Msg) -> Option<AppViewModel> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        let view = state.view();
        self.state = state;
        self.effects.run(effects);
        was_dirty.then_some(view)
    }

    /// Processes events until the first report is ready and returns it.
    pub(crate) fn run_until_report(&mut self) -> Result<ReportPayload> {
        loop {
            match self.inbox.recv() {
                Ok(ShellEvent::Msg(msg)) => {
                    let Some(view) = self.dispatch(msg) else {
                        continue;
                    };
                    if view.workflow == WorkflowState::ReportReady {
                        if let Some(report) = view.report {
                            return Ok(report);
                        }
                    }
                }
                Ok(ShellEvent::ShowStatus) => {}
                Ok(ShellEvent::Quit) | Err(_) => bail!("stopped before the conversion finished"),
            }
        }
    }

    pub(crate) fn run_interactive(&mut self) {
        let mut last_workflow = self.state.workflow();
        while let Ok(event) = self.inbox.recv() {
            match event {
                ShellEvent::Msg(msg) => {
                    let Some(view) = self.dispatch(msg) else {
                        continue;
                    };
                    if view.workflow == WorkflowState::ReportReady
                        && last_workflow != WorkflowState::ReportReady
                    {
                        if let Some(report) = &view.report {
                            println!("{}", render::render_report(report));
                        }
                    }
                    last_workflow = view.workflow;
                    println!("{}", render::render_status(&view));
                }
                ShellEvent::ShowStatus => {
                    let view = self.state.view();
                    println!("{}", render::render_selection(&view));
                    println!("{}", render::render_status(&view));
                }
                ShellEvent::Quit => break,
            }
        }
        if self.state.workflow() == WorkflowState::Running {
            conv_warn!("Exiting while a conversion is still running");
        }
    }
}

/// Applies the archive extension filter. `None` when nothing usable was picked,
/// which leaves the current selection alone.
fn pick_archives(paths: &[String], extension: &str) -> Option<Vec<String>> {
    let (accepted, rejected) = console::filter_archives(paths, extension);
    for path in &rejected {
        conv_warn!("Skipping {}: not a .{} file", path, extension);
    }
    if accepted.is_empty() {
        None
    } else {
        Some(accepted)
    }
}

fn command_event(command: ConsoleCommand, extension: &str) -> Option<ShellEvent> {
    let msg = match command {
        ConsoleCommand::Pick(paths) => Msg::InputsPicked(pick_archives(&paths, extension)),
        ConsoleCommand::Output(dir) => {
            Msg::OutputDirPicked(Some(console::absolute(Path::new(&dir))))
        }
        ConsoleCommand::Convert => Msg::ConvertClicked,
        ConsoleCommand::Cancel => Msg::CancelClicked,
        ConsoleCommand::Dismiss => Msg::ReportDismissed,
        ConsoleCommand::Status => return Some(ShellEvent::ShowStatus),
        ConsoleCommand::Quit => return Some(ShellEvent::Quit),
        ConsoleCommand::Help => {
            println!("{}", console::HELP);
            return None;
        }
    };
    Some(ShellEvent::Msg(msg))
}

fn spawn_console_reader(tx: mpsc::Sender<ShellEvent>, extension: String) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let command = match console::parse_command(&line) {
                Ok(command) => command,
                Err(ParseError::Empty) => continue,
                Err(err) => {
                    eprintln!("{err}");
                    continue;
                }
            };
            let Some(event) = command_event(command, &extension) else {
                continue;
            };
            let quit = matches!(event, ShellEvent::Quit);
            if tx.send(event).is_err() || quit {
                return;
            }
        }
        let _ = tx.send(ShellEvent::Quit);
    });
}
