use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use batchconv_core::{BatchReport, Effect, FileOutcome, FileStatus, Msg};
use batchconv_engine::{
    BatchError, BatchOrchestrator, CommandConverter, EngineEvent, EngineHandle, FileStage,
    OutcomeStatus,
};
use conv_logging::{conv_debug, conv_info, conv_warn};

use super::app::ShellEvent;
use super::settings::AppSettings;
use super::timer::SuccessTimer;

const EVENT_POLL: Duration = Duration::from_millis(100);

/// Runs effects against the engine and the success timer, and forwards engine
/// events to the shell until dropped.
pub struct EffectRunner {
    engine: EngineHandle,
    timer: SuccessTimer,
    shutdown: Arc<AtomicBool>,
    event_loop: Option<JoinHandle<()>>,
}

impl EffectRunner {
    pub fn new(settings: &AppSettings, tx: mpsc::Sender<ShellEvent>) -> io::Result<Self> {
        let service = Arc::new(CommandConverter::new(settings.command_settings()));
        let orchestrator = BatchOrchestrator::new(service, settings.failure_policy());
        let engine = EngineHandle::new(orchestrator)?;

        let timer_tx = tx.clone();
        let timer = SuccessTimer::new(move |generation| {
            let _ = timer_tx.send(ShellEvent::Msg(Msg::SuccessFlashExpired { generation }));
        });

        let shutdown = Arc::new(AtomicBool::new(false));
        let event_loop = spawn_event_loop(engine.clone(), tx, shutdown.clone());
        Ok(Self {
            engine,
            timer,
            shutdown,
            event_loop: Some(event_loop),
        })
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::RunBatch {
                    run_id,
                    inputs,
                    output_dir,
                } => {
                    conv_info!(
                        "RunBatch run_id={} files={} output_dir={}",
                        run_id,
                        inputs.len(),
                        output_dir
                    );
                    self.engine.run_batch(
                        run_id,
                        inputs.into_iter().map(PathBuf::from).collect(),
                        PathBuf::from(output_dir),
                    );
                }
                Effect::CancelBatch { run_id } => {
                    conv_info!("CancelBatch run_id={}", run_id);
                    self.engine.cancel(run_id);
                }
                Effect::ArmSuccessTimer { generation, delay } => {
                    conv_debug!("ArmSuccessTimer generation={} delay={:?}", generation, delay);
                    self.timer.arm(generation, delay);
                }
            }
        }
    }

}

impl Drop for EffectRunner {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(event_loop) = self.event_loop.take() {
            if event_loop.join().is_err() {
                conv_warn!("Engine event loop panicked");
            }
        }
    }
}

// Exits on shutdown or once the shell stops listening, releasing its engine handle.
fn spawn_event_loop(
    engine: EngineHandle,
    tx: mpsc::Sender<ShellEvent>,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while !shutdown.load(Ordering::SeqCst) {
            let Some(event) = engine.recv_timeout(EVENT_POLL) else {
                continue;
            };
            if tx.send(ShellEvent::Msg(map_event(event))).is_err() {
                break;
            }
        }
        conv_debug!("Engine event loop stopped");
    })
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Progress(progress) => match progress.stage {
            FileStage::Started => Msg::FileStarted {
                run_id: progress.run_id,
                index: progress.index,
                total: progress.total,
                input: progress.input.to_string_lossy().into_owned(),
            },
            FileStage::Converted | FileStage::Failed => Msg::FileFinished {
                run_id: progress.run_id,
                index: progress.index,
                succeeded: progress.stage == FileStage::Converted,
            },
        },
        EngineEvent::BatchCompleted { run_id, result } => Msg::BatchFinished {
            run_id,
            report: map_result(result),
        },
    }
}

fn map_result(result: Result<batchconv_engine::BatchReport, BatchError>) -> BatchReport {
    match result {
        Ok(report) => BatchReport::Completed {
            outcomes: report
                .outcomes
                .into_iter()
                .map(|outcome| FileOutcome {
                    input: outcome.input.to_string_lossy().into_owned(),
                    status: match outcome.status {
                        OutcomeStatus::Success(text) => FileStatus::Converted(text),
                        OutcomeStatus::Failure(reason) => FileStatus::Failed(reason),
                    },
                })
                .collect(),
        },
        Err(err) => {
            conv_warn!("Batch failed: {}", err);
            BatchReport::Failed {
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchconv_engine::{BatchProgress, ConversionOutcome};

    #[test]
    fn successful_batch_maps_in_order() {
        let msg = map_event(EngineEvent::BatchCompleted {
            run_id: 2,
            result: Ok(batchconv_engine::BatchReport {
                outcomes: vec![
                    ConversionOutcome {
                        input: PathBuf::from("/a/one.elibz"),
                        status: OutcomeStatus::Success("OK:one".to_string()),
                    },
                    ConversionOutcome {
                        input: PathBuf::from("/a/two.elibz"),
                        status: OutcomeStatus::Failure("bad header".to_string()),
                    },
                ],
            }),
        });

        assert_eq!(
            msg,
            Msg::BatchFinished {
                run_id: 2,
                report: BatchReport::Completed {
                    outcomes: vec![
                        FileOutcome {
                            input: "/a/one.elibz".to_string(),
                            status: FileStatus::Converted("OK:one".to_string()),
                        },
                        FileOutcome {
                            input: "/a/two.elibz".to_string(),
                            status: FileStatus::Failed("bad header".to_string()),
                        },
                    ],
                },
            }
        );
    }

    #[test]
    fn aggregate_failure_keeps_only_reason() {
        let msg = map_event(EngineEvent::BatchCompleted {
            run_id: 1,
            result: Err(BatchError::AggregateFailure {
                input: PathBuf::from("/a/two.elibz"),
                reason: "bad header".to_string(),
            }),
        });

        assert_eq!(
            msg,
            Msg::BatchFinished {
                run_id: 1,
                report: BatchReport::Failed {
                    reason: "bad header".to_string(),
                },
            }
        );
    }

    #[test]
    fn cancelled_batch_is_a_failure_report() {
        let msg = map_event(EngineEvent::BatchCompleted {
            run_id: 1,
            result: Err(BatchError::Cancelled { completed: 1 }),
        });

        let Msg::BatchFinished { report, .. } = msg else {
            panic!("expected BatchFinished");
        };
        assert!(report.is_failure());
    }

    #[test]
    fn dropping_runner_releases_shell_channel() {
        let (tx, rx) = mpsc::channel();
        let runner = EffectRunner::new(&AppSettings::default(), tx).expect("runner");

        drop(runner);

        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(2)),
            Err(mpsc::RecvTimeoutError::Disconnected)
        ));
    }

    #[test]
    fn busy_engine_rejection_is_a_failure_report() {
        let msg = map_event(EngineEvent::BatchCompleted {
            run_id: 4,
            result: Err(BatchError::Busy { running: 3 }),
        });

        assert_eq!(
            msg,
            Msg::BatchFinished {
                run_id: 4,
                report: BatchReport::Failed {
                    reason: "batch 3 is still running".to_string(),
                },
            }
        );
    }

    #[test]
    fn progress_maps_to_file_messages() {
        let progress = |stage| {
            EngineEvent::Progress(BatchProgress {
                run_id: 3,
                index: 1,
                total: 4,
                input: PathBuf::from("/a/two.elibz"),
                stage,
            })
        };

        assert_eq!(
            map_event(progress(FileStage::Started)),
            Msg::FileStarted {
                run_id: 3,
                index: 1,
                total: 4,
                input: "/a/two.elibz".to_string(),
            }
        );
        assert_eq!(
            map_event(progress(FileStage::Failed)),
            Msg::FileFinished {
                run_id: 3,
                index: 1,
                succeeded: false,
            }
        );
    }
}
