use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use conv_logging::{conv_error, conv_info, conv_warn};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::progress::ChannelProgressSink;
use crate::{BatchError, BatchOrchestrator, EngineEvent, RunId};

enum EngineCommand {
    RunBatch {
        run_id: RunId,
        inputs: Vec<PathBuf>,
        output_dir: PathBuf,
    },
    Cancel {
        run_id: RunId,
    },
}

type ActiveRun = Arc<Mutex<Option<(RunId, CancellationToken)>>>;

/// Owns the worker thread that executes batches on a tokio runtime.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(orchestrator: BatchOrchestrator) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;

        thread::Builder::new()
            .name("batchconv-engine".to_string())
            .spawn(move || {
                let orchestrator = Arc::new(orchestrator);
                let active: ActiveRun = Arc::new(Mutex::new(None));
                while let Ok(command) = cmd_rx.recv() {
                    handle_command(&runtime, &orchestrator, &active, command, &event_tx);
                }
            })?;

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn run_batch(&self, run_id: RunId, inputs: Vec<PathBuf>, output_dir: PathBuf) {
        let _ = self.cmd_tx.send(EngineCommand::RunBatch {
            run_id,
            inputs,
            output_dir,
        });
    }

    pub fn cancel(&self, run_id: RunId) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { run_id });
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    orchestrator: &Arc<BatchOrchestrator>,
    active: &ActiveRun,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::RunBatch {
            run_id,
            inputs,
            output_dir,
        } => {
            let token = CancellationToken::new();
            {
                let Ok(mut slot) = active.lock() else {
                    return;
                };
                if let Some((running, _)) = slot.as_ref() {
                    conv_warn!("Batch {} rejected: batch {} is still running", run_id, running);
                    let _ = event_tx.send(EngineEvent::BatchCompleted {
                        run_id,
                        result: Err(BatchError::Busy { running: *running }),
                    });
                    return;
                }
                *slot = Some((run_id, token.clone()));
            }

            let orchestrator = orchestrator.clone();
            let active = active.clone();
            let event_tx = event_tx.clone();
            let sink = ChannelProgressSink::new(event_tx.clone());
            let batch = runtime.spawn(async move {
                orchestrator
                    .run_batch(run_id, inputs, output_dir, &sink, &token)
                    .await
            });
            runtime.spawn(async move {
                let result = match batch.await {
                    Ok(result) => result,
                    Err(err) => {
                        conv_error!("Batch {} crashed: {}", run_id, err);
                        Err(BatchError::Crashed {
                            reason: panic_reason(err),
                        })
                    }
                };
                // Free the slot before announcing completion so a follow-up run is accepted.
                if let Ok(mut slot) = active.lock() {
                    *slot = None;
                }
                let _ = event_tx.send(EngineEvent::BatchCompleted { run_id, result });
            });
        }
        EngineCommand::Cancel { run_id } => {
            let Ok(slot) = active.lock() else {
                return;
            };
            match slot.as_ref() {
                Some((current, token)) if *current == run_id => {
                    conv_info!("Cancelling batch {}", run_id);
                    token.cancel();
                }
                _ => conv_info!("Cancel for batch {} ignored: not running", run_id),
            }
        }
    }
}

fn panic_reason(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "batch task panicked".to_string()
    }
}
