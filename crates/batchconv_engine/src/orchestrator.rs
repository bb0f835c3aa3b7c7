use std::path::PathBuf;
use std::sync::Arc;

use conv_logging::{conv_info, conv_warn};
use tokio_util::sync::CancellationToken;

use crate::{
    BatchError, BatchProgress, BatchReport, ConversionOutcome, ConversionRequest,
    ConversionService, EngineEvent, FailureKind, FileStage, OutcomeStatus, ProgressSink, RunId,
};

/// What to do with the rest of the batch once one file fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failure and report only its reason.
    /// Files converted earlier keep their output on disk but are not reported.
    #[default]
    AbortOnFirstFailure,
    /// Attempt every file and record failures next to successes.
    ContinueOnFailure,
}

/// Drives one conversion call per input, strictly in selection order,
/// with at most one call in flight.
#[derive(Clone)]
pub struct BatchOrchestrator {
    service: Arc<dyn ConversionService>,
    policy: FailurePolicy,
}

impl BatchOrchestrator {
    pub fn new(service: Arc<dyn ConversionService>, policy: FailurePolicy) -> Self {
        Self { service, policy }
    }

    /// Runs the batch over owned snapshots of the selection and output target.
    pub async fn run_batch(
        &self,
        run_id: RunId,
        inputs: Vec<PathBuf>,
        output_dir: PathBuf,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, BatchError> {
        let total = inputs.len();
        conv_info!(
            "Batch {} starting: {} file(s) -> {}",
            run_id,
            total,
            output_dir.display()
        );

        let mut outcomes = Vec::with_capacity(total);
        for (index, input) in inputs.into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(self.cancelled(run_id, outcomes.len()));
            }

            let progress = |stage| {
                EngineEvent::Progress(BatchProgress {
                    run_id,
                    index,
                    total,
                    input: input.clone(),
                    stage,
                })
            };
            sink.emit(progress(FileStage::Started));

            let request = ConversionRequest {
                input: input.clone(),
                output_dir: output_dir.clone(),
                symbol_file: None,
            };
            match self.service.convert(&request, cancel).await {
                Ok(text) => {
                    conv_info!("[{}/{}] {} converted", index + 1, total, input.display());
                    sink.emit(progress(FileStage::Converted));
                    outcomes.push(ConversionOutcome {
                        input,
                        status: OutcomeStatus::Success(text),
                    });
                }
                Err(err) if err.kind == FailureKind::Cancelled => {
                    return Err(self.cancelled(run_id, outcomes.len()));
                }
                Err(err) => {
                    conv_warn!(
                        "[{}/{}] {} failed ({}): {}",
                        index + 1,
                        total,
                        input.display(),
                        err.kind,
                        err.message
                    );
                    sink.emit(progress(FileStage::Failed));
                    match self.policy {
                        FailurePolicy::AbortOnFirstFailure => {
                            conv_warn!(
                                "Batch {} aborted; {} earlier file(s) not reported",
                                run_id,
                                outcomes.len()
                            );
                            return Err(BatchError::AggregateFailure {
                                input,
                                reason: err.message,
                            });
                        }
                        FailurePolicy::ContinueOnFailure => outcomes.push(ConversionOutcome {
                            input,
                            status: OutcomeStatus::Failure(err.message),
                        }),
                    }
                }
            }
        }

        let report = BatchReport { outcomes };
        conv_info!(
            "Batch {} finished: {} file(s), {} failed",
            run_id,
            report.len(),
            report.failure_count()
        );
        Ok(report)
    }

    fn cancelled(&self, run_id: RunId, completed: usize) -> BatchError {
        conv_info!("Batch {} cancelled after {} file(s)", run_id, completed);
        BatchError::Cancelled { completed }
    }
}
