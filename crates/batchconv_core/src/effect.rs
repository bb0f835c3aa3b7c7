use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start a batch over snapshot copies of the current selection.
    RunBatch {
        run_id: crate::RunId,
        inputs: Vec<String>,
        output_dir: String,
    },
    CancelBatch {
        run_id: crate::RunId,
    },
    /// (Re)start the success acknowledgment timer. Any pending timer is superseded.
    ArmSuccessTimer { generation: u64, delay: Duration },
}
