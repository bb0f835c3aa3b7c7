#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// File picker closed. `None` means the user cancelled and the selection stays as is.
    InputsPicked(Option<Vec<String>>),
    /// Directory picker closed. `None` means the user cancelled.
    OutputDirPicked(Option<String>),
    /// User clicked Convert.
    ConvertClicked,
    /// User asked to abort the running batch.
    CancelClicked,
    /// Engine began converting one input.
    FileStarted {
        run_id: crate::RunId,
        index: usize,
        total: usize,
        input: String,
    },
    /// Engine finished one input, successfully or not.
    FileFinished {
        run_id: crate::RunId,
        index: usize,
        succeeded: bool,
    },
    /// Engine finished the whole batch.
    BatchFinished {
        run_id: crate::RunId,
        report: crate::BatchReport,
    },
    /// User closed the report.
    ReportDismissed,
    /// The success acknowledgment timer fired.
    SuccessFlashExpired { generation: u64 },
}
