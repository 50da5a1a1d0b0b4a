#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a file to classify.
    FileSelected(crate::FileHandle),
    /// User clicked Classify.
    ClassifyClicked,
    /// User clicked Regenerate on a finished result.
    RegenerateClicked,
    /// User asked to save the raw result.
    DownloadClicked,
    /// Engine progress for the in-flight cycle.
    ClassifyProgress {
        cycle: crate::CycleId,
        received_bytes: u64,
    },
    /// Engine completion for a cycle: raw response bytes or the failure.
    ClassifyDone {
        cycle: crate::CycleId,
        result: Result<Vec<u8>, crate::ClassifyFailure>,
    },
}
