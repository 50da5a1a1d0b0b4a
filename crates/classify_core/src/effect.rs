#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Submit the file to the classification endpoint as one multipart request.
    SubmitClassify {
        cycle: crate::CycleId,
        file: crate::FileHandle,
    },
    /// Save the raw payload of a finished cycle.
    SaveDownload { download: crate::DownloadHandle },
}
