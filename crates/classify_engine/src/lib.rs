//! Classifier engine: multipart submission to the classification endpoint and result export.
mod engine;
mod export;
mod submit;
mod types;

pub use engine::EngineHandle;
pub use export::{export_raw, ExportError, ExportSummary};
pub use submit::{
    ChannelProgressSink, ClassifySettings, Classifier, ProgressSink, ReqwestClassifier,
    DEFAULT_ENDPOINT,
};
pub use types::{
    ClassifyError, ClassifyOutput, CycleId, CycleProgress, EngineEvent, FailureKind,
    ResponseMetadata, Stage,
};
