//! Classifier core: pure upload/classify state machine, response decoding and view-model helpers.
mod decode;
mod effect;
mod handle;
mod msg;
mod state;
mod update;
mod view_model;

pub use decode::{decode_table, ClassificationResult};
pub use effect::Effect;
pub use handle::{DownloadHandle, HandleWatch, DOWNLOAD_FILE_NAME};
pub use msg::Msg;
pub use state::{AppState, ClassifyFailure, CycleId, FileHandle, Phase};
pub use update::update;
pub use view_model::{AppViewModel, TableView};
