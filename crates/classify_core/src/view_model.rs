use crate::{AppState, Phase};

/// Everything a front-end needs to draw one frame, derived from [`AppState`] alone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub file_name: Option<String>,
    /// File chosen while a cycle was in flight; applied once it resolves.
    pub deferred_file_name: Option<String>,
    pub file_selector_enabled: bool,
    pub classify_enabled: bool,
    pub busy: bool,
    pub received_bytes: Option<u64>,
    pub error_banner: Option<String>,
    pub table: Option<TableView>,
    pub actions_visible: bool,
    pub download_len: Option<usize>,
    pub download_name: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl AppViewModel {
    pub(crate) fn derive(state: &AppState) -> Self {
        let busy = state.is_busy();
        let download = state.download();
        Self {
            phase: state.phase(),
            file_name: state.selected_file().map(|file| file.name().to_string()),
            deferred_file_name: state
                .deferred_selection()
                .map(|file| file.name().to_string()),
            file_selector_enabled: !busy,
            classify_enabled: state.selected_file().is_some() && !busy,
            busy,
            received_bytes: state.received_bytes(),
            error_banner: state.error_message(),
            table: state.classification().map(|result| TableView {
                headers: result.headers.clone(),
                rows: result.rows.clone(),
            }),
            actions_visible: state.actions_visible(),
            download_len: download.map(|handle| handle.len()),
            download_name: download.map(|handle| handle.file_name()),
        }
    }
}
