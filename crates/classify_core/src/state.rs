use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use classify_logging::{classify_debug, classify_info, classify_warn};

use crate::decode::{decode_table, ClassificationResult};
use crate::handle::DownloadHandle;
use crate::view_model::AppViewModel;

/// Monotonic id of one classify cycle; completions carrying an older id are stale.
pub type CycleId = u64;

/// User-selected local file. Opaque to the core: it is only handed back out in effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    path: PathBuf,
    name: String,
}

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyFailure {
    /// Classify was requested before any file was selected.
    NoFileSelected,
    /// The submission never produced a response.
    Transport(String),
    /// The service answered with a non-success status.
    Service { status: u16, body: String },
}

impl fmt::Display for ClassifyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyFailure::NoFileSelected => write!(f, "Please select a CSV file."),
            ClassifyFailure::Transport(description) => write!(f, "{description}"),
            ClassifyFailure::Service { body, .. } => write!(f, "Failed to classify logs. {body}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Ready,
    Busy,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Workflow {
    #[default]
    Idle,
    Ready {
        file: FileHandle,
    },
    Busy {
        file: FileHandle,
        cycle: CycleId,
        received_bytes: u64,
        deferred_selection: Option<FileHandle>,
    },
    Succeeded {
        file: FileHandle,
        result: ClassificationResult,
        download: DownloadHandle,
    },
    Failed {
        file: Option<FileHandle>,
        failure: ClassifyFailure,
    },
}

/// Session state of the upload workflow. Only [`crate::update`] mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    workflow: Workflow,
    last_cycle: CycleId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::derive(self)
    }

    pub fn phase(&self) -> Phase {
        match self.workflow {
            Workflow::Idle => Phase::Idle,
            Workflow::Ready { .. } => Phase::Ready,
            Workflow::Busy { .. } => Phase::Busy,
            Workflow::Succeeded { .. } => Phase::Succeeded,
            Workflow::Failed { .. } => Phase::Failed,
        }
    }

    pub fn selected_file(&self) -> Option<&FileHandle> {
        match &self.workflow {
            Workflow::Idle => None,
            Workflow::Ready { file }
            | Workflow::Busy { file, .. }
            | Workflow::Succeeded { file, .. } => Some(file),
            Workflow::Failed { file, .. } => file.as_ref(),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.workflow, Workflow::Busy { .. })
    }

    pub fn failure(&self) -> Option<&ClassifyFailure> {
        match &self.workflow {
            Workflow::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.failure().map(ToString::to_string)
    }

    pub fn classification(&self) -> Option<&ClassificationResult> {
        match &self.workflow {
            Workflow::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn download(&self) -> Option<&DownloadHandle> {
        match &self.workflow {
            Workflow::Succeeded { download, .. } => Some(download),
            _ => None,
        }
    }

    /// Download and regenerate are offered only after a successful cycle.
    pub fn actions_visible(&self) -> bool {
        matches!(self.workflow, Workflow::Succeeded { .. })
    }

    pub fn in_flight_cycle(&self) -> Option<CycleId> {
        match self.workflow {
            Workflow::Busy { cycle, .. } => Some(cycle),
            _ => None,
        }
    }

    pub fn received_bytes(&self) -> Option<u64> {
        match self.workflow {
            Workflow::Busy { received_bytes, .. } => Some(received_bytes),
            _ => None,
        }
    }

    pub fn deferred_selection(&self) -> Option<&FileHandle> {
        match &self.workflow {
            Workflow::Busy {
                deferred_selection, ..
            } => deferred_selection.as_ref(),
            _ => None,
        }
    }

    /// Returns whether anything visible changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Replace the selected file and clear any previous outcome.
    ///
    /// While a cycle is in flight the selection is parked and applied when the
    /// cycle resolves.
    pub(crate) fn select_file(&mut self, file: FileHandle) {
        if let Workflow::Busy {
            deferred_selection,
            cycle,
            ..
        } = &mut self.workflow
        {
            classify_info!(
                "Selection of {:?} deferred until cycle {} resolves",
                file.path(),
                cycle
            );
            *deferred_selection = Some(file);
            self.mark_dirty();
            return;
        }
        classify_debug!("Selected {:?}", file.path());
        self.workflow = Workflow::Ready { file };
        self.mark_dirty();
    }

    /// Start a classify cycle for the selected file.
    ///
    /// Returns `None` when nothing should be submitted: either a cycle is already
    /// in flight, or there is no file (which records `NoFileSelected`).
    pub(crate) fn begin_cycle(&mut self) -> Option<(CycleId, FileHandle)> {
        if let Workflow::Busy { cycle, .. } = self.workflow {
            classify_debug!("Classify ignored: cycle {} still in flight", cycle);
            return None;
        }
        let Some(file) = self.selected_file().cloned() else {
            self.workflow = Workflow::Failed {
                file: None,
                failure: ClassifyFailure::NoFileSelected,
            };
            self.mark_dirty();
            return None;
        };

        // Dropping the previous workflow releases any download handle before the
        // request for the next one goes out.
        self.workflow = Workflow::Idle;
        self.last_cycle += 1;
        let cycle = self.last_cycle;
        self.workflow = Workflow::Busy {
            file: file.clone(),
            cycle,
            received_bytes: 0,
            deferred_selection: None,
        };
        self.mark_dirty();
        classify_info!("Cycle {} started for {:?}", cycle, file.path());
        Some((cycle, file))
    }

    pub(crate) fn apply_progress(&mut self, cycle: CycleId, bytes: u64) {
        if let Workflow::Busy {
            cycle: current,
            received_bytes,
            ..
        } = &mut self.workflow
        {
            if *current == cycle && *received_bytes != bytes {
                *received_bytes = bytes;
                self.mark_dirty();
            }
        }
    }

    /// Resolve the in-flight cycle. Completions for any other cycle are ignored.
    pub(crate) fn finish_cycle(&mut self, cycle: CycleId, outcome: Result<Vec<u8>, ClassifyFailure>) {
        let (file, deferred_selection) = match &mut self.workflow {
            Workflow::Busy {
                file,
                cycle: current,
                deferred_selection,
                ..
            } if *current == cycle => (file.clone(), deferred_selection.take()),
            _ => {
                classify_warn!("Ignoring completion of stale cycle {}", cycle);
                return;
            }
        };

        self.workflow = match outcome {
            Ok(bytes) => {
                let bytes: Arc<[u8]> = Arc::from(bytes);
                let result = decode_table(&bytes);
                classify_info!(
                    "Cycle {} succeeded: {} bytes, {} rows",
                    cycle,
                    bytes.len(),
                    result.rows.len()
                );
                Workflow::Succeeded {
                    file,
                    result,
                    download: DownloadHandle::new(cycle, bytes),
                }
            }
            Err(failure) => {
                classify_warn!("Cycle {} failed: {}", cycle, failure);
                Workflow::Failed {
                    file: Some(file),
                    failure,
                }
            }
        };
        self.mark_dirty();

        if let Some(file) = deferred_selection {
            self.select_file(file);
        }
    }
}
