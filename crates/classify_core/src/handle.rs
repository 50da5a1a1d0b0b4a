use std::sync::{Arc, Weak};

use crate::CycleId;

/// Default name offered when the raw classification payload is saved.
pub const DOWNLOAD_FILE_NAME: &str = "classified_logs.csv";

/// Reference to the raw bytes returned by one successful classify cycle.
///
/// The table shown to the user is decoded from the same buffer, so a saved
/// download always matches what was displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadHandle {
    cycle: CycleId,
    bytes: Arc<[u8]>,
}

impl DownloadHandle {
    pub(crate) fn new(cycle: CycleId, bytes: Arc<[u8]>) -> Self {
        Self { cycle, bytes }
    }

    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn file_name(&self) -> &'static str {
        DOWNLOAD_FILE_NAME
    }

    /// Observe whether this handle's buffer is still held by anyone.
    pub fn watch(&self) -> HandleWatch {
        HandleWatch {
            cycle: self.cycle,
            bytes: Arc::downgrade(&self.bytes),
        }
    }
}

/// Weak observer of a [`DownloadHandle`]; does not keep the buffer alive.
#[derive(Debug, Clone)]
pub struct HandleWatch {
    cycle: CycleId,
    bytes: Weak<[u8]>,
}

impl HandleWatch {
    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    pub fn is_live(&self) -> bool {
        self.bytes.strong_count() > 0
    }
}
