use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use classify_logging::{classify_debug, classify_info};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub output_path: PathBuf,
    pub byte_len: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("invalid export file name {0:?}")]
    InvalidFileName(String),
    #[error("download directory {dir:?} is not usable: {reason}")]
    DownloadDir { dir: PathBuf, reason: String },
    #[error("failed to write {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Save a classification payload exactly as received; nothing is re-serialized.
///
/// The payload lands in a temp file next to the target and is renamed over it, so
/// an earlier download is either kept whole or replaced whole.
pub fn export_raw(
    output_dir: &Path,
    file_name: &str,
    bytes: &[u8],
) -> Result<ExportSummary, ExportError> {
    if file_name.is_empty()
        || file_name == "."
        || file_name == ".."
        || file_name.contains(['/', '\\'])
    {
        return Err(ExportError::InvalidFileName(file_name.to_string()));
    }

    prepare_download_dir(output_dir)?;
    let output_path = output_dir.join(file_name);
    replace_file(output_dir, &output_path, bytes).map_err(|source| ExportError::Write {
        path: output_path.clone(),
        source,
    })?;
    classify_info!("Saved {} bytes to {:?}", bytes.len(), output_path);

    Ok(ExportSummary {
        output_path,
        byte_len: bytes.len() as u64,
    })
}

fn prepare_download_dir(dir: &Path) -> Result<(), ExportError> {
    let unusable = |reason: String| ExportError::DownloadDir {
        dir: dir.to_path_buf(),
        reason,
    };
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(unusable("not a directory".to_string())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            classify_debug!("Creating download directory {:?}", dir);
            fs::create_dir_all(dir).map_err(|err| unusable(err.to_string()))
        }
        Err(err) => Err(unusable(err.to_string())),
    }
}

fn replace_file(dir: &Path, target: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file_mut().sync_all()?;
    staged.persist(target).map_err(|err| err.error)?;
    Ok(())
}
