//! Text document open/save

use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextFileError {
    #[error("document not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read a UTF-8 text document
pub fn open_text_file(path: &Path) -> Result<String, TextFileError> {
    std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            TextFileError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            TextFileError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// Write a text document through a temporary file in the same directory,
/// then rename it into place, so a failed save never truncates the original.
pub fn save_text_file(path: &Path, text: &str) -> Result<(), TextFileError> {
    let write_err = |source| TextFileError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(text.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
