//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

fn io_error(e: std::io::Error, operation: &str) -> Error {
    Error::internal_io(e.to_string(), Some(operation.to_string()))
}

pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| io_error(e, operation))
}

/// Write content to file atomically (write to .tmp, then rename).
pub fn write_file_atomic(path: &Path, content: &str, operation: &str) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some(operation.to_string()),
        )
    })?;

    let filename = path.file_name().ok_or_else(|| {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some(operation.to_string()),
        )
    })?;

    let tmp_path = parent.join(format!("{}.tmp", filename.to_string_lossy()));

    fs::write(&tmp_path, content)
        .map_err(|e| io_error(e, &format!("{} (write temp)", operation)))?;

    fs::rename(&tmp_path, path).map_err(|e| io_error(e, &format!("{} (rename)", operation)))?;

    Ok(())
}

/// Copy a file, creating the destination's parent directories.
pub fn copy_file(from: &Path, to: &Path, operation: &str) -> Result<u64> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error(e, operation))?;
    }
    fs::copy(from, to).map_err(|e| io_error(e, operation))
}
