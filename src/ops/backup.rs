use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::io::storage::{Storage, StorageError, atomic_write};

/// Error type for export and import
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("not a valid backup file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("not a valid backup file: missing \"pending\" or \"done\"")]
    MissingKeys,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What an export did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written(PathBuf),
    /// Nothing has ever been saved, so nothing was written
    Empty,
}

/// Copy the stored document, byte for byte, to `dest`.
pub fn export<S: Storage>(storage: &S, key: &str, dest: &Path) -> Result<ExportOutcome, BackupError> {
    let Some(text) = storage.get(key)? else {
        return Ok(ExportOutcome::Empty);
    };
    atomic_write(dest, text.as_bytes()).map_err(|e| BackupError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;
    tracing::info!(path = %dest.display(), bytes = text.len(), "exported");
    Ok(ExportOutcome::Written(dest.to_path_buf()))
}

/// Check that text looks like a saved document: JSON whose `pending` and
/// `done` entries are present and truthy (not null, false, 0 or ""). Empty
/// lists pass. Item shapes are not inspected.
pub fn validate_backup(text: &str) -> Result<Value, BackupError> {
    let value: Value = serde_json::from_str(text)?;
    let present = |key: &str| value.get(key).is_some_and(truthy);
    if !present("pending") || !present("done") {
        return Err(BackupError::MissingKeys);
    }
    Ok(value)
}

/// Replace the stored document with the contents of `source`.
/// On any error the stored document is left as it was.
pub fn import<S: Storage>(storage: &S, key: &str, source: &Path) -> Result<(), BackupError> {
    let text = fs::read_to_string(source).map_err(|e| BackupError::Read {
        path: source.to_path_buf(),
        source: e,
    })?;
    let value = validate_backup(&text)?;
    storage.set(key, &serde_json::to_string(&value)?)?;
    tracing::info!(path = %source.display(), "imported");
    Ok(())
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
