use crate::error::{ApplyError, Result};
use crate::markers::file_stamp;
use crate::models::{DecisionRecord, SuggestionBatch};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

pub fn load_suggestions(path: &Path) -> Result<SuggestionBatch> {
    if !path.exists() {
        return Err(ApplyError::SuggestionsNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn stamped_path(dir: &Path, file_id: &str, now: DateTime<Utc>, ext: &str) -> PathBuf {
    let mut path = PathBuf::from(dir);
    path.push(format!("{file_id}.{}.{ext}", file_stamp(now)));
    path
}

/// Writes the untouched remote content next to earlier backups of the same file.
pub fn write_backup(
    dir: &Path,
    file_id: &str,
    content: &str,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let path = stamped_path(dir, file_id, now, "md");
    fs::write(&path, content)?;
    Ok(path)
}

pub fn write_records(
    dir: &Path,
    file_id: &str,
    records: &[DecisionRecord],
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let path = stamped_path(dir, file_id, now, "json");
    let content = serde_json::to_string_pretty(records)?;
    fs::write(&path, content)?;
    Ok(path)
}
