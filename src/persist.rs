//! Shared file helpers for the JSON-backed stores.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

use crate::error::SgptError;

const JSON_EXTENSION: &str = "json";

static UNSAFE_CHARS: OnceLock<Regex> = OnceLock::new();

/// Maps a record key to a file stem that cannot escape the store directory.
pub(crate) fn sanitize_key(key: &str) -> String {
    let re = UNSAFE_CHARS
        .get_or_init(|| Regex::new(r"[^A-Za-z0-9 ._-]").expect("static regex is valid"));
    let cleaned = re.replace_all(key.trim(), "_").to_string();
    match cleaned.as_str() {
        "" => "_".to_string(),
        "." | ".." => cleaned.replace('.', "_"),
        _ => cleaned,
    }
}

pub(crate) fn json_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{}.{JSON_EXTENSION}", sanitize_key(key)))
}

/// Serializes `value` and replaces `path` in one rename, so readers only ever
/// see the previous or the new content.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), SgptError> {
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir)?;
    let payload = serde_json::to_vec_pretty(value)
        .map_err(|err| SgptError::corrupt(path, err))?;
    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(&payload)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| SgptError::Io(err.error))?;
    Ok(())
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SgptError> {
    let data = fs::read(path)?;
    serde_json::from_slice(&data).map_err(|err| SgptError::corrupt(path, err))
}

/// JSON files in `dir`, oldest modification first. A missing directory is empty.
pub(crate) fn json_files_by_mtime(dir: &Path) -> Result<Vec<PathBuf>, SgptError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(JSON_EXTENSION) {
            continue;
        }
        let modified = fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((modified, path));
    }
    files.sort();
    Ok(files.into_iter().map(|(_, path)| path).collect())
}
