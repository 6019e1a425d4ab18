use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    pub name: String,
    pub path: Option<PathBuf>,
    pub size: Option<u64>,
    /// Milliseconds since the Unix epoch.
    pub last_modified: Option<i64>,
}

impl FileRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            size: None,
            last_modified: None,
        }
    }

    /// Builds a record for a file on disk. Missing metadata leaves `size` and
    /// `last_modified` empty instead of failing.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        let metadata = fs::metadata(path).ok();

        Self {
            name,
            path: Some(path.to_path_buf()),
            size: metadata.as_ref().map(|m| m.len()),
            last_modified: metadata.and_then(|m| modified_millis(&m)),
        }
    }

    /// Key used to merge selections: the path when known, the bare name otherwise.
    pub fn identity_key(&self) -> String {
        match &self.path {
            Some(path) => path.to_string_lossy().to_string(),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenameResult {
    pub old: String,
    pub new: String,
}

impl RenameResult {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

fn modified_millis(metadata: &fs::Metadata) -> Option<i64> {
    let time = metadata.modified().ok()?;
    let elapsed = time.duration_since(UNIX_EPOCH).ok()?;
    i64::try_from(elapsed.as_millis()).ok()
}
