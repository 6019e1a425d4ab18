use crate::record::FileRecord;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    pub recursive: bool,
    pub include_hidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub scanned: usize,
    pub skipped_hidden: usize,
}

#[derive(Debug, Clone)]
pub struct ScanResult {
    pub records: Vec<FileRecord>,
    pub stats: ScanStats,
}

/// Lists the files in `root`, sorted by path. Directories are never returned.
pub fn list_files(root: &Path, options: ScanOptions) -> Result<ScanResult> {
    let mut stats = ScanStats::default();
    let mut paths = Vec::<PathBuf>::new();

    if options.recursive {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("failed to walk folder: {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            push_path(entry.path().to_path_buf(), options, &mut stats, &mut paths);
        }
    } else {
        for entry in
            fs::read_dir(root).with_context(|| format!("could not read folder: {}", root.display()))?
        {
            let entry =
                entry.with_context(|| format!("failed to read entry in: {}", root.display()))?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            push_path(path, options, &mut stats, &mut paths);
        }
    }

    paths.sort();
    let records = paths.iter().map(|p| FileRecord::from_path(p)).collect();
    Ok(ScanResult { records, stats })
}

/// Records for an explicit selection, in the given order.
pub fn records_from_paths<P: AsRef<Path>>(paths: &[P]) -> Vec<FileRecord> {
    paths.iter().map(|p| FileRecord::from_path(p.as_ref())).collect()
}

fn push_path(path: PathBuf, options: ScanOptions, stats: &mut ScanStats, out: &mut Vec<PathBuf>) {
    stats.scanned += 1;
    if is_hidden(&path) && !options.include_hidden {
        stats.skipped_hidden += 1;
        return;
    }
    out.push(path);
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
