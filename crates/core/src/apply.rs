use crate::planner::{RenameCandidate, RenamePlan};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl OpOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }

    fn from_io(result: std::io::Result<()>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(err) => Self::failed(err.to_string()),
        }
    }
}

/// Filesystem collaborator. Each call handles one file and reports its own
/// outcome instead of failing the batch.
pub trait FileOps: Sync {
    fn rename_one(&self, from: &Path, to: &Path) -> OpOutcome;
    fn copy_one(&self, from: &Path, to: &Path) -> OpOutcome;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileOps;

impl FileOps for StdFileOps {
    fn rename_one(&self, from: &Path, to: &Path) -> OpOutcome {
        OpOutcome::from_io(fs::rename(from, to))
    }

    fn copy_one(&self, from: &Path, to: &Path) -> OpOutcome {
        OpOutcome::from_io(fs::copy(from, to).map(|_| ()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyMode {
    /// Rename every file next to its source.
    Rename,
    /// Copy every file into `output_dir` under its new name; sources stay untouched.
    CopyToFolder { output_dir: PathBuf },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemReport {
    pub old_path: Option<PathBuf>,
    pub new_path: Option<PathBuf>,
    pub outcome: OpOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApplyReport {
    pub items: Vec<ItemReport>,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped_unchanged: usize,
    pub output_dir: Option<PathBuf>,
}

impl ApplyReport {
    pub fn failures(&self) -> impl Iterator<Item = &ItemReport> {
        self.items.iter().filter(|item| !item.outcome.success)
    }

    fn tally(&mut self) {
        self.succeeded = self.items.iter().filter(|i| i.outcome.success).count();
        self.failed = self.items.len() - self.succeeded;
    }
}

/// `<source_dir>/renamed_files_YYYY-MM-DD`
pub fn default_copy_folder(source_dir: &Path, date: NaiveDate) -> PathBuf {
    source_dir.join(format!("renamed_files_{}", date.format("%Y-%m-%d")))
}

/// Carries out a plan file by file. Only setting up the output folder can
/// fail the call; per-file failures are recorded in the report and the rest
/// of the batch continues. Files already processed are never rolled back.
pub fn apply_plan(plan: &RenamePlan, mode: &ApplyMode, ops: &dyn FileOps) -> Result<ApplyReport> {
    let mut report = match mode {
        ApplyMode::Rename => rename_in_place(&plan.candidates, ops),
        ApplyMode::CopyToFolder { output_dir } => {
            fs::create_dir_all(output_dir).with_context(|| {
                format!("could not create output folder: {}", output_dir.display())
            })?;
            let mut report = copy_to_folder(&plan.candidates, output_dir, ops);
            report.output_dir = Some(output_dir.clone());
            report
        }
    };
    report.tally();

    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        skipped = report.skipped_unchanged,
        "applied rename plan"
    );
    for failure in report.failures() {
        warn!(
            path = ?failure.old_path,
            error = failure.outcome.error.as_deref().unwrap_or_default(),
            "file operation failed"
        );
    }

    Ok(report)
}

fn copy_to_folder(candidates: &[RenameCandidate], output_dir: &Path, ops: &dyn FileOps) -> ApplyReport {
    // Targets are claimed in input order before any copy starts, so parallel
    // copies never share a destination.
    let mut seen_targets = HashSet::<PathBuf>::new();
    let targets: Vec<std::result::Result<PathBuf, String>> = candidates
        .iter()
        .map(|candidate| claim_target(output_dir, &candidate.new_name, &mut seen_targets))
        .collect();

    let items = candidates
        .par_iter()
        .zip(targets.into_par_iter())
        .map(|(candidate, target)| {
            let Some(source) = candidate.record.path.as_deref() else {
                return missing_path(candidate, target.ok());
            };
            let target = match target {
                Ok(target) => target,
                Err(error) => {
                    return ItemReport {
                        old_path: Some(source.to_path_buf()),
                        new_path: None,
                        outcome: OpOutcome::failed(error),
                    }
                }
            };
            if target.exists() {
                return ItemReport {
                    old_path: Some(source.to_path_buf()),
                    new_path: Some(target.clone()),
                    outcome: OpOutcome::failed(format!(
                        "target already exists: {}",
                        target.display()
                    )),
                };
            }
            ItemReport {
                old_path: Some(source.to_path_buf()),
                outcome: ops.copy_one(source, &target),
                new_path: Some(target),
            }
        })
        .collect();

    ApplyReport {
        items,
        ..ApplyReport::default()
    }
}

/// Joins `new_name` onto `root` when it is a plain file name that no earlier
/// candidate in the batch already targets.
fn claim_target(
    root: &Path,
    new_name: &str,
    seen_targets: &mut HashSet<PathBuf>,
) -> std::result::Result<PathBuf, String> {
    if !is_plain_file_name(new_name) {
        return Err(format!("new name is not a plain file name: {new_name:?}"));
    }
    let target = root.join(new_name);
    if !seen_targets.insert(target.clone()) {
        return Err(format!("duplicate target in batch: {}", target.display()));
    }
    Ok(target)
}

fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return false;
    }
    Path::new(name).file_name() == Some(OsStr::new(name))
}

#[derive(Debug, Clone)]
struct StagedRename {
    slot: usize,
    original_path: PathBuf,
    target_path: PathBuf,
    temp_path: PathBuf,
}

/// Two phases: every source moves to a temporary name, then every temporary
/// moves to its target. Chains such as `a -> b, b -> c` therefore never
/// overwrite each other. A target that still exists when its turn comes is
/// refused and the file goes back to its original name.
fn rename_in_place(candidates: &[RenameCandidate], ops: &dyn FileOps) -> ApplyReport {
    let mut report = ApplyReport::default();
    let mut slots: Vec<Option<ItemReport>> = Vec::with_capacity(candidates.len());

    let sources: HashSet<PathBuf> = candidates
        .iter()
        .filter(|c| c.changed)
        .filter_map(|c| c.record.path.clone())
        .collect();

    let mut seen_targets = HashSet::<PathBuf>::new();
    let mut staged = Vec::<StagedRename>::new();
    for candidate in candidates {
        if !candidate.changed {
            report.skipped_unchanged += 1;
            continue;
        }
        let slot = slots.len();
        let Some(original) = candidate.record.path.clone() else {
            slots.push(Some(missing_path(candidate, None)));
            continue;
        };
        let parent = original.parent().unwrap_or_else(|| Path::new("."));
        let target = match claim_target(parent, &candidate.new_name, &mut seen_targets) {
            Ok(target) => target,
            Err(error) => {
                slots.push(Some(ItemReport {
                    old_path: Some(original),
                    new_path: None,
                    outcome: OpOutcome::failed(error),
                }));
                continue;
            }
        };

        if target.exists() && !sources.contains(&target) {
            slots.push(Some(ItemReport {
                outcome: OpOutcome::failed(format!(
                    "target already exists: {}",
                    target.display()
                )),
                old_path: Some(original),
                new_path: Some(target),
            }));
            continue;
        }

        let temp = temp_path_for(&original, slot);
        let outcome = ops.rename_one(&original, &temp);
        if outcome.success {
            slots.push(None);
            staged.push(StagedRename {
                slot,
                original_path: original,
                target_path: target,
                temp_path: temp,
            });
        } else {
            slots.push(Some(ItemReport {
                old_path: Some(original),
                new_path: Some(target),
                outcome,
            }));
        }
    }

    for entry in staged {
        // A batch file expected to move away may have failed to stage.
        let mut outcome = if entry.target_path.exists() {
            OpOutcome::failed(format!(
                "target already exists: {}",
                entry.target_path.display()
            ))
        } else {
            ops.rename_one(&entry.temp_path, &entry.target_path)
        };
        if !outcome.success {
            let restore = ops.rename_one(&entry.temp_path, &entry.original_path);
            if !restore.success {
                let first = outcome.error.unwrap_or_default();
                let second = restore.error.unwrap_or_default();
                outcome = OpOutcome::failed(format!(
                    "{first}; restoring {} also failed: {second}",
                    entry.original_path.display()
                ));
            }
        }
        slots[entry.slot] = Some(ItemReport {
            old_path: Some(entry.original_path),
            new_path: Some(entry.target_path),
            outcome,
        });
    }

    report.items = slots.into_iter().flatten().collect();
    report
}

fn missing_path(candidate: &RenameCandidate, new_path: Option<PathBuf>) -> ItemReport {
    ItemReport {
        old_path: None,
        new_path,
        outcome: OpOutcome::failed(format!(
            "no source path for {}",
            candidate.record.name
        )),
    }
}

fn temp_path_for(original_path: &Path, index: usize) -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let parent = original_path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = original_path
        .file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    parent.join(format!(".renamer_tmp_{}_{}_{}", now, index, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{generate_plan, PlanOptions};
    use crate::record::FileRecord;
    use crate::rules::RenameRule;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn plan_for(paths: &[PathBuf], template: &str) -> RenamePlan {
        let files: Vec<FileRecord> = paths.iter().map(|p| FileRecord::from_path(p)).collect();
        let options = PlanOptions {
            template: template.to_string(),
            ..PlanOptions::default()
        };
        generate_plan(&files, &options).expect("plan")
    }

    fn plan_with(paths: &[PathBuf], options: PlanOptions) -> RenamePlan {
        let files: Vec<FileRecord> = paths.iter().map(|p| FileRecord::from_path(p)).collect();
        generate_plan(&files, &options).expect("plan")
    }

    fn undeduped(template: &str) -> PlanOptions {
        PlanOptions {
            template: template.to_string(),
            rules: Vec::new(),
            resolve_collisions: false,
        }
    }

    fn write_files(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                fs::write(&path, name.as_bytes()).expect("write");
                path
            })
            .collect()
    }

    /// Fails every operation whose destination file name contains `needle`.
    struct FailingOps {
        needle: &'static str,
        calls: Mutex<Vec<PathBuf>>,
    }

    impl FileOps for FailingOps {
        fn rename_one(&self, from: &Path, to: &Path) -> OpOutcome {
            self.calls.lock().expect("lock").push(to.to_path_buf());
            if to.to_string_lossy().contains(self.needle) {
                return OpOutcome::failed("simulated failure");
            }
            StdFileOps.rename_one(from, to)
        }

        fn copy_one(&self, from: &Path, to: &Path) -> OpOutcome {
            if to.to_string_lossy().contains(self.needle) {
                return OpOutcome::failed("simulated failure");
            }
            StdFileOps.copy_one(from, to)
        }
    }

    #[test]
    fn rename_moves_files_next_to_source() {
        let temp = tempdir().expect("tempdir");
        let paths = write_files(temp.path(), &["IMG_20240105_01.jpg", "IMG_20240106_02.jpg"]);
        let plan = plan_for(&paths, "@date-@counter");

        let report = apply_plan(&plan, &ApplyMode::Rename, &StdFileOps).expect("apply");
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 0);
        assert!(temp.path().join("20240105-001.jpg").exists());
        assert!(temp.path().join("20240106-002.jpg").exists());
        assert!(!paths[0].exists());
    }

    #[test]
    fn rename_chain_does_not_clobber() {
        let temp = tempdir().expect("tempdir");
        let paths = write_files(temp.path(), &["b.txt", "c.txt"]);
        let mut plan = plan_for(&paths, "@param1");
        plan.candidates[0].new_name = "c.txt".to_string();
        plan.candidates[0].changed = true;
        plan.candidates[1].new_name = "d.txt".to_string();
        plan.candidates[1].changed = true;

        let report = apply_plan(&plan, &ApplyMode::Rename, &StdFileOps).expect("apply");
        assert_eq!(report.succeeded, 2);
        assert_eq!(fs::read(temp.path().join("c.txt")).expect("c"), b"b.txt");
        assert_eq!(fs::read(temp.path().join("d.txt")).expect("d"), b"c.txt");
    }

    #[test]
    fn one_failure_does_not_abort_batch() {
        let temp = tempdir().expect("tempdir");
        let paths = write_files(temp.path(), &["one-a.txt", "two-b.txt", "three-c.txt"]);
        let plan = plan_for(&paths, "@param2-@param1");
        let ops = FailingOps {
            needle: "b-two",
            calls: Mutex::new(Vec::new()),
        };

        let report = apply_plan(&plan, &ApplyMode::Rename, &ops).expect("apply");
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.items.len(), 3);
        assert!(!report.items[1].outcome.success);
        assert!(temp.path().join("a-one.txt").exists());
        assert!(temp.path().join("c-three.txt").exists());
        // The failed file is restored from its temporary name.
        assert!(paths[1].exists());
        assert!(!ops.calls.lock().expect("lock").is_empty());
    }

    #[test]
    fn existing_target_outside_batch_is_reported() {
        let temp = tempdir().expect("tempdir");
        let paths = write_files(temp.path(), &["x-1.txt"]);
        fs::write(temp.path().join("1.txt"), b"keep").expect("write blocker");
        let plan = plan_for(&paths, "@param2");

        let report = apply_plan(&plan, &ApplyMode::Rename, &StdFileOps).expect("apply");
        assert_eq!(report.failed, 1);
        assert!(paths[0].exists());
        assert_eq!(fs::read(temp.path().join("1.txt")).expect("read"), b"keep");
    }

    #[test]
    fn unchanged_candidates_are_skipped() {
        let temp = tempdir().expect("tempdir");
        let paths = write_files(temp.path(), &["same.txt"]);
        let plan = plan_for(&paths, "@param1");

        let report = apply_plan(&plan, &ApplyMode::Rename, &StdFileOps).expect("apply");
        assert_eq!(report.skipped_unchanged, 1);
        assert!(report.items.is_empty());
    }

    #[test]
    fn records_without_path_fail_individually() {
        let temp = tempdir().expect("tempdir");
        let mut paths = write_files(temp.path(), &["a-1.txt"]);
        paths.push(temp.path().join("placeholder"));
        let mut plan = plan_for(&paths, "@param2-@counter");
        plan.candidates[1].record.path = None;

        let report = apply_plan(&plan, &ApplyMode::Rename, &StdFileOps).expect("apply");
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert!(report.items[1].old_path.is_none());
    }

    #[test]
    fn copy_keeps_sources_and_reports_per_file() {
        let temp = tempdir().expect("tempdir");
        let paths = write_files(temp.path(), &["p-1.txt", "p-2.txt", "p-3.txt"]);
        let plan = plan_for(&paths, "copy-@param2");
        let output = temp.path().join("out");
        let ops = FailingOps {
            needle: "copy-2",
            calls: Mutex::new(Vec::new()),
        };

        let mode = ApplyMode::CopyToFolder {
            output_dir: output.clone(),
        };
        let report = apply_plan(&plan, &mode, &ops).expect("apply");
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.output_dir.as_deref(), Some(output.as_path()));
        assert!(output.join("copy-1.txt").exists());
        assert!(!output.join("copy-2.txt").exists());
        assert!(output.join("copy-3.txt").exists());
        assert!(paths.iter().all(|p| p.exists()));
        assert_eq!(
            report.items[2].new_path.as_deref(),
            Some(output.join("copy-3.txt").as_path())
        );
    }

    #[test]
    fn duplicate_targets_keep_first_file_only() {
        let temp = tempdir().expect("tempdir");
        let paths = write_files(temp.path(), &["x-1.txt", "x-2.txt"]);
        let plan = plan_with(&paths, undeduped("@param1"));
        assert_eq!(plan.candidates[0].new_name, plan.candidates[1].new_name);

        let report = apply_plan(&plan, &ApplyMode::Rename, &StdFileOps).expect("apply");
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert!(report.items[1]
            .outcome
            .error
            .as_deref()
            .unwrap_or_default()
            .contains("duplicate target"));
        assert_eq!(fs::read(temp.path().join("x.txt")).expect("x"), b"x-1.txt");
        assert_eq!(fs::read(&paths[1]).expect("x-2"), b"x-2.txt");
    }

    #[test]
    fn duplicate_targets_are_not_copied_twice() {
        let temp = tempdir().expect("tempdir");
        let paths = write_files(temp.path(), &["x-1.txt", "x-2.txt", "y-3.txt"]);
        let plan = plan_with(&paths, undeduped("@param1"));
        let output = temp.path().join("out");
        let mode = ApplyMode::CopyToFolder {
            output_dir: output.clone(),
        };

        let report = apply_plan(&plan, &mode, &StdFileOps).expect("apply");
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.items[1].outcome.success);
        assert_eq!(fs::read(output.join("x.txt")).expect("x"), b"x-1.txt");
        assert!(output.join("y.txt").exists());
    }

    #[test]
    fn target_left_behind_by_failed_staging_is_not_overwritten() {
        let temp = tempdir().expect("tempdir");
        let paths = write_files(temp.path(), &["a.txt", "b.txt"]);
        let mut plan = plan_for(&paths, "@param1");
        plan.candidates[0].new_name = "b.txt".to_string();
        plan.candidates[0].changed = true;
        plan.candidates[1].new_name = "c.txt".to_string();
        plan.candidates[1].changed = true;
        // Staging uses `_<slot>_<name>`, so only b.txt's temporary move fails.
        let ops = FailingOps {
            needle: "_1_b.txt",
            calls: Mutex::new(Vec::new()),
        };

        let report = apply_plan(&plan, &ApplyMode::Rename, &ops).expect("apply");
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 2);
        assert_eq!(fs::read(temp.path().join("a.txt")).expect("a"), b"a.txt");
        assert_eq!(fs::read(temp.path().join("b.txt")).expect("b"), b"b.txt");
        assert!(!temp.path().join("c.txt").exists());
        let left: Vec<_> = fs::read_dir(temp.path()).expect("read_dir").collect();
        assert_eq!(left.len(), 2);
    }

    #[test]
    fn names_leaving_the_folder_are_refused() {
        let temp = tempdir().expect("tempdir");
        let batch = temp.path().join("batch");
        fs::create_dir(&batch).expect("mkdir");
        let paths = write_files(&batch, &["x-1.txt"]);
        let options = PlanOptions {
            template: "@param1".to_string(),
            rules: vec![RenameRule::new("^", "../")],
            resolve_collisions: true,
        };
        let plan = plan_with(&paths, options);
        assert_eq!(plan.candidates[0].new_name, "../x.txt");

        let report = apply_plan(&plan, &ApplyMode::Rename, &StdFileOps).expect("apply");
        assert_eq!(report.failed, 1);
        assert!(report.items[0].new_path.is_none());
        assert!(paths[0].exists());
        assert!(!temp.path().join("x.txt").exists());
    }

    #[test]
    fn copy_refuses_nested_names() {
        let temp = tempdir().expect("tempdir");
        let paths = write_files(temp.path(), &["p-1.txt", "p-2.txt"]);
        let mut plan = plan_for(&paths, "@param2");
        plan.candidates[0].new_name = "2024/01.txt".to_string();
        let output = temp.path().join("out");
        let mode = ApplyMode::CopyToFolder {
            output_dir: output.clone(),
        };

        let report = apply_plan(&plan, &mode, &StdFileOps).expect("apply");
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert!(!output.join("2024").exists());
        assert!(output.join("2.txt").exists());
    }

    #[test]
    fn plain_file_names() {
        assert!(is_plain_file_name("photo (1).jpg"));
        assert!(is_plain_file_name(".bashrc"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("a/b.txt"));
        assert!(!is_plain_file_name("a\\b.txt"));
    }

    #[test]
    fn default_copy_folder_uses_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).expect("date");
        assert_eq!(
            default_copy_folder(Path::new("/data"), date),
            PathBuf::from("/data/renamed_files_2024-01-05")
        );
    }
}
