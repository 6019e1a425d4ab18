use crate::collision::resolve_collisions_with_report;
use crate::pattern::{detect_pattern, PatternDescriptor};
use crate::record::{FileRecord, RenameResult};
use crate::rules::{RenameRule, RuleSet};
use crate::template::{
    parse_template, render_template, validate_template, FileTokens, TemplateError, TemplatePart,
};
use crate::tokenizer::split_extension;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_TEMPLATE: &str = "@param1-@date-@counter";

#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub template: String,
    pub rules: Vec<RenameRule>,
    pub resolve_collisions: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            rules: Vec::new(),
            resolve_collisions: true,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("no files selected, so no pattern is available")]
    NoFiles,
    #[error(transparent)]
    Template(#[from] TemplateError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameCandidate {
    pub record: FileRecord,
    pub new_name: String,
    pub changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RenameStats {
    pub files: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub collisions_resolved: usize,
    pub minority_files: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenamePlan {
    pub pattern: PatternDescriptor,
    pub template: String,
    pub rules: Vec<RenameRule>,
    pub candidates: Vec<RenameCandidate>,
    pub stats: RenameStats,
}

impl RenamePlan {
    pub fn results(&self) -> Vec<RenameResult> {
        self.candidates
            .iter()
            .map(|c| RenameResult::new(c.record.name.clone(), c.new_name.clone()))
            .collect()
    }
}

pub fn generate_plan(files: &[FileRecord], options: &PlanOptions) -> Result<RenamePlan, PlanError> {
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    let pattern = detect_pattern(&names).ok_or(PlanError::NoFiles)?;
    generate_plan_with_pattern(files, pattern, options)
}

/// Plans against a pattern the caller already detected for `files`.
pub fn generate_plan_with_pattern(
    files: &[FileRecord],
    pattern: PatternDescriptor,
    options: &PlanOptions,
) -> Result<RenamePlan, PlanError> {
    if files.is_empty() {
        return Err(PlanError::NoFiles);
    }
    validate_template(&options.template)?;

    let parts = parse_template(&options.template);
    let rules = RuleSet::compile(&options.rules);

    let tentative: Vec<RenameResult> = files
        .iter()
        .enumerate()
        .map(|(index, record)| {
            RenameResult::new(record.name.clone(), expand_name(record, index, &parts, &rules))
        })
        .collect();

    let (results, collisions_resolved) = if options.resolve_collisions {
        let report = resolve_collisions_with_report(tentative);
        (report.results, report.renamed)
    } else {
        (tentative, 0)
    };

    let mut stats = RenameStats {
        files: files.len(),
        minority_files: pattern.minority_count,
        collisions_resolved,
        ..RenameStats::default()
    };

    let candidates: Vec<RenameCandidate> = files
        .iter()
        .zip(results)
        .map(|(record, result)| {
            let changed = result.new != record.name;
            if changed {
                stats.changed += 1;
            } else {
                stats.unchanged += 1;
            }
            RenameCandidate {
                record: record.clone(),
                new_name: result.new,
                changed,
            }
        })
        .collect();

    debug!(
        files = stats.files,
        changed = stats.changed,
        collisions = stats.collisions_resolved,
        "generated rename plan"
    );

    Ok(RenamePlan {
        pattern,
        template: options.template.clone(),
        rules: options.rules.clone(),
        candidates,
        stats,
    })
}

/// Builds the full new filename for one record: template, then rules, then
/// the original extension.
pub fn expand_name(
    record: &FileRecord,
    index: usize,
    parts: &[TemplatePart],
    rules: &RuleSet,
) -> String {
    let file = FileTokens::from_name(&record.name);
    let rendered = render_template(parts, &file, index);
    let base = rules.apply(&rendered);
    let (_, extension) = split_extension(&record.name);
    format!("{base}{extension}")
}

pub fn render_preview_sample(template: &str, rules: &[RenameRule], name: &str) -> String {
    let parts = parse_template(template);
    let rules = RuleSet::compile(rules);
    expand_name(&FileRecord::named(name), 0, &parts, &rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(names: &[&str]) -> Vec<FileRecord> {
        names.iter().map(|n| FileRecord::named(*n)).collect()
    }

    fn options(template: &str) -> PlanOptions {
        PlanOptions {
            template: template.to_string(),
            ..PlanOptions::default()
        }
    }

    #[test]
    fn plan_expands_date_scenario() {
        let files = records(&[
            "IMG_20240105_01.jpg",
            "IMG_20240106_02.jpg",
            "IMG_20240107_03.jpg",
        ]);
        let plan = generate_plan(&files, &options("@param1-@date-@counter")).expect("plan");
        let new_names: Vec<_> = plan.candidates.iter().map(|c| c.new_name.as_str()).collect();
        assert_eq!(
            new_names,
            vec!["IMG-20240105-001.jpg", "IMG-20240106-002.jpg", "IMG-20240107-003.jpg"]
        );
        assert_eq!(plan.pattern.date_token_index(), Some(1));
        assert_eq!(plan.stats.changed, 3);
    }

    #[test]
    fn plan_resolves_identical_names() {
        let files = records(&["a.txt", "a.txt"]);
        let plan = generate_plan(&files, &options("@param1")).expect("plan");
        let results = plan.results();
        assert_eq!(results[0], RenameResult::new("a.txt", "a.txt"));
        assert_eq!(results[1], RenameResult::new("a.txt", "a (1).txt"));
        assert_eq!(plan.stats.collisions_resolved, 1);
        assert_eq!(plan.stats.unchanged, 1);
    }

    #[test]
    fn plan_keeps_duplicates_when_resolution_disabled() {
        let files = records(&["x-1.txt", "x-2.txt"]);
        let opts = PlanOptions {
            template: "@param1".to_string(),
            rules: Vec::new(),
            resolve_collisions: false,
        };
        let plan = generate_plan(&files, &opts).expect("plan");
        assert_eq!(plan.candidates[0].new_name, plan.candidates[1].new_name);
    }

    #[test]
    fn no_extension_is_added_for_bare_names() {
        let files = records(&["report"]);
        let plan = generate_plan(&files, &options("@param1_final")).expect("plan");
        assert_eq!(plan.candidates[0].new_name, "report_final");
    }

    #[test]
    fn rules_run_after_template_and_before_extension() {
        let opts = PlanOptions {
            template: "@param1 @param2".to_string(),
            rules: vec![RenameRule::new(" ", "_"), RenameRule::new("jpg", "X")],
            resolve_collisions: true,
        };
        let plan = generate_plan(&records(&["holiday-beach.jpg"]), &opts).expect("plan");
        assert_eq!(plan.candidates[0].new_name, "holiday_beach.jpg");
    }

    #[test]
    fn empty_batch_is_refused() {
        let err = generate_plan(&[], &PlanOptions::default()).expect_err("must refuse");
        assert_eq!(err, PlanError::NoFiles);
    }

    #[test]
    fn blank_template_is_refused() {
        let err = generate_plan(&records(&["a.txt"]), &options("  ")).expect_err("must refuse");
        assert_eq!(err, PlanError::Template(TemplateError::Empty));
    }

    #[test]
    fn stats_report_minority_files() {
        let mut names: Vec<String> = (1..=8).map(|i| format!("doc_final_{i}.pdf")).collect();
        names.push("doc_draft_9.pdf".to_string());
        names.push("doc_old_10.pdf".to_string());
        let files: Vec<FileRecord> = names.iter().map(|n| FileRecord::named(n.as_str())).collect();
        let plan = generate_plan(&files, &options("@param3")).expect("plan");
        assert_eq!(plan.stats.minority_files, 2);
        assert!(!plan.pattern.is_uniform);
    }

    #[test]
    fn precomputed_pattern_is_carried_into_plan() {
        let files = records(&["cam-20240101-a.jpg", "cam-20240202-b.jpg"]);
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        let pattern = detect_pattern(&names).expect("pattern");

        let plan = generate_plan_with_pattern(&files, pattern.clone(), &options("@date_@param3"))
            .expect("plan");
        assert_eq!(plan.pattern, pattern);
        assert_eq!(plan.candidates[1].new_name, "20240202_b.jpg");

        let err = generate_plan_with_pattern(&[], pattern, &options("@date")).expect_err("empty");
        assert_eq!(err, PlanError::NoFiles);
    }

    #[test]
    fn preview_sample_renders_single_name() {
        let rendered = render_preview_sample(
            "@year-@month-@day_@param1",
            &[],
            "scan_20240301_page.pdf",
        );
        assert_eq!(rendered, "2024-03-01_scan.pdf");
    }
}
