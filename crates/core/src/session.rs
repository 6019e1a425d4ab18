use crate::pattern::{detect_pattern, PatternDescriptor};
use crate::planner::{
    generate_plan_with_pattern, PlanError, PlanOptions, RenamePlan, DEFAULT_TEMPLATE,
};
use crate::record::FileRecord;
use crate::rules::RenameRule;
use std::collections::HashMap;

/// Working state for one batch: selected files, the pattern detected from
/// them, the template and the rule list. The pattern is recomputed from
/// scratch whenever the file list changes.
#[derive(Debug, Clone)]
pub struct RenameSession {
    files: Vec<FileRecord>,
    pattern: Option<PatternDescriptor>,
    pub template: String,
    rules: Vec<RenameRule>,
    pub resolve_collisions: bool,
}

impl Default for RenameSession {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            pattern: None,
            template: DEFAULT_TEMPLATE.to_string(),
            rules: Vec::new(),
            resolve_collisions: true,
        }
    }
}

impl RenameSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn pattern(&self) -> Option<&PatternDescriptor> {
        self.pattern.as_ref()
    }

    pub fn rules(&self) -> &[RenameRule] {
        &self.rules
    }

    /// Merges `records` into the selection. A record whose key (path, or name
    /// when there is no path) is already present replaces the earlier one in
    /// place; new keys are appended.
    pub fn add_files(&mut self, records: impl IntoIterator<Item = FileRecord>) {
        let mut positions: HashMap<String, usize> = self
            .files
            .iter()
            .enumerate()
            .map(|(i, f)| (f.identity_key(), i))
            .collect();

        for record in records {
            let key = record.identity_key();
            match positions.get(&key) {
                Some(&i) => self.files[i] = record,
                None => {
                    positions.insert(key, self.files.len());
                    self.files.push(record);
                }
            }
        }
        self.refresh_pattern();
    }

    pub fn remove_file(&mut self, index: usize) -> Option<FileRecord> {
        if index >= self.files.len() {
            return None;
        }
        let removed = self.files.remove(index);
        self.refresh_pattern();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.pattern = None;
    }

    pub fn add_rule(&mut self, rule: RenameRule) {
        self.rules.push(rule);
    }

    pub fn remove_rule(&mut self, index: usize) -> Option<RenameRule> {
        (index < self.rules.len()).then(|| self.rules.remove(index))
    }

    pub fn options(&self) -> PlanOptions {
        PlanOptions {
            template: self.template.clone(),
            rules: self.rules.clone(),
            resolve_collisions: self.resolve_collisions,
        }
    }

    pub fn plan(&self) -> Result<RenamePlan, PlanError> {
        let pattern = self.pattern.clone().ok_or(PlanError::NoFiles)?;
        generate_plan_with_pattern(&self.files, pattern, &self.options())
    }

    fn refresh_pattern(&mut self) {
        let names: Vec<&str> = self.files.iter().map(|f| f.name.as_str()).collect();
        self.pattern = detect_pattern(&names);
    }
}
