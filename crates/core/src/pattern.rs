use crate::date::is_date;
use crate::tokenizer::{detect_delimiter, tokenize};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Share of files that must agree before a position counts as stable.
pub const MAJORITY_THRESHOLD: f64 = 0.70;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternDescriptor {
    /// Majority token per position. Its length is the longest token count in the batch.
    pub tokens: Vec<String>,
    pub delimiter: String,
    pub stable: Vec<bool>,
    pub variable_indexes: BTreeSet<usize>,
    pub date_token_indexes: BTreeSet<usize>,
    pub majority_date_tokens: BTreeMap<usize, String>,
    pub is_uniform: bool,
    pub minority_count: usize,
    pub file_count: usize,
}

impl PatternDescriptor {
    /// First date position, for callers that only handle one date per name.
    pub fn date_token_index(&self) -> Option<usize> {
        self.date_token_indexes.iter().next().copied()
    }

    pub fn minority_ratio(&self) -> f64 {
        if self.file_count == 0 {
            return 0.0;
        }
        self.minority_count as f64 / self.file_count as f64
    }

    /// Template placeholder that refers to each position: `@paramN`, or
    /// `@date` for the first date position.
    pub fn placeholder_labels(&self) -> Vec<String> {
        let date_index = self.date_token_index();
        (0..self.tokens.len())
            .map(|idx| {
                if Some(idx) == date_index {
                    "@date".to_string()
                } else {
                    format!("@param{}", idx + 1)
                }
            })
            .collect()
    }
}

/// Infers the shared structure of a batch of filenames. Returns `None` for an
/// empty batch.
pub fn detect_pattern<S: AsRef<str>>(filenames: &[S]) -> Option<PatternDescriptor> {
    if filenames.is_empty() {
        return None;
    }

    let file_count = filenames.len();
    let parts: Vec<Vec<String>> = filenames.iter().map(|n| tokenize(n.as_ref())).collect();
    let majority_length = parts.iter().map(Vec::len).max().unwrap_or(0);

    let mut tokens = Vec::with_capacity(majority_length);
    let mut stable = Vec::with_capacity(majority_length);

    for p in 0..majority_length {
        let mut counts = HashMap::<&str, usize>::new();
        let mut max_freq = 0usize;
        let mut most_common = "";

        for file_parts in &parts {
            let Some(token) = file_parts.get(p) else {
                continue;
            };
            let count = counts.entry(token.as_str()).or_insert(0);
            *count += 1;
            // Strictly greater: the first value to reach the top count keeps it.
            if *count > max_freq {
                max_freq = *count;
                most_common = token.as_str();
            }
        }

        tokens.push(most_common.to_string());
        stable.push(max_freq == 0 || share(max_freq, file_count) >= MAJORITY_THRESHOLD);
    }

    let mut date_token_indexes = BTreeSet::new();
    let mut majority_date_tokens = BTreeMap::new();
    for (p, majority) in tokens.iter().enumerate() {
        if !is_date(majority) {
            continue;
        }
        let present: Vec<&String> = parts.iter().filter_map(|fp| fp.get(p)).collect();
        let dates = present.iter().filter(|t| is_date(t)).count();
        if share(dates, present.len()) >= MAJORITY_THRESHOLD {
            date_token_indexes.insert(p);
            majority_date_tokens.insert(p, majority.clone());
        }
    }

    let minority_count = parts
        .iter()
        .filter(|file_parts| {
            file_parts.len() != majority_length
                || (0..majority_length).any(|p| {
                    !date_token_indexes.contains(&p) && stable[p] && file_parts[p] != tokens[p]
                })
        })
        .count();

    let variable_indexes = (0..majority_length)
        .filter(|p| !stable[*p] && !date_token_indexes.contains(p))
        .collect();

    let descriptor = PatternDescriptor {
        delimiter: detect_delimiter(filenames[0].as_ref()),
        tokens,
        stable,
        variable_indexes,
        date_token_indexes,
        majority_date_tokens,
        is_uniform: minority_count == 0,
        minority_count,
        file_count,
    };

    debug!(
        files = file_count,
        positions = majority_length,
        minority = minority_count,
        dates = ?descriptor.date_token_indexes,
        "detected filename pattern"
    );

    Some(descriptor)
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64
}
