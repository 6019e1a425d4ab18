use crate::record::RenameResult;
use crate::tokenizer::split_extension;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionReport {
    pub results: Vec<RenameResult>,
    pub renamed: usize,
}

pub fn resolve_collisions(results: Vec<RenameResult>) -> Vec<RenameResult> {
    resolve_collisions_with_report(results).results
}

/// Makes every `new` name unique in input order by inserting ` (n)` before the
/// extension. Resolved names are reserved immediately, so later duplicates
/// also avoid them.
pub fn resolve_collisions_with_report(results: Vec<RenameResult>) -> CollisionReport {
    let mut used = HashSet::<String>::with_capacity(results.len());
    let mut renamed = 0usize;

    let results = results
        .into_iter()
        .map(|item| {
            let resolved = unique_name(&item.new, &used);
            if resolved != item.new {
                renamed += 1;
            }
            used.insert(resolved.clone());
            RenameResult {
                old: item.old,
                new: resolved,
            }
        })
        .collect();

    CollisionReport { results, renamed }
}

fn unique_name(name: &str, used: &HashSet<String>) -> String {
    if !used.contains(name) {
        return name.to_string();
    }

    let (base, ext) = split_extension(name);
    let mut n = 1usize;
    loop {
        let candidate = format!("{base} ({n}){ext}");
        if !used.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
