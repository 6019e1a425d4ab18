use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenameRule {
    /// Regex source, or a plain substring when it does not compile.
    pub find: String,
    pub replace: String,
}

impl RenameRule {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
        }
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Regex(Regex),
    Literal(String),
}

#[derive(Debug, Clone)]
struct CompiledRule {
    matcher: Matcher,
    replace: String,
}

/// Ordered rules compiled once per batch.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    pub fn compile(rules: &[RenameRule]) -> Self {
        let rules = rules
            .iter()
            .filter(|rule| !rule.find.is_empty())
            .map(|rule| {
                let matcher = match Regex::new(&rule.find) {
                    Ok(re) => Matcher::Regex(re),
                    Err(err) => {
                        warn!(find = %rule.find, %err, "invalid rule pattern, matching literally");
                        Matcher::Literal(rule.find.clone())
                    }
                };
                CompiledRule {
                    matcher,
                    replace: rule.replace.clone(),
                }
            })
            .collect();
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs every rule in order, each replacing all matches in the output of
    /// the previous one.
    pub fn apply(&self, value: &str) -> String {
        let mut value = value.to_string();
        for rule in &self.rules {
            value = match &rule.matcher {
                Matcher::Regex(re) => re.replace_all(&value, rule.replace.as_str()).into_owned(),
                Matcher::Literal(find) => value.replace(find.as_str(), &rule.replace),
            };
        }
        value
    }
}

pub fn apply_rules(value: &str, rules: &[RenameRule]) -> String {
    RuleSet::compile(rules).apply(value)
}
