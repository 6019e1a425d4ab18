use crate::date::{classify_date, DateParts};
use crate::tokenizer::tokenize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Placeholder(Placeholder),
}

/// Indexes are 1-based as written in the template. Index 0 never resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Param(usize),
    Date(usize),
    Year(usize),
    Month(usize),
    Day(usize),
    Counter,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template cannot be empty")]
    Empty,
}

pub fn validate_template(input: &str) -> Result<(), TemplateError> {
    if input.trim().is_empty() {
        return Err(TemplateError::Empty);
    }
    Ok(())
}

/// Splits a template into literals and placeholders. Never fails: text after
/// `@` that is not a known placeholder stays literal.
pub fn parse_template(input: &str) -> Vec<TemplatePart> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut rest = input;

    while let Some(at) = rest.find('@') {
        literal.push_str(&rest[..at]);
        let after = &rest[at + 1..];
        match parse_placeholder(after) {
            Some((placeholder, consumed)) => {
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                parts.push(TemplatePart::Placeholder(placeholder));
                rest = &after[consumed..];
            }
            None => {
                literal.push('@');
                rest = after;
            }
        }
    }
    literal.push_str(rest);

    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }

    parts
}

/// Per-file inputs for rendering: the name's tokens and every date-like
/// token in scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTokens {
    pub tokens: Vec<String>,
    pub dates: Vec<DateParts>,
}

impl FileTokens {
    pub fn from_name(name: &str) -> Self {
        let tokens = tokenize(name);
        let dates = tokens.iter().filter_map(|t| classify_date(t)).collect();
        Self { tokens, dates }
    }
}

/// Expands `parts` for one file. `index` is the file's 0-based position in the
/// batch. Unresolvable placeholders become empty strings.
pub fn render_template(parts: &[TemplatePart], file: &FileTokens, index: usize) -> String {
    let mut output = String::new();
    for part in parts {
        match part {
            TemplatePart::Literal(s) => output.push_str(s),
            TemplatePart::Placeholder(placeholder) => {
                output.push_str(&resolve(placeholder, file, index));
            }
        }
    }
    output
}

pub fn format_counter(index: usize) -> String {
    format!("{:03}", index + 1)
}

fn resolve(placeholder: &Placeholder, file: &FileTokens, index: usize) -> String {
    let nth = |items_len: usize, n: usize| n.checked_sub(1).filter(|i| *i < items_len);
    let date = |n: usize| nth(file.dates.len(), n).map(|i| &file.dates[i]);

    let value = match *placeholder {
        Placeholder::Param(n) => nth(file.tokens.len(), n).map(|i| file.tokens[i].as_str()),
        Placeholder::Date(n) => date(n).map(|d| d.full.as_str()),
        Placeholder::Year(n) => date(n).map(|d| d.year.as_str()),
        Placeholder::Month(n) => date(n).map(|d| d.month.as_str()),
        Placeholder::Day(n) => date(n).map(|d| d.day.as_str()),
        Placeholder::Counter => return format_counter(index),
    };

    value.unwrap_or_default().to_string()
}

/// Parses the text right after an `@`. Returns the placeholder and how many
/// bytes it used.
fn parse_placeholder(input: &str) -> Option<(Placeholder, usize)> {
    if let Some(after) = input.strip_prefix("param") {
        let digits = leading_digits(after);
        if digits.is_empty() {
            return None;
        }
        return Some((Placeholder::Param(parse_index(digits)), 5 + digits.len()));
    }

    if starts_with_ignore_case(input, "counter") {
        return Some((Placeholder::Counter, 7));
    }

    let dated: [(&str, fn(usize) -> Placeholder); 4] = [
        ("date", Placeholder::Date),
        ("year", Placeholder::Year),
        ("month", Placeholder::Month),
        ("day", Placeholder::Day),
    ];
    for (keyword, make) in dated {
        if starts_with_ignore_case(input, keyword) {
            let digits = leading_digits(&input[keyword.len()..]);
            let n = if digits.is_empty() {
                1
            } else {
                parse_index(digits)
            };
            return Some((make(n), keyword.len() + digits.len()));
        }
    }

    None
}

fn starts_with_ignore_case(input: &str, keyword: &str) -> bool {
    input
        .get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
}

fn leading_digits(input: &str) -> &str {
    let end = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    &input[..end]
}

// Out-of-range numbers map to 0, which resolves to nothing.
fn parse_index(digits: &str) -> usize {
    digits.parse().unwrap_or(0)
}
