use chrono::{Datelike, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Earliest year accepted for date-like tokens.
pub const MIN_YEAR: i32 = 2000;

// ASCII digits only; `\d` would also accept other Unicode digits.
static COMPACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{4})([0-9]{2})([0-9]{2})$").unwrap());
static SEPARATED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{4})[-_]([0-9]{2})[-_]([0-9]{2})$").unwrap());
static COMPACT_WITH_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{4})([0-9]{2})([0-9]{2})[-_][0-9]{6}$").unwrap());

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DateFormat {
    /// `YYYYMMDD`
    Compact,
    /// `YYYY-MM-DD` or `YYYY_MM_DD`
    Separated,
    /// `YYYYMMDD-HHMMSS` or `YYYYMMDD_HHMMSS`
    CompactWithTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateParts {
    pub full: String,
    pub year: String,
    pub month: String,
    pub day: String,
    pub format: DateFormat,
}

pub fn is_date(token: &str) -> bool {
    classify_date(token).is_some()
}

pub fn classify_date(token: &str) -> Option<DateParts> {
    classify_date_in(token, Local::now().year())
}

/// Classifies `token` against the supported numeric date formats, accepting
/// years from [`MIN_YEAR`] through `current_year + 1`. The date-time format
/// skips the year check.
pub fn classify_date_in(token: &str, current_year: i32) -> Option<DateParts> {
    let year_ok = |year: &str| {
        year.parse::<i32>()
            .map(|y| (MIN_YEAR..=current_year + 1).contains(&y))
            .unwrap_or(false)
    };

    if let Some(caps) = COMPACT.captures(token) {
        if year_ok(&caps[1]) {
            return Some(parts(token, &caps, DateFormat::Compact));
        }
    }

    if let Some(caps) = SEPARATED.captures(token) {
        if year_ok(&caps[1]) {
            return Some(parts(token, &caps, DateFormat::Separated));
        }
    }

    COMPACT_WITH_TIME
        .captures(token)
        .map(|caps| parts(token, &caps, DateFormat::CompactWithTime))
}

fn parts(token: &str, caps: &regex::Captures<'_>, format: DateFormat) -> DateParts {
    DateParts {
        full: token.to_string(),
        year: caps[1].to_string(),
        month: caps[2].to_string(),
        day: caps[3].to_string(),
        format,
    }
}
