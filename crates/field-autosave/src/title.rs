//! Title date-suffix normalization.

use chrono::{Datelike, Local, NaiveDate};

/// Normalize a title against today's local date: trim, strip any
/// previous date suffix, append `_YYMMDD`. Empty input stays empty.
///
/// Idempotent within a calendar day; re-applied on a later day the
/// suffix moves forward.
pub fn with_date_suffix(base: &str) -> String {
    with_date_suffix_on(base, Local::now().date_naive())
}

/// Date-injected variant for deterministic tests.
pub fn with_date_suffix_on(base: &str, date: NaiveDate) -> String {
    let trimmed = base.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{}_{}", strip_date_suffix(trimmed), yymmdd(date))
}

/// Drop trailing `_` + exactly 6 or 8 digit groups (previously applied
/// date or date+variant suffixes). Repeats so stacked suffixes collapse
/// to the bare title.
pub fn strip_date_suffix(mut s: &str) -> &str {
    while let Some(pos) = s.rfind('_') {
        let digits = &s[pos + 1..];
        if (digits.len() == 6 || digits.len() == 8)
            && digits.chars().all(|c| c.is_ascii_digit())
        {
            s = &s[..pos];
        } else {
            break;
        }
    }
    s
}

fn yymmdd(date: NaiveDate) -> String {
    format!("{:02}{:02}{:02}", date.year() % 100, date.month(), date.day())
}
