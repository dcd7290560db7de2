//! Validation messages and shared lexical checks
//!
//! Errors abort construction and are reported through
//! [`ValidationFailure`](crate::error::ValidationFailure); warnings are kept on
//! the component as [`ValidationMessage`] values.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};


/// Severity of a validation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A located validation message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationMessage {
    pub severity: Severity,
    pub text: String,
    pub locator: String,
}

impl ValidationMessage {
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            text: text.into(),
            locator: String::new(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
            locator: String::new(),
        }
    }

    /// Prefixes the locator with `/qualified_name`
    pub fn within(mut self, qualified_name: &str) -> Self {
        self.locator = format!("/{}{}", qualified_name, self.locator);
        self
    }
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.locator.is_empty() {
            write!(f, "[{}] {}", self.severity, self.text)
        } else {
            write!(f, "[{}] {}: {}", self.severity, self.locator, self.text)
        }
    }
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// The message for a child count outside `min..=max`, if it is outside
pub fn cardinality_message(name: &str, count: usize, min: usize, max: usize) -> Option<String> {
    if count >= min && count <= max {
        return None;
    }
    if min == max {
        Some(format!("Exactly {} {} element(s) must exist.", min, name))
    } else if count < min {
        Some(format!("At least {} {} element(s) must exist.", min, name))
    } else {
        Some(format!("No more than {} {} element(s) can exist.", max, name))
    }
}

static URI_PATTERN: OnceLock<Regex> = OnceLock::new();
static PERCENT_PATTERN: OnceLock<Regex> = OnceLock::new();
static YEAR_PATTERN: OnceLock<Regex> = OnceLock::new();
static YEAR_MONTH_PATTERN: OnceLock<Regex> = OnceLock::new();
static TIMEZONE_PATTERN: OnceLock<Regex> = OnceLock::new();

/// URI reference syntax: an optional scheme followed by characters allowed
/// in a reference, with well-formed percent escapes.
pub fn is_valid_uri(value: &str) -> bool {
    let uri = URI_PATTERN.get_or_init(|| {
        Regex::new(r#"^(?:[A-Za-z][A-Za-z0-9+.\-]*:)?[^\s<>"{}|\\^`]+$"#)
            .expect("Invalid URI regex")
    });
    let percent = PERCENT_PATTERN
        .get_or_init(|| Regex::new(r"%(?:[0-9A-Fa-f]{2})").expect("Invalid percent regex"));

    if value.is_empty() || value.starts_with(':') || !uri.is_match(value) {
        return false;
    }
    // every '%' must start an escape
    value.matches('%').count() == percent.find_iter(value).count()
}

pub fn parse_xs_boolean(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// A finite xs:decimal/xs:double value
pub fn parse_decimal(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

fn strip_timezone(value: &str) -> &str {
    let timezone = TIMEZONE_PATTERN
        .get_or_init(|| Regex::new(r"(?:Z|[+-]\d{2}:\d{2})$").expect("Invalid timezone regex"));
    match timezone.find(value) {
        Some(found) => &value[..found.start()],
        None => value,
    }
}

/// xs:date, with an optional timezone
pub fn is_xs_date(value: &str) -> bool {
    NaiveDate::parse_from_str(strip_timezone(value.trim()), "%Y-%m-%d").is_ok()
}

/// xs:date, xs:dateTime, xs:gYear or xs:gYearMonth
pub fn is_date_family(value: &str) -> bool {
    let value = value.trim();
    if is_xs_date(value) || DateTime::parse_from_rfc3339(value).is_ok() {
        return true;
    }

    let local = strip_timezone(value);
    if NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M:%S%.f").is_ok() {
        return true;
    }

    let year = YEAR_PATTERN.get_or_init(|| Regex::new(r"^-?\d{4,}$").expect("Invalid year regex"));
    let year_month = YEAR_MONTH_PATTERN
        .get_or_init(|| Regex::new(r"^-?\d{4,}-(0[1-9]|1[0-2])$").expect("Invalid month regex"));
    year.is_match(local) || year_month.is_match(local)
}
