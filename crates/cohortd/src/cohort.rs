//! Cohort identity parsing.
//!
//! A cohort is not stored as its own entity; it is derived from the name of
//! its schedule table. A table named `basic1_1_schedule` belongs to cohort
//! type "Basic", number "1.1".

use regex::Regex;
use std::sync::LazyLock;

static TABLE_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]+)(\d+)_(\d+)_schedule$").unwrap());

/// Cohort identity decoded from a schedule table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cohort {
    /// Cohort type with the first letter capitalized (e.g. "Basic")
    pub cohort_type: String,
    /// Dotted cohort number (e.g. "1.1")
    pub number: String,
}

impl Cohort {
    /// Parses a cohort from its schedule table name.
    ///
    /// Returns `None` if the name does not follow the
    /// `<lowercase-letters><major>_<minor>_schedule` convention.
    pub fn from_table_name(table: &str) -> Option<Self> {
        let caps = TABLE_NAME_REGEX.captures(table)?;
        let raw_type = caps.get(1)?.as_str();
        let major = caps.get(2)?.as_str();
        let minor = caps.get(3)?.as_str();

        Some(Self {
            cohort_type: capitalize(raw_type),
            number: format!("{major}.{minor}"),
        })
    }

    /// Human-readable label, e.g. "Cohort Basic 1.1".
    pub fn display_name(&self) -> String {
        format!("Cohort {} {}", self.cohort_type, self.number)
    }

    /// Cache key used for per-run student-list lookups, e.g. "Basic_1.1".
    pub fn cache_key(&self) -> String {
        format!("{}_{}", self.cohort_type, self.number)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
