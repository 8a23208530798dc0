//! Fuzzy matching of untagged recording files to past sessions.
//!
//! The capture date embedded in provider-generated filenames is the hard
//! gate; subject similarity is only consulted among same-day candidates.

use crate::drive::Recording;
use chrono::NaiveDate;

/// Finds the recording for a session dated `date` with the reconstructed
/// meeting subject `subject`.
///
/// Rules, in order:
/// 1. Hard gate: the filename must contain the session date as a
///    `YYYYMMDD` substring. Non-matching files are never considered.
/// 2. Prefix rule: the lower-cased filename starts with the lower-cased
///    subject. First hit in listing order wins.
/// 3. All-parts rule: split the subject on " - "; accept a filename
///    containing every part (lower-cased) as a substring anywhere.
///    First hit in listing order wins.
///
/// Ties among multiple same-day recordings resolve by listing order with
/// no secondary ranking; a known misassignment risk, kept as observed.
pub fn match_recording<'a>(
    recordings: &'a [Recording],
    subject: &str,
    date: NaiveDate,
) -> Option<&'a Recording> {
    let date_key = date.format("%Y%m%d").to_string();
    let candidates: Vec<&Recording> = recordings
        .iter()
        .filter(|r| r.name.contains(&date_key))
        .collect();

    let subject_lower = subject.to_lowercase();
    if let Some(hit) = candidates
        .iter()
        .copied()
        .find(|r| r.name.to_lowercase().starts_with(&subject_lower))
    {
        return Some(hit);
    }

    let parts: Vec<String> = subject
        .split(" - ")
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        return None;
    }

    candidates
        .into_iter()
        .find(|r| {
            let name = r.name.to_lowercase();
            parts.iter().all(|part| name.contains(part))
        })
}
