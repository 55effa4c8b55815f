//! Derives the repository-relative path an achievement is stored under.
//!
//! Paths have the shape `logs/<year>/<month>-<day>_<slug>.json` and depend only
//! on the date and title, so resubmitting the same entry always targets the
//! same file.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::record::{AchievementRecord, DATE_FORMAT};

/// Top-level directory all entries are written under.
pub const LOGS_DIR: &str = "logs";

/// Errors raised before any filesystem or git work happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeriveError {
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid title '{0}': must contain at least one letter or digit")]
    InvalidTitle(String),
}

/// Relative path of a stored entry inside the log repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredPath(PathBuf);

impl StoredPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Path with `/` separators, as git and the JSON response expect.
    pub fn to_slash_string(&self) -> String {
        self.0
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for StoredPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_slash_string())
    }
}

impl AsRef<Path> for StoredPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Lower-case the title and collapse every run of characters outside
/// `[a-z0-9]` into a single `_`, trimming separators at both ends.
///
/// Returns `None` when nothing alphanumeric is left.
pub fn slugify(title: &str) -> Option<String> {
    let mut slug = String::with_capacity(title.len());
    let mut pending_sep = false;

    for ch in title.trim().to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(ch);
        } else {
            pending_sep = true;
        }
    }

    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(date: &str) -> Result<NaiveDate, DeriveError> {
    let trimmed = date.trim();
    // chrono accepts signs and unpadded fields, the on-disk format does not
    let well_formed = trimmed.len() == 10
        && trimmed.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(DeriveError::InvalidDate(date.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| DeriveError::InvalidDate(date.to_string()))
}

/// Derive the stored path from a raw date string and a title.
pub fn derive_path(date: &str, title: &str) -> Result<StoredPath, DeriveError> {
    let date = parse_date(date)?;
    derive_path_from_date(date, title)
}

/// Derive the stored path for an already-parsed record.
pub fn derive_path_for(record: &AchievementRecord) -> Result<StoredPath, DeriveError> {
    derive_path_from_date(record.date, &record.title)
}

fn derive_path_from_date(date: NaiveDate, title: &str) -> Result<StoredPath, DeriveError> {
    let slug = slugify(title).ok_or_else(|| DeriveError::InvalidTitle(title.to_string()))?;

    let file_name = format!("{:02}-{:02}_{}.json", date.month(), date.day(), slug);
    let path = PathBuf::from(LOGS_DIR)
        .join(format!("{:04}", date.year()))
        .join(file_name);

    Ok(StoredPath(path))
}
