use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used for the `date` field and for parsing user input.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single achievement, persisted as one JSON file in the log repository.
///
/// Field order here is the key order of the written file. Changing it changes
/// the bytes on disk, which makes every existing entry look modified on the
/// next submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementRecord {
    /// Calendar date of the achievement
    #[serde(with = "iso_date")]
    pub date: NaiveDate,

    /// Short title, also the source of the file name slug
    pub title: String,

    /// Free-text description
    pub description: String,

    /// Tags in submission order
    pub tags: Vec<String>,

    /// Impact classification label (e.g. "Individual", "Team", "Strategic")
    pub impact_level: String,

    /// Audience labels in submission order
    pub visibility: Vec<String>,

    /// Resume-ready summary line
    pub resume_bullet: String,
}

impl AchievementRecord {
    /// Serialize to the on-disk format: 2-space indented JSON with a trailing newline.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        let mut content =
            serde_json::to_string_pretty(self).context("Failed to serialize achievement record")?;
        content.push('\n');
        Ok(content.into_bytes())
    }

    /// Parse a record from its on-disk format.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse achievement record")
    }

    /// Commit message used when this record is committed.
    pub fn commit_message(&self) -> String {
        format!("Add log entry: {}", self.title.trim())
    }
}

mod iso_date {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
pub(crate) fn sample_record() -> AchievementRecord {
    AchievementRecord {
        date: NaiveDate::from_ymd_opt(2025, 8, 17).unwrap(),
        title: "Backend Validation Test".to_string(),
        description: "Validated the backend logging pipeline end to end.".to_string(),
        tags: vec!["Testing".to_string(), "Backend".to_string()],
        impact_level: "Individual".to_string(),
        visibility: vec!["Internal".to_string()],
        resume_bullet: "Validated an automated achievement logging backend end to end".to_string(),
    }
}
