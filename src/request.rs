//! Input validation for submitted entries.
//!
//! This is the boundary layer: it enforces length and count limits before
//! anything reaches the pipeline, which itself only checks the date and title.

use serde::Deserialize;

use crate::path::{parse_date, slugify};
use crate::record::AchievementRecord;

const TITLE_LEN: (usize, usize) = (5, 80);
const DESCRIPTION_LEN: (usize, usize) = (20, 2000);
const RESUME_BULLET_LEN: (usize, usize) = (30, 200);
const TAGS_COUNT: (usize, usize) = (1, 15);
const VISIBILITY_MIN: usize = 1;

/// An entry as submitted, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AchievementRequest {
    pub date: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub impact_level: String,
    pub visibility: Vec<String>,
    pub resume_bullet: String,
}

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every problem found in a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Validation error: {}", join_field_errors(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|e| e.field).collect()
    }
}

fn check_len(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    (min, max): (usize, usize),
) {
    let len = value.trim().chars().count();
    if len < min || len > max {
        errors.push(FieldError {
            field,
            message: format!("must be {min}-{max} characters (got {len})"),
        });
    }
}

impl AchievementRequest {
    /// Validate every field and build the record on success.
    pub fn validate(self) -> Result<AchievementRecord, ValidationErrors> {
        let mut errors = Vec::new();

        let date = match parse_date(&self.date) {
            Ok(date) => Some(date),
            Err(e) => {
                errors.push(FieldError {
                    field: "date",
                    message: e.to_string(),
                });
                None
            }
        };

        check_len(&mut errors, "title", &self.title, TITLE_LEN);
        if slugify(&self.title).is_none() {
            errors.push(FieldError {
                field: "title",
                message: "must contain at least one letter or digit".to_string(),
            });
        }
        check_len(
            &mut errors,
            "description",
            &self.description,
            DESCRIPTION_LEN,
        );
        check_len(
            &mut errors,
            "resume_bullet",
            &self.resume_bullet,
            RESUME_BULLET_LEN,
        );

        let tags: Vec<String> = clean_list(self.tags);
        if tags.len() < TAGS_COUNT.0 || tags.len() > TAGS_COUNT.1 {
            errors.push(FieldError {
                field: "tags",
                message: format!(
                    "must have {}-{} entries (got {})",
                    TAGS_COUNT.0,
                    TAGS_COUNT.1,
                    tags.len()
                ),
            });
        }

        let visibility: Vec<String> = clean_list(self.visibility);
        if visibility.len() < VISIBILITY_MIN {
            errors.push(FieldError {
                field: "visibility",
                message: "must have at least one entry".to_string(),
            });
        }

        if self.impact_level.trim().is_empty() {
            errors.push(FieldError {
                field: "impact_level",
                message: "must not be empty".to_string(),
            });
        }

        match date {
            Some(date) if errors.is_empty() => Ok(AchievementRecord {
                date,
                title: self.title.trim().to_string(),
                description: self.description,
                tags,
                impact_level: self.impact_level.trim().to_string(),
                visibility,
                resume_bullet: self.resume_bullet,
            }),
            _ => Err(ValidationErrors(errors)),
        }
    }
}

/// Trim entries and drop blank ones, keeping order.
fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
