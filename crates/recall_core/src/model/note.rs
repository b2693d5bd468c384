//! Note domain model.
//!
//! # Responsibility
//! - Define the note record owned by the note store.
//! - Validate user-facing fields before persistence.
//!
//! # Invariants
//! - `review_level` stays within `0..=MAX_REVIEW_LEVEL`.
//! - `next_review_date` is derived from `review_level` by the review schedule,
//!   never set to an arbitrary value.
//! - `tags` keeps the order the caller supplied and holds no duplicates.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a note.
pub type NoteId = Uuid;

/// Review level at which a note counts as mastered.
pub const MAX_REVIEW_LEVEL: u8 = 5;

pub const TITLE_MAX_CHARS: usize = 200;
pub const CONTENT_MAX_CHARS: usize = 10_000;
pub const TAG_MAX_CHARS: usize = 50;

/// Note record as seen by the review and graph engines.
///
/// Serialized with camelCase names (`isArchived`, `reviewLevel`,
/// `nextReviewDate`, ...). Timestamps are Unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_archived: bool,
    /// Spaced-repetition progress, `0..=5`.
    pub review_level: u8,
    pub review_count: u32,
    pub next_review_date: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Note {
    /// Returns whether the note has completed every review cycle.
    pub fn is_mastered(&self) -> bool {
        self.review_level >= MAX_REVIEW_LEVEL
    }

    /// Returns whether `tag` is attached to this note (exact match).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|value| value == tag)
    }

    /// Validates persisted invariants.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_fields(&self.title, &self.content, &self.tags)?;
        if self.review_level > MAX_REVIEW_LEVEL {
            return Err(NoteValidationError::ReviewLevelOutOfRange(self.review_level));
        }
        Ok(())
    }
}

/// Input model for creating a note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl NewNote {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
        }
    }

    /// Builder-style tag assignment.
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_fields(&self.title, &self.content, &self.tags)
    }
}

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyTitle,
    TitleTooLong(usize),
    ContentTooLong(usize),
    TagTooLong(String),
    ReviewLevelOutOfRange(u8),
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title cannot be empty"),
            Self::TitleTooLong(len) => {
                write!(f, "note title has {len} chars; limit is {TITLE_MAX_CHARS}")
            }
            Self::ContentTooLong(len) => {
                write!(f, "note content has {len} chars; limit is {CONTENT_MAX_CHARS}")
            }
            Self::TagTooLong(tag) => {
                write!(f, "tag `{tag}` exceeds {TAG_MAX_CHARS} chars")
            }
            Self::ReviewLevelOutOfRange(level) => write!(
                f,
                "review level {level} is outside 0..={MAX_REVIEW_LEVEL}"
            ),
        }
    }
}

impl Error for NoteValidationError {}

fn validate_fields(
    title: &str,
    content: &str,
    tags: &[String],
) -> Result<(), NoteValidationError> {
    if title.trim().is_empty() {
        return Err(NoteValidationError::EmptyTitle);
    }
    let title_len = title.chars().count();
    if title_len > TITLE_MAX_CHARS {
        return Err(NoteValidationError::TitleTooLong(title_len));
    }
    let content_len = content.chars().count();
    if content_len > CONTENT_MAX_CHARS {
        return Err(NoteValidationError::ContentTooLong(content_len));
    }
    if let Some(tag) = tags
        .iter()
        .find(|tag| tag.trim().chars().count() > TAG_MAX_CHARS)
    {
        return Err(NoteValidationError::TagTooLong(tag.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{NewNote, NoteValidationError};

    #[test]
    fn new_note_requires_title() {
        let err = NewNote::new("   ", "body").validate().unwrap_err();
        assert_eq!(err, NoteValidationError::EmptyTitle);
    }

    #[test]
    fn new_note_rejects_oversized_tag() {
        let long_tag = "x".repeat(51);
        let err = NewNote::new("title", "body")
            .with_tags([long_tag.clone()])
            .validate()
            .unwrap_err();
        assert_eq!(err, NoteValidationError::TagTooLong(long_tag));
    }
}
