//! Due-set predicate for in-memory snapshots.
//!
//! `NoteQuery::due_at` expresses the same predicate for the store; these
//! helpers apply it to notes the caller already holds.

use crate::model::note::{Note, MAX_REVIEW_LEVEL};

/// Returns whether `note` is ready for review at `now_ms`.
pub fn is_due(note: &Note, now_ms: i64) -> bool {
    !note.is_archived && note.next_review_date <= now_ms && note.review_level < MAX_REVIEW_LEVEL
}

/// Filters `notes` to the due set, most overdue first (ties by id).
pub fn select_due(notes: &[Note], now_ms: i64) -> Vec<Note> {
    let mut due: Vec<Note> = notes
        .iter()
        .filter(|note| is_due(note, now_ms))
        .cloned()
        .collect();
    due.sort_by(|a, b| {
        a.next_review_date
            .cmp(&b.next_review_date)
            .then_with(|| a.id.cmp(&b.id))
    });
    due
}
