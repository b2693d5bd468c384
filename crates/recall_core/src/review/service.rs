//! Review use-case service.
//!
//! # Responsibility
//! - Advance a note's review state (`mark_reviewed`) and persist it.
//! - Query the due set through the store.
//!
//! # Invariants
//! - Each review is one atomic read-modify-write in the store, so concurrent
//!   reviews of the same note (from any number of services or processes
//!   sharing the database) are never lost: two reviews from level 2 end at 4.
//! - Store failures surface as `ReviewError::StoreUnavailable`; nothing is
//!   retried here.

use crate::model::note::{Note, NoteId};
use crate::repo::note_store::{NoteQuery, NoteStore, RepoError, ReviewPatch};
use crate::review::schedule::ReviewConfig;
use crate::time::now_epoch_ms;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

/// Service error for review use-cases.
#[derive(Debug)]
pub enum ReviewError {
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Store I/O failed; the caller decides whether to retry.
    StoreUnavailable(RepoError),
}

impl Display for ReviewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::StoreUnavailable(err) => write!(f, "note store unavailable: {err}"),
        }
    }
}

impl Error for ReviewError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable(err) => Some(err),
            Self::NoteNotFound(_) => None,
        }
    }
}

impl From<RepoError> for ReviewError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::StoreUnavailable(other),
        }
    }
}

/// Review service over any `NoteStore`.
pub struct ReviewService<S: NoteStore> {
    store: Arc<S>,
    config: ReviewConfig,
}

impl<S: NoteStore> ReviewService<S> {
    /// Creates a service with the standard review schedule.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, ReviewConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: ReviewConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Shared handle to the underlying store (e.g. for the poller).
    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    /// Records one review of `id` at the current wall-clock time.
    ///
    /// Each call advances the level by one (capped at 5) and bumps the review
    /// count. Calls are not idempotent: a double-submitted review advances
    /// twice, so callers must de-duplicate upstream.
    pub fn mark_reviewed(&self, id: NoteId) -> Result<Note, ReviewError> {
        self.mark_reviewed_at(id, now_epoch_ms())
    }

    /// Same as `mark_reviewed` with an explicit clock reading.
    pub fn mark_reviewed_at(&self, id: NoteId, now_ms: i64) -> Result<Note, ReviewError> {
        let started_at = Instant::now();
        let config = &self.config;
        let result = self
            .store
            .update_review_with(id, &mut |current: &Note| {
                let review_level = config.advance_level(current.review_level);
                ReviewPatch {
                    review_level,
                    review_count: current.review_count.saturating_add(1),
                    next_review_date: config.next_review_date(review_level, now_ms),
                    updated_at: now_ms,
                }
            })
            .map_err(ReviewError::from);

        match &result {
            Ok(note) => info!(
                "event=note_review module=review status=ok note_id={} level={} review_count={} duration_ms={}",
                id,
                note.review_level,
                note.review_count,
                started_at.elapsed().as_millis()
            ),
            Err(ReviewError::NoteNotFound(_)) => info!(
                "event=note_review module=review status=not_found note_id={}",
                id
            ),
            Err(err) => error!(
                "event=note_review module=review status=error note_id={} error={}",
                id, err
            ),
        }
        result
    }

    /// Puts `id` back at level 0, due one level-0 interval from now.
    ///
    /// The review count is kept as history.
    pub fn reset_review(&self, id: NoteId) -> Result<Note, ReviewError> {
        self.reset_review_at(id, now_epoch_ms())
    }

    pub fn reset_review_at(&self, id: NoteId, now_ms: i64) -> Result<Note, ReviewError> {
        let next_review_date = self.config.next_review_date(0, now_ms);
        let note = self.store.update_review_with(id, &mut |current: &Note| ReviewPatch {
            review_level: 0,
            review_count: current.review_count,
            next_review_date,
            updated_at: now_ms,
        })?;
        info!(
            "event=note_review_reset module=review status=ok note_id={}",
            id
        );
        Ok(note)
    }

    /// Returns notes due at `now_ms`, most overdue first.
    pub fn due_notes(&self, now_ms: i64) -> Result<Vec<Note>, ReviewError> {
        match self.store.find_notes(&NoteQuery::due_at(now_ms)) {
            Ok(notes) => {
                info!(
                    "event=due_query module=review status=ok due_count={}",
                    notes.len()
                );
                Ok(notes)
            }
            Err(err) => {
                error!(
                    "event=due_query module=review status=error error={}",
                    err
                );
                Err(ReviewError::StoreUnavailable(err))
            }
        }
    }

    /// Wall-clock variant of `due_notes`.
    pub fn due_notes_now(&self) -> Result<Vec<Note>, ReviewError> {
        self.due_notes(now_epoch_ms())
    }
}
