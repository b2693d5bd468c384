//! Spaced-repetition review engine.
//!
//! # Responsibility
//! - Map review levels to next-review timestamps (`schedule`).
//! - Select notes ready for review (`due`).
//! - Advance one note's review state as one atomic store update (`service`).
//! - Scan the due set periodically for observability (`poller`).
//!
//! # Invariants
//! - `review_level` only moves forward here, capped at `MAX_REVIEW_LEVEL`;
//!   `reset_review` is the single explicit way back to level 0.
//! - The poller never writes to the store.

pub mod due;
pub mod poller;
pub mod schedule;
pub mod service;
