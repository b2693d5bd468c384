//! Repository layer: the note store contract and its SQLite implementation.
//!
//! # Responsibility
//! - Define the use-case oriented data access contract (`NoteStore`).
//! - Isolate SQLite query details from review/graph orchestration.
//!
//! # Invariants
//! - Store APIs return semantic errors (`NotFound`) in addition to transport
//!   errors.

pub mod note_store;
