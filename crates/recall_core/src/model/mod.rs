//! Domain model shared by the review scheduler and the tag graph builder.
//!
//! # Responsibility
//! - Define the note record both subsystems read.
//! - Define the derived cluster/graph shapes handed to presentation.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Cluster and graph values are rebuilt per request and never persisted.

pub mod graph;
pub mod note;
