//! Review & relationship engine for notes.
//!
//! Two subsystems share one note collection: a spaced-repetition scheduler
//! that decides when a note is due and advances its level, and a tag graph
//! builder that turns tag co-occurrence into a laid-out mind map.

pub mod db;
pub mod graph;
pub mod logging;
pub mod model;
pub mod repo;
pub mod review;
pub mod time;

pub use graph::{
    all_tags, analyze_tag_clusters, build_positioned_mind_map, calculate_node_positions,
    generate_mind_map_data, hash_color, notes_for_tag, tag_similarity, MindMapOptions,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::graph::{GraphLink, GraphNode, GraphNodeKind, MindMapData, RelatedTag, TagCluster};
pub use model::note::{NewNote, Note, NoteId, NoteValidationError, MAX_REVIEW_LEVEL};
pub use repo::note_store::{
    NoteOrder, NoteQuery, NoteStore, RepoError, RepoResult, ReviewPatch, SqliteNoteStore,
};
pub use review::due::{is_due, select_due};
pub use review::poller::{BackgroundPoller, PollerConfig, PollerHandle, TickReport};
pub use review::schedule::{compute_next_review_date, next_review_date_from_now, ReviewConfig};
pub use review::service::{ReviewError, ReviewService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
