//! Tag relationship graph.
//!
//! # Responsibility
//! - Turn tag co-occurrence across notes into clusters (`clusters`).
//! - Build the node/link mind map from significant clusters (`mind_map`).
//! - Assign deterministic 2-D coordinates (`layout`).
//!
//! # Invariants
//! - Every function here is pure: no I/O, no locking, no shared state.
//! - Identical input snapshots produce identical output.

pub mod clusters;
pub mod color;
pub mod layout;
pub mod mind_map;

use crate::model::graph::MindMapData;
use crate::model::note::Note;
use log::debug;

pub use clusters::{all_tags, analyze_tag_clusters, notes_for_tag, tag_similarity};
pub use color::hash_color;
pub use layout::calculate_node_positions;
pub use mind_map::{generate_mind_map_data, DEFAULT_MIN_TAG_SIZE};

/// Canvas and filtering options for a positioned mind map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MindMapOptions {
    pub min_tag_size: i64,
    pub width: f64,
    pub height: f64,
}

impl Default for MindMapOptions {
    fn default() -> Self {
        Self {
            min_tag_size: DEFAULT_MIN_TAG_SIZE,
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Generates the mind map and lays its nodes out in one step.
pub fn build_positioned_mind_map(notes: &[Note], options: &MindMapOptions) -> MindMapData {
    let graph = generate_mind_map_data(notes, options.min_tag_size);
    let nodes = calculate_node_positions(&graph.nodes, options.width, options.height);
    debug!(
        "event=mind_map_build module=graph status=ok notes={} nodes={} links={}",
        notes.len(),
        nodes.len(),
        graph.links.len()
    );
    MindMapData {
        nodes,
        links: graph.links,
    }
}
