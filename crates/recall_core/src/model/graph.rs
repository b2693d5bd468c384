//! Tag cluster and mind map graph shapes.
//!
//! All values here are derived from a note snapshot on every request. They
//! carry no identity across calls and are not mutated after construction;
//! layout produces new nodes instead of editing existing ones.

use crate::model::note::NoteId;
use serde::{Deserialize, Serialize};

/// Prefix for graph node ids derived from tag names.
pub const TAG_NODE_PREFIX: &str = "tag-";

/// Co-occurrence count between one tag and another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedTag {
    pub tag: String,
    /// Raw number of notes carrying both tags.
    pub common_notes: usize,
}

/// Notes sharing one tag plus that tag's ranked relationships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCluster {
    pub tag: String,
    /// Insertion order, no duplicates.
    pub note_ids: Vec<NoteId>,
    /// Sorted descending by `common_notes`.
    pub related_tags: Vec<RelatedTag>,
}

impl TagCluster {
    pub fn note_count(&self) -> usize {
        self.note_ids.len()
    }
}

/// Kind of entity a graph node represents. Only tags are produced today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphNodeKind {
    Tag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// `"tag-" + label`.
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: GraphNodeKind,
    /// Render size in `20..=80`.
    pub size: u32,
    pub color: String,
    pub note_count: usize,
    pub note_ids: Vec<NoteId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

/// Undirected relationship between two tag nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    /// Percentage in `(0, 100]`.
    pub strength: f64,
    pub color: String,
}

impl GraphLink {
    /// Returns whether this link joins `a` and `b` in either direction.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MindMapData {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl MindMapData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }
}

/// Builds the node id for a tag.
pub fn tag_node_id(tag: &str) -> String {
    format!("{TAG_NODE_PREFIX}{tag}")
}
