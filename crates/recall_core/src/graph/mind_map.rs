//! Mind map generation from tag clusters.
//!
//! # Invariants
//! - One node per tag with at least `min_tag_size` notes (minimum 1).
//! - At most one link per unordered pair of nodes.
//! - Link strength uses the raw shared-note count relative to the larger of
//!   the two clusters, as a percentage.

use crate::graph::clusters::analyze_tag_clusters;
use crate::graph::color::hash_color;
use crate::model::graph::{
    tag_node_id, GraphLink, GraphNode, GraphNodeKind, MindMapData, TagCluster,
};
use crate::model::note::Note;
use std::collections::{HashMap, HashSet};

/// Default `min_tag_size`.
pub const DEFAULT_MIN_TAG_SIZE: i64 = 2;

const NODE_SIZE_PER_NOTE: usize = 10;
const NODE_SIZE_MIN: usize = 20;
const NODE_SIZE_MAX: usize = 80;
const LINK_ALPHA_MAX: f64 = 0.8;
const LINK_RGB: &str = "107, 114, 128";

/// Builds tag nodes and co-occurrence links from a note snapshot.
///
/// `min_tag_size` below 1 is treated as 1. Empty input yields an empty graph.
pub fn generate_mind_map_data(notes: &[Note], min_tag_size: i64) -> MindMapData {
    let min_tag_size = usize::try_from(min_tag_size.max(1)).unwrap_or(usize::MAX);
    let significant: Vec<TagCluster> = analyze_tag_clusters(notes)
        .into_iter()
        .filter(|cluster| cluster.note_count() >= min_tag_size)
        .collect();

    let nodes = significant.iter().map(build_node).collect();
    let links = build_links(&significant);
    MindMapData { nodes, links }
}

/// Render size for a cluster of `note_count` notes, in `20..=80`.
pub fn node_size(note_count: usize) -> u32 {
    let size = note_count
        .saturating_mul(NODE_SIZE_PER_NOTE)
        .clamp(NODE_SIZE_MIN, NODE_SIZE_MAX);
    // Clamped to NODE_SIZE_MAX above.
    size as u32
}

/// Link color with opacity proportional to `strength` (a percentage).
pub fn link_color(strength: f64) -> String {
    let alpha = (strength / 100.0 * 2.0).min(LINK_ALPHA_MAX);
    format!("rgba({LINK_RGB}, {alpha})")
}

fn build_node(cluster: &TagCluster) -> GraphNode {
    GraphNode {
        id: tag_node_id(&cluster.tag),
        label: cluster.tag.clone(),
        kind: GraphNodeKind::Tag,
        size: node_size(cluster.note_count()),
        color: hash_color(&cluster.tag),
        note_count: cluster.note_count(),
        note_ids: cluster.note_ids.clone(),
        x: None,
        y: None,
    }
}

fn build_links(significant: &[TagCluster]) -> Vec<GraphLink> {
    let by_tag: HashMap<&str, &TagCluster> = significant
        .iter()
        .map(|cluster| (cluster.tag.as_str(), cluster))
        .collect();
    let mut seen_pairs: HashSet<(&str, &str)> = HashSet::new();
    let mut links = Vec::new();

    for cluster in significant {
        for related in &cluster.related_tags {
            let Some(other) = by_tag.get(related.tag.as_str()) else {
                continue;
            };
            if related.common_notes == 0 {
                continue;
            }
            if !seen_pairs.insert(unordered_pair(&cluster.tag, &other.tag)) {
                continue;
            }

            let larger = cluster.note_count().max(other.note_count());
            let strength = related.common_notes as f64 / larger as f64 * 100.0;
            links.push(GraphLink {
                source: tag_node_id(&cluster.tag),
                target: tag_node_id(&other.tag),
                strength,
                color: link_color(strength),
            });
        }
    }
    links
}

fn unordered_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::{generate_mind_map_data, link_color, node_size};
    use crate::model::note::Note;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn note(id: u128, tags: &[&str]) -> Note {
        Note {
            id: Uuid::from_u128(id),
            title: format!("note {id}"),
            content: String::new(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            is_archived: false,
            review_level: 0,
            review_count: 0,
            next_review_date: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn node_size_is_clamped() {
        assert_eq!(node_size(1), 20);
        assert_eq!(node_size(3), 30);
        assert_eq!(node_size(8), 80);
        assert_eq!(node_size(500), 80);
    }

    #[test]
    fn link_alpha_is_capped() {
        assert_eq!(link_color(25.0), "rgba(107, 114, 128, 0.5)");
        assert_eq!(link_color(100.0), "rgba(107, 114, 128, 0.8)");
    }

    #[test]
    fn small_tags_are_dropped_and_pairs_linked_once() {
        let notes = vec![
            note(1, &["a", "b", "c"]),
            note(2, &["a", "b"]),
            note(3, &["a", "b", "d"]),
            note(4, &["c", "a"]),
            note(5, &["c"]),
        ];
        let graph = generate_mind_map_data(&notes, 3);

        let labels: Vec<&str> = graph.nodes.iter().map(|node| node.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
        assert!(graph.nodes.iter().all(|node| node.note_count >= 3));

        let mut pairs = HashSet::new();
        for link in &graph.links {
            let mut pair = [link.source.clone(), link.target.clone()];
            pair.sort();
            assert!(pairs.insert(pair), "duplicate link {link:?}");
        }
        assert_eq!(graph.links.len(), 3);

        let ab = graph
            .links
            .iter()
            .find(|link| link.connects("tag-a", "tag-b"))
            .unwrap();
        // 3 shared of max(4, 3)
        assert!((ab.strength - 75.0).abs() < 1e-9);
        assert_eq!(ab.source, "tag-a");
    }

    #[test]
    fn non_positive_min_size_is_clamped_to_one() {
        let notes = vec![note(1, &["solo"])];
        for min in [0, -5] {
            let graph = generate_mind_map_data(&notes, min);
            assert_eq!(graph.nodes.len(), 1);
            assert_eq!(graph.nodes[0].id, "tag-solo");
            assert_eq!(graph.nodes[0].size, 20);
        }
    }

    #[test]
    fn empty_notes_yield_empty_graph() {
        let graph = generate_mind_map_data(&[], 2);
        assert!(graph.is_empty());
    }
}
