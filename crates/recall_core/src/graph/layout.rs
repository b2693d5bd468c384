//! Deterministic circular layout for mind map nodes.

use crate::model::graph::GraphNode;
use std::f64::consts::TAU;

/// Fraction of the shorter canvas side used as the circle radius.
pub const LAYOUT_RADIUS_RATIO: f64 = 0.35;

/// Places nodes evenly on a circle centred in a `width` x `height` canvas.
///
/// Node `i` of `n` sits at angle `2πi/n`, starting at 3 o'clock. The result
/// depends only on input order, node count and canvas size. Non-positive
/// dimensions collapse the radius to 0 instead of failing.
pub fn calculate_node_positions(nodes: &[GraphNode], width: f64, height: f64) -> Vec<GraphNode> {
    let center_x = width / 2.0;
    let center_y = height / 2.0;
    let radius = (width.min(height) * LAYOUT_RADIUS_RATIO).max(0.0);
    let count = nodes.len() as f64;

    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let angle = TAU * index as f64 / count;
            GraphNode {
                x: Some(center_x + radius * angle.cos()),
                y: Some(center_y + radius * angle.sin()),
                ..node.clone()
            }
        })
        .collect()
}
