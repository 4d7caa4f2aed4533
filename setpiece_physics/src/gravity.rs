// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cascade gravity: settling dependents after their supporter is removed.

use glam::DVec3;
use rand::Rng;
use tracing::debug;

use setpiece_collision::ColliderIndex;
use setpiece_geom::{SpatialParams, clamp_extents, grounded_z};
use setpiece_graph::SceneGraph;

/// Drops every node in `falling` to the ground with collision avoidance.
///
/// `falling` must be the recursive dependent closure of `removed_id` in
/// traversal order; nodes earlier in the slice settle first and then occupy
/// space that later ones must avoid. The removed supporter and the whole
/// falling set are excluded from the obstacle index, so a dependent may land
/// exactly where its supporter used to stand.
///
/// Returns `(id, new_position)` for every node that actually moved; nodes
/// already grounded (within 1 cm) and nodes with the `prevent_gravity`
/// state flag stay where they are. When the collision search fails, the
/// plain grounded position is committed anyway — a brief overlap beats a
/// floating object.
#[must_use]
pub fn settle_after_removal<R: Rng>(
    graph: &SceneGraph,
    removed_id: &str,
    falling: &[String],
    rng: &mut R,
    params: &SpatialParams,
) -> Vec<(String, DVec3)> {
    let mut index = ColliderIndex::new(*params);
    for node in graph.nodes().values() {
        if node.id == removed_id || node.is_room() || falling.contains(&node.id) {
            continue;
        }
        index.upsert(&node.id, node.pos, node.bbox);
    }

    let mut moves = Vec::new();
    for id in falling {
        let Some(node) = graph.get(id) else {
            continue;
        };
        let size = clamp_extents(node.bbox, params.min_extent);
        if node.state.prevents_gravity() || node.state.is_pinned() {
            index.upsert(id, node.pos, size);
            continue;
        }
        let target = DVec3::new(
            node.pos.x,
            node.pos.y,
            grounded_z(size, params.ground_z),
        );
        if (node.pos.z - target.z).abs() <= 0.01 {
            index.upsert(id, node.pos, size);
            continue;
        }
        let landed = index
            .find_safe_position(rng, size, target, 0.5, 10)
            .unwrap_or(target);
        debug!(id = %id, from = node.pos.z, to = landed.z, "gravity settle");
        index.upsert(id, landed, size);
        moves.push((id.clone(), landed));
    }
    moves
}
