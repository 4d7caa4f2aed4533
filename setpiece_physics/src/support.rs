// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Support-dependency tracking: who rests on whom.

use std::collections::{BTreeMap, BTreeSet};

use glam::DVec3;
use tracing::trace;

use setpiece_geom::{SpatialParams, grounded_z};
use setpiece_graph::{GraphPatch, Node, NodeUpdate, SceneGraph};
use setpiece_relate::rests_on;

/// Diagnostic census of the support state of a scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SupportSummary {
    /// Nodes considered (rooms excluded).
    pub total_objects: usize,
    /// Nodes resting on the ground plane.
    pub grounded: usize,
    /// Nodes with a tracked supporter.
    pub supported: usize,
    /// Non-pinned nodes that are neither grounded nor supported.
    pub floating: usize,
    /// Tracked `(supported, supporter)` edges.
    pub edges: Vec<(String, String)>,
}

/// Tracks which objects are supported by which other objects.
///
/// Support edges form a DAG rooted at the ground: every edge points from a
/// node to the single node it rests on. The tracker is rebuilt from geometry
/// by [`SupportTracker::infer`] after every add, position update, and before
/// every removal cascade.
#[derive(Clone, Debug, Default)]
pub struct SupportTracker {
    supporter_of: BTreeMap<String, String>,
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl SupportTracker {
    /// An empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds support relationships from the current scene geometry.
    ///
    /// A node needs a supporter when it is neither grounded nor pinned. Among
    /// candidates passing the resting test, tops within 0.05 of each other
    /// prefer the larger horizontal surface (two books on one table must not
    /// claim to support each other); otherwise the higher top wins.
    #[must_use]
    pub fn infer(graph: &SceneGraph, params: &SpatialParams) -> Self {
        let mut tracker = Self::new();
        for (id, node) in graph.nodes() {
            if node.is_room() || node.state.is_pinned() {
                continue;
            }
            let gz = grounded_z(node.bbox, params.ground_z);
            if (node.pos.z - gz).abs() <= params.grounded_tol {
                continue;
            }
            if let Some(supporter) = find_supporter(graph, node, params) {
                trace!(supported = %id, supporter = %supporter, "support edge");
                tracker.link(id.clone(), supporter);
            }
        }
        tracker
    }

    /// Records that `supported` rests on `supporter`, replacing any prior
    /// supporter of `supported`.
    pub fn link(&mut self, supported: String, supporter: String) {
        self.unlink(&supported);
        self.dependents
            .entry(supporter.clone())
            .or_default()
            .insert(supported.clone());
        self.supporter_of.insert(supported, supporter);
    }

    /// Clears the supporter link of `supported`, if any.
    pub fn unlink(&mut self, supported: &str) {
        if let Some(supporter) = self.supporter_of.remove(supported) {
            if let Some(set) = self.dependents.get_mut(&supporter) {
                set.remove(supported);
                if set.is_empty() {
                    self.dependents.remove(&supporter);
                }
            }
        }
    }

    /// The node `id` rests on, if tracked.
    #[must_use]
    pub fn supporter_of(&self, id: &str) -> Option<&str> {
        self.supporter_of.get(id).map(String::as_str)
    }

    /// Nodes resting directly on `id`, ascending.
    #[must_use]
    pub fn direct_dependents(&self, id: &str) -> Vec<String> {
        self.dependents
            .get(id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The transitive dependent closure of `id`, in depth-first discovery
    /// order, each node once.
    ///
    /// The closure is finite because support forms a DAG; a node already
    /// visited is never expanded again.
    #[must_use]
    pub fn dependents_recursive(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = BTreeSet::new();
        self.collect_dependents(id, &mut out, &mut seen);
        out
    }

    fn collect_dependents(&self, id: &str, out: &mut Vec<String>, seen: &mut BTreeSet<String>) {
        let Some(direct) = self.dependents.get(id) else {
            return;
        };
        for dependent in direct {
            if seen.insert(dependent.clone()) {
                out.push(dependent.clone());
                self.collect_dependents(dependent, out, seen);
            }
        }
    }

    /// Removes `id` from the bookkeeping entirely — as a supporter and as a
    /// supportee — and clears the supporter links of its whole recursive
    /// dependent closure. Returns that closure in traversal order.
    pub fn remove_object(&mut self, id: &str) -> Vec<String> {
        let affected = self.dependents_recursive(id);
        self.dependents.remove(id);
        self.unlink(id);
        for dependent in &affected {
            self.unlink(dependent);
        }
        affected
    }

    /// Tracked `(supported, supporter)` pairs, ascending by supported id.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.supporter_of
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
    }

    /// Counts of tracked edges and nodes.
    #[must_use]
    pub fn summary(&self, graph: &SceneGraph, params: &SpatialParams) -> SupportSummary {
        let mut summary = SupportSummary::default();
        for (id, node) in graph.nodes() {
            if node.is_room() {
                continue;
            }
            summary.total_objects += 1;
            let gz = grounded_z(node.bbox, params.ground_z);
            if (node.pos.z - gz).abs() <= params.grounded_tol {
                summary.grounded += 1;
            } else if self.supporter_of.contains_key(id) {
                summary.supported += 1;
            } else if !node.state.is_pinned() {
                summary.floating += 1;
            }
        }
        summary.edges = self
            .supporter_of
            .iter()
            .map(|(a, b)| (a.clone(), b.clone()))
            .collect();
        summary
    }
}

/// The best supporter for `node`, if any candidate passes the resting test.
fn find_supporter(graph: &SceneGraph, node: &Node, params: &SpatialParams) -> Option<String> {
    let placed = node.placed();
    let mut best: Option<(&Node, f64)> = None;

    for (other_id, other) in graph.nodes() {
        if *other_id == node.id || other.is_room() {
            continue;
        }
        let Some(fit) = rests_on(&placed, &other.placed(), params.support_z_tol) else {
            continue;
        };
        match best {
            None => best = Some((other, fit.top)),
            Some((current, current_top)) => {
                if (fit.top - current_top).abs() < 0.05 {
                    let area = other.bbox.x * other.bbox.y;
                    let current_area = current.bbox.x * current.bbox.y;
                    if area > current_area {
                        best = Some((other, fit.top));
                    }
                } else if fit.top > current_top {
                    best = Some((other, fit.top));
                }
            }
        }
    }
    best.map(|(node, _)| node.id.clone())
}

/// Builds the patch that moves `id` to `new_pos` and translates its whole
/// recursive dependent closure by the same offset, preserving relative
/// positions.
#[must_use]
pub fn translation_patch(
    graph: &SceneGraph,
    tracker: &SupportTracker,
    id: &str,
    new_pos: DVec3,
) -> GraphPatch {
    let mut patch = GraphPatch::new();
    let Some(node) = graph.get(id) else {
        return patch;
    };
    let delta = new_pos - node.pos;
    patch.update_nodes.insert(id.to_owned(), NodeUpdate::pos(new_pos));
    for dependent in tracker.dependents_recursive(id) {
        if let Some(dep) = graph.get(&dependent) {
            patch
                .update_nodes
                .insert(dependent, NodeUpdate::pos(dep.pos + delta));
        }
    }
    patch
}
