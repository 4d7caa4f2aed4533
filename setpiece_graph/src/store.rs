// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene graph store and its patch/validation machinery.

use std::collections::{BTreeMap, BTreeSet};

use glam::DVec3;
use tracing::{debug, trace};

use setpiece_geom::{SpatialParams, clamp_extents, distance_3d, grounded_z, top_of};

use crate::clock::{Clock, Stamp};
use crate::context::{ContextObject, ContextRelation, LlmContext};
use crate::error::PatchError;
use crate::event::Event;
use crate::node::Node;
use crate::patch::{FieldMask, GraphPatch};
use crate::relation::{RelKey, Relation};

/// The scene graph: nodes, relations, and an append-only event log.
///
/// See the crate docs for the patch and validation semantics. All id-keyed
/// maps are `BTreeMap` so iteration order — and with it validation order,
/// resolution order, and agent scheduling built on top — is deterministic.
#[derive(Clone, Debug)]
pub struct SceneGraph {
    params: SpatialParams,
    auto_physics: bool,
    nodes: BTreeMap<String, Node>,
    relations: BTreeMap<RelKey, Relation>,
    events: Vec<Event>,
    clock: Clock,
}

impl SceneGraph {
    /// An empty store with automatic physics validation enabled.
    #[must_use]
    pub fn new(params: SpatialParams) -> Self {
        Self::with_auto_physics(params, true)
    }

    /// An empty store with explicit control over automatic validation.
    ///
    /// Disabling validation is meant for analyzers replaying recorded
    /// scenes, not for live mutation.
    #[must_use]
    pub fn with_auto_physics(params: SpatialParams, auto_physics: bool) -> Self {
        Self {
            params,
            auto_physics,
            nodes: BTreeMap::new(),
            relations: BTreeMap::new(),
            events: Vec::new(),
            clock: Clock::new(),
        }
    }

    /// The parameter set the store was built with.
    #[must_use]
    pub const fn params(&self) -> &SpatialParams {
        &self.params
    }

    /// All nodes, by id.
    #[must_use]
    pub const fn nodes(&self) -> &BTreeMap<String, Node> {
        &self.nodes
    }

    /// All relations, by key.
    #[must_use]
    pub const fn relations(&self) -> &BTreeMap<RelKey, Relation> {
        &self.relations
    }

    /// The event log, oldest first.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Looks up a node.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Draws a fresh timestamp from the store clock.
    ///
    /// Callers that synthesize relations outside agent negotiation (command
    /// executor, bootstrap) stamp them here so LWW ordering stays total.
    pub fn stamp(&mut self) -> Stamp {
        self.clock.stamp()
    }

    /// Aligns the store clock with an external seconds value (never
    /// backwards).
    pub fn advance_clock_to(&mut self, seconds: f64) {
        self.clock.advance_to(seconds);
    }

    /// Nodes within 3D distance `radius` of `id`, excluding `id` itself.
    #[must_use]
    pub fn neighbors(&self, id: &str, radius: f64) -> Vec<&Node> {
        let Some(me) = self.nodes.get(id) else {
            return Vec::new();
        };
        self.nodes
            .values()
            .filter(|other| other.id != id && distance_3d(me.pos, other.pos) <= radius)
            .collect()
    }

    /// Loads a bootstrap payload: nodes, then relations verbatim.
    ///
    /// Every non-pinned, non-room node is force-grounded regardless of its
    /// payload height — bootstrap data carries no ordering for stacks, so
    /// stacking is re-established afterwards by support inference and
    /// explicit placement.
    pub fn load_bootstrap(&mut self, nodes: Vec<Node>, relations: Vec<Relation>) {
        for mut node in nodes {
            node.bbox = clamp_extents(node.bbox, self.params.min_extent);
            if self.auto_physics && !node.state.is_pinned() && !node.is_room() {
                let gz = grounded_z(node.bbox, self.params.ground_z);
                if node.pos.z != gz {
                    debug!(id = %node.id, from = node.pos.z, to = gz, "bootstrap ground snap");
                }
                node.pos.z = gz;
            }
            let ts = self.clock.stamp();
            self.events.push(Event::NodeAdded {
                id: node.id.clone(),
                ts,
            });
            self.nodes.insert(node.id.clone(), node);
        }
        for relation in relations {
            self.relations.insert(relation.key(), relation);
        }
        let ts = self.clock.stamp();
        self.events.push(Event::BootstrapLoaded { ts });
    }

    /// Applies a patch atomically.
    ///
    /// Buckets apply in order (adds, updates, relation removals, relation
    /// upserts), then physics validation runs over every added or moved
    /// node in ascending id order, then the grounded-or-supported-or-pinned
    /// invariant is checked for the same set. On error nothing is committed.
    pub fn apply_patch(&mut self, patch: GraphPatch) -> Result<(), PatchError> {
        let mut nodes = self.nodes.clone();
        let mut relations = self.relations.clone();
        let mut pending = Vec::new();
        let mut touched: BTreeSet<String> = BTreeSet::new();

        for (id, mut node) in patch.add_nodes {
            node.bbox = clamp_extents(node.bbox, self.params.min_extent);
            let ts = self.clock.stamp();
            pending.push(Event::NodeAdded { id: id.clone(), ts });
            nodes.insert(id.clone(), node);
            touched.insert(id);
        }

        for (id, update) in patch.update_nodes {
            let Some(node) = nodes.get_mut(&id) else {
                return Err(PatchError::UnknownNode { id });
            };
            let changed = update.mask();
            update.apply_to(node);
            if changed.contains(FieldMask::BBOX) {
                node.bbox = clamp_extents(node.bbox, self.params.min_extent);
            }
            let ts = self.clock.stamp();
            pending.push(Event::NodeUpdated {
                id: id.clone(),
                changed,
                ts,
            });
            if changed.contains(FieldMask::POS) {
                touched.insert(id);
            }
        }

        for key in patch.remove_relations {
            if relations.remove(&key).is_some() {
                let ts = self.clock.stamp();
                pending.push(Event::RelRemoved { key, ts });
            }
        }

        for relation in patch.add_relations {
            if !nodes.contains_key(&relation.a) || !nodes.contains_key(&relation.b) {
                return Err(PatchError::DanglingRelation {
                    key: relation.key(),
                });
            }
            let key = relation.key();
            // LWW: the incoming relation wins iff its stamp is not older.
            let keep = relations
                .get(&key)
                .is_none_or(|existing| relation.ts.0 >= existing.ts.0);
            if keep {
                pending.push(Event::RelUpsert {
                    key: key.clone(),
                    ts: relation.ts,
                    conf: relation.conf,
                });
                relations.insert(key, relation);
            } else {
                trace!(%key, "stale relation upsert ignored");
            }
        }

        if self.auto_physics {
            for id in &touched {
                let node = &nodes[id];
                if node.state.is_pinned() || node.is_room() {
                    continue;
                }
                let corrected =
                    validate_in(&nodes, id, node.pos, node.bbox, &self.params);
                if corrected != node.pos {
                    debug!(id = %id, from = ?node.pos, to = ?corrected, "physics correction");
                    if let Some(n) = nodes.get_mut(id) {
                        n.pos = corrected;
                    }
                }
            }
        }

        for id in &touched {
            let node = &nodes[id];
            if !self.holds_invariant(&nodes, node) {
                return Err(PatchError::InvariantViolation { id: id.clone() });
            }
        }

        self.nodes = nodes;
        self.relations = relations;
        self.events.extend(pending);
        Ok(())
    }

    /// Removes a node and purges every relation referencing it.
    ///
    /// Returns the removed node, if it existed. Node removal is driven by
    /// the external remove command, which runs the support cascade first.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        let stale: Vec<RelKey> = self
            .relations
            .keys()
            .filter(|key| key.touches(id))
            .cloned()
            .collect();
        for key in stale {
            self.relations.remove(&key);
            let ts = self.clock.stamp();
            self.events.push(Event::RelRemoved { key, ts });
        }
        Some(node)
    }

    /// The single-node physics rule: returns the position a node of `size`
    /// at `pos` would actually settle at.
    ///
    /// Below-ground and unsupported or absurdly high positions snap to the
    /// grounded height; grounded and properly supported positions pass
    /// through unchanged. `exclude` names the node being validated so it
    /// cannot support itself.
    #[must_use]
    pub fn validate_position(&self, exclude: &str, pos: DVec3, size: DVec3) -> DVec3 {
        validate_in(&self.nodes, exclude, pos, size, &self.params)
    }

    /// Re-runs validation over the whole scene without mutating it and
    /// returns the corrections that would be applied.
    #[must_use]
    pub fn validation_sweep(&self) -> Vec<(String, DVec3)> {
        let mut corrections = Vec::new();
        for (id, node) in &self.nodes {
            if node.state.is_pinned() || node.is_room() {
                continue;
            }
            let corrected = validate_in(&self.nodes, id, node.pos, node.bbox, &self.params);
            if corrected != node.pos {
                corrections.push((id.clone(), corrected));
            }
        }
        corrections
    }

    /// Summarizes the K nearest nodes to `agent_pose` for a language-model
    /// consumer. Read-only.
    #[must_use]
    pub fn llm_context(&self, agent_pose: DVec3, roi: &str, k: usize) -> LlmContext {
        let mut by_distance: Vec<&Node> = self.nodes.values().collect();
        by_distance.sort_by(|a, b| {
            distance_3d(agent_pose, a.pos).total_cmp(&distance_3d(agent_pose, b.pos))
        });
        by_distance.truncate(k);

        let mut notices = Vec::new();
        if by_distance.iter().any(|n| {
            n.class == "stove"
                && n.state
                    .extra
                    .get("power")
                    .and_then(|v| v.as_text())
                    == Some("on")
        }) {
            notices.push("Stove is ON nearby.".to_owned());
        }

        let selected: BTreeSet<&str> = by_distance.iter().map(|n| n.id.as_str()).collect();
        let relations = self
            .relations
            .values()
            .filter(|r| selected.contains(r.a.as_str()) || selected.contains(r.b.as_str()))
            .map(|r| ContextRelation {
                kind: r.kind,
                a: r.a.clone(),
                b: r.b.clone(),
                conf: r.conf,
            })
            .collect();

        LlmContext {
            frame: "map".to_owned(),
            agent_pose,
            roi: roi.to_owned(),
            summary: format!("You are in {roi}. {} objects nearby.", by_distance.len()),
            objects: by_distance
                .into_iter()
                .map(|n| ContextObject {
                    id: n.id.clone(),
                    class: n.class.clone(),
                    pos: n.pos,
                    bbox: n.bbox,
                    lom: n.lom,
                    aff: n.aff.clone(),
                    state: n.state.clone(),
                    conf: n.conf,
                })
                .collect(),
            relations,
            notices,
        }
    }

    fn holds_invariant(&self, nodes: &BTreeMap<String, Node>, node: &Node) -> bool {
        if node.state.is_pinned() || node.is_room() {
            return true;
        }
        let gz = grounded_z(node.bbox, self.params.ground_z);
        if (node.pos.z - gz).abs() <= self.params.grounded_tol {
            return true;
        }
        supporter_exists(nodes, &node.id, node.pos, node.bbox, &self.params)
    }
}

/// Whether some other node's top surface can carry a box of `size` at `pos`.
///
/// Horizontal containment uses the supporter's half-extent plus a fixed
/// slack; the vertical fit must be within the support tolerance.
fn supporter_exists(
    nodes: &BTreeMap<String, Node>,
    exclude: &str,
    pos: DVec3,
    size: DVec3,
    params: &SpatialParams,
) -> bool {
    nodes.values().any(|other| {
        if other.id == exclude || other.is_room() {
            return false;
        }
        let dx = (pos.x - other.pos.x).abs();
        let dy = (pos.y - other.pos.y).abs();
        if dx > other.bbox.x / 2.0 + params.support_xy_slack
            || dy > other.bbox.y / 2.0 + params.support_xy_slack
        {
            return false;
        }
        let expected = top_of(other.pos, other.bbox) + size.z / 2.0;
        (pos.z - expected).abs() <= params.support_z_tol
    })
}

fn validate_in(
    nodes: &BTreeMap<String, Node>,
    exclude: &str,
    pos: DVec3,
    size: DVec3,
    params: &SpatialParams,
) -> DVec3 {
    let size = clamp_extents(size, params.min_extent);
    let gz = grounded_z(size, params.ground_z);
    let grounded = DVec3::new(pos.x, pos.y, gz);
    if pos.z < gz {
        return grounded;
    }
    if pos.z > gz + params.float_ceiling {
        return grounded;
    }
    if (pos.z - gz).abs() <= params.grounded_tol {
        return pos;
    }
    if supporter_exists(nodes, exclude, pos, size, params) {
        pos
    } else {
        grounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Attachment, NodeState, Value};
    use glam::dvec3;
    use setpiece_relate::RelationKind;

    fn store() -> SceneGraph {
        SceneGraph::new(SpatialParams::default())
    }

    fn table() -> Node {
        Node::new("table_1", "table", dvec3(2.0, 1.5, 0.375), dvec3(1.2, 0.8, 0.75))
    }

    #[test]
    fn bootstrap_snaps_floating_nodes_to_the_ground() {
        let mut g = store();
        let chair = Node::new("chair_1", "chair", dvec3(1.0, 1.5, 1.2), dvec3(0.5, 0.5, 0.9));
        g.load_bootstrap(vec![chair], Vec::new());

        let chair = g.get("chair_1").unwrap();
        assert!((chair.pos.z - 0.45).abs() < 1e-3);
        assert_eq!(g.relations().len(), 0);
        let kinds: Vec<&str> = g.events().iter().map(Event::kind).collect();
        assert_eq!(kinds, ["NODE_ADDED", "BOOTSTRAP_LOADED"]);
    }

    #[test]
    fn bootstrap_leaves_pinned_nodes_alone() {
        let mut g = store();
        let mut lamp = Node::new("lamp_1", "lamp", dvec3(1.0, 1.0, 2.4), dvec3(0.2, 0.2, 0.3));
        lamp.state = NodeState::pinned(Some(Attachment::Ceiling));
        g.load_bootstrap(vec![lamp], Vec::new());
        assert_eq!(g.get("lamp_1").unwrap().pos.z, 2.4);
    }

    #[test]
    fn added_floating_nodes_are_grounded_by_validation() {
        let mut g = store();
        let mut patch = GraphPatch::new();
        patch.add_node(Node::new("box_1", "box", dvec3(1.0, 1.0, 1.4), dvec3(0.2, 0.2, 0.2)));
        g.apply_patch(patch).unwrap();
        assert_eq!(g.get("box_1").unwrap().pos.z, 0.1);
    }

    #[test]
    fn a_stacked_node_within_tolerance_is_accepted() {
        let mut g = store();
        g.load_bootstrap(vec![table()], Vec::new());

        let mut patch = GraphPatch::new();
        patch.add_node(Node::new("cup_1", "cup", dvec3(2.0, 1.5, 0.801), dvec3(0.08, 0.08, 0.1)));
        g.apply_patch(patch).unwrap();
        assert_eq!(g.get("cup_1").unwrap().pos.z, 0.801);
    }

    #[test]
    fn flat_extents_are_clamped_and_still_grounded() {
        let mut g = store();
        let mut patch = GraphPatch::new();
        patch.add_node(Node::new("paper_1", "paper", dvec3(1.0, 1.0, 0.0), dvec3(0.3, 0.21, 0.0)));
        g.apply_patch(patch).unwrap();
        let paper = g.get("paper_1").unwrap();
        assert_eq!(paper.bbox.z, 0.01);
        assert_eq!(paper.pos.z, 0.005);
    }

    #[test]
    fn update_of_unknown_node_rejects_the_whole_patch() {
        let mut g = store();
        g.load_bootstrap(vec![table()], Vec::new());
        let before_nodes = g.nodes().clone();
        let before_events = g.events().len();

        let mut patch = GraphPatch::new();
        patch.add_node(Node::new("cup_1", "cup", dvec3(0.5, 0.5, 0.05), dvec3(0.1, 0.1, 0.1)));
        patch.move_node("ghost", dvec3(0.0, 0.0, 0.0));
        let err = g.apply_patch(patch).unwrap_err();
        assert_eq!(err, PatchError::UnknownNode { id: "ghost".to_owned() });

        // Atomic: the add in the same patch did not land either.
        assert_eq!(g.nodes(), &before_nodes);
        assert_eq!(g.events().len(), before_events);
    }

    #[test]
    fn dangling_relation_rejects_the_whole_patch() {
        let mut g = store();
        g.load_bootstrap(vec![table()], Vec::new());
        let mut patch = GraphPatch::new();
        let ts = g.stamp();
        patch.upsert_relation(Relation::new(RelationKind::Near, "table_1", "ghost", ts, 0.9));
        let err = g.apply_patch(patch).unwrap_err();
        assert!(matches!(err, PatchError::DanglingRelation { .. }));
        assert_eq!(g.relations().len(), 0);
    }

    #[test]
    fn lww_keeps_the_newer_relation_on_replay() {
        let mut g = store();
        g.load_bootstrap(
            vec![
                Node::new("a", "box", dvec3(0.0, 0.0, 0.05), dvec3(0.1, 0.1, 0.1)),
                Node::new("b", "box", dvec3(0.3, 0.0, 0.05), dvec3(0.1, 0.1, 0.1)),
            ],
            Vec::new(),
        );

        let mut patch = GraphPatch::new();
        patch.upsert_relation(Relation::new(RelationKind::Near, "a", "b", Stamp(10.0), 0.7));
        g.apply_patch(patch).unwrap();

        let mut patch = GraphPatch::new();
        patch.upsert_relation(Relation::new(RelationKind::Near, "a", "b", Stamp(9.0), 0.9));
        g.apply_patch(patch).unwrap();

        let key = RelKey::new(RelationKind::Near, "a", "b");
        assert_eq!(g.relations()[&key].conf, 0.7);
        assert_eq!(g.relations()[&key].ts, Stamp(10.0));

        // Equal stamps: the incoming write wins.
        let mut patch = GraphPatch::new();
        patch.upsert_relation(Relation::new(RelationKind::Near, "a", "b", Stamp(10.0), 0.8));
        g.apply_patch(patch).unwrap();
        assert_eq!(g.relations()[&key].conf, 0.8);
    }

    #[test]
    fn moving_a_supporter_and_its_rider_in_one_patch_keeps_the_stack() {
        let mut g = store();
        g.load_bootstrap(vec![table()], Vec::new());
        let mut patch = GraphPatch::new();
        patch.add_node(Node::new("book_1", "book", dvec3(2.0, 1.5, 0.765), dvec3(0.23, 0.15, 0.03)));
        g.apply_patch(patch).unwrap();

        let mut patch = GraphPatch::new();
        patch.move_node("table_1", dvec3(3.0, 1.5, 0.375));
        patch.move_node("book_1", dvec3(3.0, 1.5, 0.765));
        g.apply_patch(patch).unwrap();

        // The book validated against the moved table, so it kept its height.
        assert_eq!(g.get("book_1").unwrap().pos.z, 0.765);
        assert_eq!(g.get("table_1").unwrap().pos.x, 3.0);
    }

    #[test]
    fn moving_a_rider_away_from_its_supporter_grounds_it() {
        let mut g = store();
        g.load_bootstrap(vec![table()], Vec::new());
        let mut patch = GraphPatch::new();
        patch.add_node(Node::new("book_1", "book", dvec3(2.0, 1.5, 0.765), dvec3(0.23, 0.15, 0.03)));
        g.apply_patch(patch).unwrap();

        let mut patch = GraphPatch::new();
        patch.move_node("book_1", dvec3(0.5, 0.5, 0.765));
        g.apply_patch(patch).unwrap();
        assert_eq!(g.get("book_1").unwrap().pos.z, 0.015);
    }

    #[test]
    fn removing_a_node_purges_every_touching_relation() {
        let mut g = store();
        g.load_bootstrap(
            vec![
                Node::new("a", "box", dvec3(0.0, 0.0, 0.05), dvec3(0.1, 0.1, 0.1)),
                Node::new("b", "box", dvec3(0.3, 0.0, 0.05), dvec3(0.1, 0.1, 0.1)),
                Node::new("c", "box", dvec3(0.6, 0.0, 0.05), dvec3(0.1, 0.1, 0.1)),
            ],
            Vec::new(),
        );
        let mut patch = GraphPatch::new();
        let ts = g.stamp();
        patch.upsert_relation(Relation::new(RelationKind::Near, "a", "b", ts, 0.9));
        patch.upsert_relation(Relation::new(RelationKind::Near, "b", "a", ts, 0.9));
        patch.upsert_relation(Relation::new(RelationKind::Near, "b", "c", ts, 0.9));
        g.apply_patch(patch).unwrap();

        g.remove_node("a");
        assert!(g.get("a").is_none());
        assert!(g.relations().keys().all(|key| !key.touches("a")));
        assert_eq!(g.relations().len(), 1);
    }

    #[test]
    fn neighbors_respects_the_radius_and_excludes_self() {
        let mut g = store();
        g.load_bootstrap(
            vec![
                Node::new("a", "box", dvec3(0.0, 0.0, 0.05), dvec3(0.1, 0.1, 0.1)),
                Node::new("b", "box", dvec3(1.0, 0.0, 0.05), dvec3(0.1, 0.1, 0.1)),
                Node::new("c", "box", dvec3(4.0, 0.0, 0.05), dvec3(0.1, 0.1, 0.1)),
            ],
            Vec::new(),
        );
        let ids: Vec<&str> = g.neighbors("a", 1.5).iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["b"]);
    }

    #[test]
    fn llm_context_selects_nearest_and_raises_notices() {
        let mut g = store();
        let mut stove = Node::new("stove_1", "stove", dvec3(1.0, 1.0, 0.4), dvec3(0.6, 0.6, 0.8));
        stove
            .state
            .extra
            .insert("power".to_owned(), Value::Text("on".to_owned()));
        g.load_bootstrap(
            vec![
                stove,
                Node::new("cup_1", "cup", dvec3(1.2, 1.0, 0.05), dvec3(0.1, 0.1, 0.1)),
                Node::new("chair_1", "chair", dvec3(9.0, 9.0, 0.45), dvec3(0.5, 0.5, 0.9)),
            ],
            Vec::new(),
        );
        let ctx = g.llm_context(dvec3(1.0, 1.0, 1.6), "kitchen", 2);
        assert_eq!(ctx.objects.len(), 2);
        assert_eq!(ctx.objects[0].id, "stove_1");
        assert_eq!(ctx.notices, ["Stove is ON nearby."]);
        assert_eq!(ctx.summary, "You are in kitchen. 2 objects nearby.");
        assert_eq!(ctx.frame, "map");
    }

    #[test]
    fn validation_sweep_reports_corrections_without_mutating() {
        let mut g = SceneGraph::with_auto_physics(SpatialParams::default(), false);
        g.load_bootstrap(
            vec![Node::new("box_1", "box", dvec3(1.0, 1.0, 1.4), dvec3(0.2, 0.2, 0.2))],
            Vec::new(),
        );
        // auto physics off: the node is still floating.
        assert_eq!(g.get("box_1").unwrap().pos.z, 1.4);
        let corrections = g.validation_sweep();
        assert_eq!(corrections, vec![("box_1".to_owned(), dvec3(1.0, 1.0, 0.1))]);
        assert_eq!(g.get("box_1").unwrap().pos.z, 1.4);
    }
}
