// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The command executor driving the whole core.

use std::collections::{BTreeMap, BTreeSet};

use glam::DVec3;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, warn};

use setpiece_agents::{Agent, Bus, make_agents};
use setpiece_collision::CollisionReport;
use setpiece_geom::{SpatialParams, clamp_extents, grounded_z};
use setpiece_graph::{
    GraphPatch, LlmContext, Node, NodeUpdate, Relation, SceneGraph,
};
use setpiece_physics::{
    Placement, PlacementEngine, SupportSummary, SupportTracker, settle_after_removal,
    translation_patch,
};
use setpiece_relate::{RelationKind, classify};

use crate::bootstrap::BootstrapPayload;
use crate::command::{AddCommand, Command, Outcome, Selector, SpatialRelation};
use crate::error::CommandError;

/// Owns the store, bus, agents, support tracker, and placement engine, and
/// executes structured commands against them.
///
/// The session is the single-threaded driver of the core: external callers
/// (language front-ends, tool layers) serialize their access to it. Every
/// command is all-or-nothing — placement and resolution run before any
/// mutation lands, and patches apply atomically.
#[derive(Debug)]
pub struct Session {
    params: SpatialParams,
    graph: SceneGraph,
    bus: Bus,
    agents: BTreeMap<String, Agent>,
    tracker: SupportTracker,
    engine: PlacementEngine<SmallRng>,
    rng: SmallRng,
    counters: BTreeMap<String, usize>,
}

impl Session {
    /// A session with a deterministic default seed.
    #[must_use]
    pub fn new(params: SpatialParams) -> Self {
        Self::with_seed(params, 0)
    }

    /// A session whose placement and gravity sampling derive from `seed`.
    #[must_use]
    pub fn with_seed(params: SpatialParams, seed: u64) -> Self {
        Self {
            params,
            graph: SceneGraph::new(params),
            bus: Bus::new(),
            agents: BTreeMap::new(),
            tracker: SupportTracker::new(),
            engine: PlacementEngine::with_rng(params, SmallRng::seed_from_u64(seed)),
            rng: SmallRng::seed_from_u64(seed.wrapping_add(1)),
            counters: BTreeMap::new(),
        }
    }

    /// The scene graph store.
    #[must_use]
    pub const fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// The support tracker, as of the last inference.
    #[must_use]
    pub const fn tracker(&self) -> &SupportTracker {
        &self.tracker
    }

    /// The message bus.
    #[must_use]
    pub const fn bus(&self) -> &Bus {
        &self.bus
    }

    /// The live agents, by node id.
    #[must_use]
    pub const fn agents(&self) -> &BTreeMap<String, Agent> {
        &self.agents
    }

    /// Loads a bootstrap payload, builds one agent per object, and infers
    /// initial support. Callers typically run a few [`Session::tick`]s
    /// afterwards to seed near/far relations.
    pub fn load_bootstrap(&mut self, payload: BootstrapPayload) {
        let scene = payload.scene;
        let mut nodes: Vec<Node> = scene.rooms.into_iter().map(|r| r.into_node()).collect();
        let mut object_ids = Vec::new();
        for object in scene.objects {
            let node = object.into_node();
            object_ids.push(node.id.clone());
            nodes.push(node);
        }
        let default_ts = self.graph.stamp();
        let relations = scene
            .relations
            .into_iter()
            .filter_map(|r| r.into_relation(default_ts))
            .collect();
        self.graph.load_bootstrap(nodes, relations);
        self.agents = make_agents(&self.graph, &object_ids, self.params);
        self.refresh_support();
    }

    /// Runs one negotiation round.
    pub fn tick(&mut self) {
        setpiece_agents::tick(&mut self.graph, &mut self.bus, &mut self.agents);
    }

    /// Runs `n` negotiation rounds.
    pub fn run_ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Applies an externally built patch, then re-infers support.
    pub fn apply_patch(&mut self, patch: GraphPatch) -> Result<(), CommandError> {
        self.graph.apply_patch(patch)?;
        self.refresh_support();
        Ok(())
    }

    /// Executes a structured command.
    pub fn execute(&mut self, command: Command) -> Result<Outcome, CommandError> {
        match command {
            Command::Add(add) => self.execute_add(add),
            Command::Move {
                selector,
                target_object,
                spatial_relation,
                position,
            } => self.execute_move(selector, target_object, spatial_relation, position),
            Command::Remove { selector } => self.execute_remove(selector),
        }
    }

    /// Read-only scene summary around a pose; see
    /// [`SceneGraph::llm_context`].
    #[must_use]
    pub fn llm_context(&self, agent_pose: DVec3, roi: &str, k: usize) -> LlmContext {
        self.graph.llm_context(agent_pose, roi, k)
    }

    /// Re-validates every node without mutating and returns the corrections
    /// validation would apply.
    #[must_use]
    pub fn validate_scene(&self) -> Vec<(String, DVec3)> {
        self.graph.validation_sweep()
    }

    /// Forces every non-pinned object to the ground. Emergency use.
    pub fn force_ground(&mut self) -> Result<Vec<String>, CommandError> {
        let mut patch = GraphPatch::new();
        for (id, node) in self.graph.nodes() {
            if node.state.is_pinned() || node.is_room() {
                continue;
            }
            let gz = grounded_z(node.bbox, self.params.ground_z);
            if (node.pos.z - gz).abs() > 1e-9 {
                patch.update_nodes.insert(
                    id.clone(),
                    NodeUpdate::pos(DVec3::new(node.pos.x, node.pos.y, gz)),
                );
            }
        }
        let grounded: Vec<String> = patch.update_nodes.keys().cloned().collect();
        if !patch.is_empty() {
            self.graph.apply_patch(patch)?;
            self.refresh_support();
        }
        Ok(grounded)
    }

    /// Synchronizes the collision cache and reports the layout.
    pub fn collision_report(&mut self) -> CollisionReport {
        self.engine.collision_report(&self.graph)
    }

    /// Census of grounded, supported, and floating objects.
    #[must_use]
    pub fn support_summary(&self) -> SupportSummary {
        self.tracker.summary(&self.graph, &self.params)
    }

    fn execute_add(&mut self, add: AddCommand) -> Result<Outcome, CommandError> {
        let quantity = add.quantity.max(1);
        let target_id = match &add.target_object {
            Some(target) => Some(self.resolve(target)?),
            None => None,
        };
        if let Some(room) = &add.room
            && self.graph.get(room).is_none()
        {
            return Err(self.unknown(room));
        }
        let size = clamp_extents(
            add.size.unwrap_or_else(|| DVec3::splat(0.1)),
            self.params.min_extent,
        );
        let base = self.counters.get(&add.object_type).copied().unwrap_or(0);

        // Place against a staged copy so multi-adds see each other and a
        // failure mid-way leaves the real scene untouched.
        let mut staged = self.graph.clone();
        let mut new_nodes = Vec::new();
        for i in 0..quantity {
            let object_id = if quantity == 1 {
                add.object_id
                    .clone()
                    .unwrap_or_else(|| format!("{}_{}", add.object_type, base + 1))
            } else {
                format!("{}_{}", add.object_type, base + i + 1)
            };
            let intent = match (add.spatial_relation, &target_id, add.position) {
                (SpatialRelation::OnTopOf, Some(target), _) => {
                    Placement::OnTopOf(target.clone())
                }
                (SpatialRelation::Near, Some(target), _) => Placement::Near(target.clone()),
                (SpatialRelation::Custom, _, Some(position)) => Placement::Custom(position),
                _ => Placement::Ground,
            };
            let pos = self.engine.place(&staged, &object_id, size, &intent, 0.3)?;
            debug!(id = %object_id, ?pos, "object placed");

            let mut node = Node::new(object_id, add.object_type.clone(), pos, size);
            node.name = display_name(&add.object_type, base + i + 1);
            node.aff = add.affordances.clone();
            node.state = add.state.clone();
            node.meta = add.meta.clone();
            node.conf = add.conf;

            let mut stage_patch = GraphPatch::new();
            stage_patch.add_node(node.clone());
            staged.apply_patch(stage_patch)?;
            new_nodes.push(node);
        }

        let mut patch = GraphPatch::new();
        for node in &new_nodes {
            patch.add_node(node.clone());
        }
        if let Some(room) = &add.room {
            for node in &new_nodes {
                let ts = self.graph.stamp();
                patch.upsert_relation(Relation::new(
                    RelationKind::In,
                    node.id.clone(),
                    room.clone(),
                    ts,
                    1.0,
                ));
            }
        }
        self.graph.apply_patch(patch)?;

        let added: Vec<String> = new_nodes.iter().map(|n| n.id.clone()).collect();
        for node in new_nodes {
            self.agents
                .insert(node.id.clone(), Agent::new(&node.id, &node.class, self.params));
        }
        self.counters.insert(add.object_type.clone(), base + quantity);
        self.refresh_support();

        let message = if added.len() == 1 {
            format!("Added {} {:?} to the scene", add.object_type, added[0])
        } else {
            format!(
                "Added {} {}s to the scene: {}",
                added.len(),
                add.object_type,
                added.join(", ")
            )
        };
        Ok(Outcome {
            message,
            affected: added,
        })
    }

    fn execute_move(
        &mut self,
        selector: Selector,
        target_object: Option<String>,
        spatial_relation: Option<SpatialRelation>,
        position: Option<DVec3>,
    ) -> Result<Outcome, CommandError> {
        let ids = match selector {
            Selector::Id(id) => vec![self.resolve(&id)?],
            Selector::Class { class, quantity } => self.resolve_many(&class, quantity)?,
        };
        let target_id = match &target_object {
            Some(target) => Some(self.resolve(target)?),
            None => None,
        };
        self.tracker = SupportTracker::infer(&self.graph, &self.params);

        let mut carried = 0;
        for id in &ids {
            let bbox = self
                .graph
                .get(id)
                .map(|node| node.bbox)
                .ok_or_else(|| self.unknown(id))?;
            let intent = match (spatial_relation, &target_id, position) {
                (Some(SpatialRelation::OnTopOf), Some(target), _) => {
                    Placement::OnTopOf(target.clone())
                }
                (Some(SpatialRelation::Near), Some(target), _) => Placement::Near(target.clone()),
                (Some(SpatialRelation::Custom), _, Some(position)) => Placement::Custom(position),
                _ => match &target_id {
                    Some(target) => Placement::Near(target.clone()),
                    None => Placement::Ground,
                },
            };
            let new_pos = self.engine.place(&self.graph, id, bbox, &intent, 0.2)?;
            let patch = translation_patch(&self.graph, &self.tracker, id, new_pos);
            carried += patch.update_nodes.len().saturating_sub(1);
            self.graph.apply_patch(patch)?;
        }
        self.refresh_support();

        let mut message = format!("Moved {}", ids.join(", "));
        if carried > 0 {
            message.push_str(&format!(" (carried {carried} dependent object(s))"));
        }
        Ok(Outcome {
            message,
            affected: ids,
        })
    }

    fn execute_remove(&mut self, selector: Selector) -> Result<Outcome, CommandError> {
        let id = match selector {
            Selector::Id(id) => self.resolve(&id)?,
            Selector::Class { class, .. } => {
                let mut ids = self.resolve_many(&class, 1)?;
                match ids.pop() {
                    Some(id) => id,
                    None => return Err(self.unknown(&class)),
                }
            }
        };

        self.tracker = SupportTracker::infer(&self.graph, &self.params);
        let falling = self.tracker.dependents_recursive(&id);
        self.tracker.remove_object(&id);

        let moves =
            settle_after_removal(&self.graph, &id, &falling, &mut self.rng, &self.params);
        if !moves.is_empty() {
            let mut patch = GraphPatch::new();
            for (fallen, pos) in &moves {
                patch.move_node(fallen.clone(), *pos);
            }
            self.graph.apply_patch(patch)?;
        }

        self.agents.remove(&id);
        self.graph.remove_node(&id);
        self.refresh_support();

        let mut message = format!("Removed {id} from the scene");
        if !moves.is_empty() {
            let fallen: Vec<&str> = moves.iter().map(|(id, _)| id.as_str()).collect();
            message.push_str(&format!(
                ". {} object(s) fell due to gravity: {}",
                fallen.len(),
                fallen.join(", ")
            ));
        }
        Ok(Outcome {
            message,
            affected: vec![id],
        })
    }

    /// Resolves a user-facing object reference: exact id, then partial id,
    /// then class match, ascending.
    fn resolve(&self, wanted: &str) -> Result<String, CommandError> {
        if self.graph.get(wanted).is_some() {
            return Ok(wanted.to_owned());
        }
        let lowered = wanted.to_lowercase();
        for id in self.graph.nodes().keys() {
            if id.to_lowercase().contains(&lowered) {
                return Ok(id.clone());
            }
        }
        for (id, node) in self.graph.nodes() {
            if node.class.to_lowercase() == lowered {
                return Ok(id.clone());
            }
        }
        Err(self.unknown(wanted))
    }

    /// The first `quantity` nodes of `class`, ascending by id.
    fn resolve_many(&self, class: &str, quantity: usize) -> Result<Vec<String>, CommandError> {
        let matching: Vec<String> = self
            .graph
            .nodes()
            .iter()
            .filter(|(_, node)| node.class == class)
            .map(|(id, _)| id.clone())
            .collect();
        if matching.len() < quantity {
            return Err(CommandError::AmbiguousTarget {
                object_type: class.to_owned(),
                requested: quantity,
                found: matching.len(),
            });
        }
        Ok(matching.into_iter().take(quantity).collect())
    }

    fn unknown(&self, wanted: &str) -> CommandError {
        CommandError::UnknownObject {
            wanted: wanted.to_owned(),
            available: self.graph.nodes().keys().cloned().collect(),
        }
    }

    /// Re-infers support from geometry and synchronizes the dual
    /// `supports`/`on_top_of` relations in the store with the tracker.
    ///
    /// Relation sync is best-effort: the scene is already valid when it
    /// runs, so a failure only leaves relations stale until the next pass.
    fn refresh_support(&mut self) {
        self.tracker = SupportTracker::infer(&self.graph, &self.params);
        let edges: BTreeSet<(String, String)> = self
            .tracker
            .edges()
            .map(|(a, b)| (a.to_owned(), b.to_owned()))
            .collect();

        let mut patch = GraphPatch::new();
        for key in self.graph.relations().keys() {
            let stale = match key.kind {
                RelationKind::Supports => {
                    !edges.contains(&(key.b.clone(), key.a.clone()))
                }
                RelationKind::OnTopOf => !edges.contains(&(key.a.clone(), key.b.clone())),
                _ => false,
            };
            if stale {
                patch.remove_relation(key.clone());
            }
        }

        let mut upserts = Vec::new();
        for (child_id, parent_id) in &edges {
            let (Some(child), Some(parent)) =
                (self.graph.get(child_id), self.graph.get(parent_id))
            else {
                continue;
            };
            let on_top = classify(&child.placed(), &parent.placed(), &self.params);
            let supports = classify(&parent.placed(), &child.placed(), &self.params);
            if on_top.kind == RelationKind::OnTopOf && supports.kind == RelationKind::Supports {
                upserts.push((child_id.clone(), parent_id.clone(), on_top, supports));
            }
        }
        for (child, parent, on_top, supports) in upserts {
            let ts = self.graph.stamp();
            patch.upsert_relation(Relation {
                kind: RelationKind::OnTopOf,
                a: child.clone(),
                b: parent.clone(),
                props: on_top.props,
                ts,
                conf: on_top.conf,
            });
            let ts = self.graph.stamp();
            patch.upsert_relation(Relation {
                kind: RelationKind::Supports,
                a: parent,
                b: child,
                props: supports.props,
                ts,
                conf: supports.conf,
            });
        }

        if !patch.is_empty()
            && let Err(err) = self.graph.apply_patch(patch)
        {
            warn!(%err, "support relation sync failed");
        }
    }
}

/// `"coffee_cup", 2` → `"Coffee Cup 2"`.
fn display_name(object_type: &str, count: usize) -> String {
    let title: Vec<String> = object_type
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    format!("{} {count}", title.join(" "))
}
