// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CRDT-lite deltas applied atomically to the store.

use std::collections::BTreeMap;

use glam::DVec3;

use crate::node::{Lom, Node, NodeState, Value};
use crate::relation::{RelKey, Relation};

bitflags::bitflags! {
    /// Which node fields an update touched; recorded in the event log.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FieldMask: u16 {
        /// Position.
        const POS   = 1 << 0;
        /// Orientation.
        const ORI   = 1 << 1;
        /// Extents.
        const BBOX  = 1 << 2;
        /// Affordances.
        const AFF   = 1 << 3;
        /// Level of mobility.
        const LOM   = 1 << 4;
        /// Confidence.
        const CONF  = 1 << 5;
        /// State.
        const STATE = 1 << 6;
        /// Metadata.
        const META  = 1 << 7;
        /// Name.
        const NAME  = 1 << 8;
    }
}

/// Field-wise override of an existing node. Unset fields are untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeUpdate {
    /// New position.
    pub pos: Option<DVec3>,
    /// New orientation.
    pub ori: Option<[f64; 4]>,
    /// New extents.
    pub bbox: Option<DVec3>,
    /// New affordances.
    pub aff: Option<Vec<String>>,
    /// New level of mobility.
    pub lom: Option<Lom>,
    /// New confidence.
    pub conf: Option<f64>,
    /// New state.
    pub state: Option<NodeState>,
    /// New metadata.
    pub meta: Option<BTreeMap<String, Value>>,
    /// New name.
    pub name: Option<String>,
}

impl NodeUpdate {
    /// An update that only moves the node.
    #[must_use]
    pub fn pos(pos: DVec3) -> Self {
        Self {
            pos: Some(pos),
            ..Self::default()
        }
    }

    /// Mask of the fields this update sets.
    #[must_use]
    pub fn mask(&self) -> FieldMask {
        let mut mask = FieldMask::empty();
        mask.set(FieldMask::POS, self.pos.is_some());
        mask.set(FieldMask::ORI, self.ori.is_some());
        mask.set(FieldMask::BBOX, self.bbox.is_some());
        mask.set(FieldMask::AFF, self.aff.is_some());
        mask.set(FieldMask::LOM, self.lom.is_some());
        mask.set(FieldMask::CONF, self.conf.is_some());
        mask.set(FieldMask::STATE, self.state.is_some());
        mask.set(FieldMask::META, self.meta.is_some());
        mask.set(FieldMask::NAME, self.name.is_some());
        mask
    }

    /// Writes the set fields onto `node`.
    pub fn apply_to(&self, node: &mut Node) {
        if let Some(pos) = self.pos {
            node.pos = pos;
        }
        if let Some(ori) = self.ori {
            node.ori = ori;
        }
        if let Some(bbox) = self.bbox {
            node.bbox = bbox;
        }
        if let Some(aff) = &self.aff {
            node.aff = aff.clone();
        }
        if let Some(lom) = self.lom {
            node.lom = lom;
        }
        if let Some(conf) = self.conf {
            node.conf = conf;
        }
        if let Some(state) = &self.state {
            node.state = state.clone();
        }
        if let Some(meta) = &self.meta {
            node.meta = meta.clone();
        }
        if let Some(name) = &self.name {
            node.name = name.clone();
        }
    }
}

/// A delta against the store: node adds, node updates, relation removals,
/// and relation upserts.
///
/// Buckets apply in exactly that order; see
/// [`SceneGraph::apply_patch`](crate::SceneGraph::apply_patch).
#[derive(Clone, Debug, Default)]
pub struct GraphPatch {
    /// Nodes to insert, by id.
    pub add_nodes: BTreeMap<String, Node>,
    /// Per-id field overrides.
    pub update_nodes: BTreeMap<String, NodeUpdate>,
    /// Relations to upsert under LWW.
    pub add_relations: Vec<Relation>,
    /// Relation keys to remove.
    pub remove_relations: Vec<RelKey>,
}

impl GraphPatch {
    /// An empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no bucket has content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add_nodes.is_empty()
            && self.update_nodes.is_empty()
            && self.add_relations.is_empty()
            && self.remove_relations.is_empty()
    }

    /// Queues a node insertion.
    pub fn add_node(&mut self, node: Node) {
        self.add_nodes.insert(node.id.clone(), node);
    }

    /// Queues a position move.
    pub fn move_node(&mut self, id: impl Into<String>, pos: DVec3) {
        self.update_nodes.insert(id.into(), NodeUpdate::pos(pos));
    }

    /// Queues a relation upsert.
    pub fn upsert_relation(&mut self, relation: Relation) {
        self.add_relations.push(relation);
    }

    /// Queues a relation removal.
    pub fn remove_relation(&mut self, key: RelKey) {
        self.remove_relations.push(key);
    }
}
