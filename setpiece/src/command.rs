// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The structured command surface consumed by language front-ends.

use std::collections::BTreeMap;

use glam::DVec3;

use setpiece_graph::{NodeState, Value};

/// Where a new or moved object should go, relative to a target.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SpatialRelation {
    /// On the target's top surface.
    OnTopOf,
    /// On the ground near the target.
    Near,
    /// At an explicitly proposed position.
    Custom,
    /// No preference; the engine picks a free spot on the ground.
    #[default]
    None,
}

/// Picks the object(s) a command operates on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// A single object by id (exact, partial, or class match).
    Id(String),
    /// The first `quantity` objects of a class, in ascending id order.
    Class {
        /// Class tag to match.
        class: String,
        /// How many objects.
        quantity: usize,
    },
}

/// Everything needed to add one or more objects.
#[derive(Clone, Debug, PartialEq)]
pub struct AddCommand {
    /// Class tag of the new object(s).
    pub object_type: String,
    /// Explicit id for a single add; generated when absent.
    pub object_id: Option<String>,
    /// Target for `OnTopOf` / `Near` placement.
    pub target_object: Option<String>,
    /// Placement preference.
    pub spatial_relation: SpatialRelation,
    /// Proposed position for `Custom` placement.
    pub position: Option<DVec3>,
    /// Full extents; a 0.1 m cube when absent.
    pub size: Option<DVec3>,
    /// Affordance tags.
    pub affordances: Vec<String>,
    /// Initial state.
    pub state: NodeState,
    /// Opaque metadata.
    pub meta: BTreeMap<String, Value>,
    /// Initial confidence.
    pub conf: f64,
    /// Room to attach the object(s) to with an `in` relation.
    pub room: Option<String>,
    /// How many instances to add.
    pub quantity: usize,
}

impl AddCommand {
    /// An add of one object of `object_type` with defaults everywhere else.
    #[must_use]
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: None,
            target_object: None,
            spatial_relation: SpatialRelation::default(),
            position: None,
            size: None,
            affordances: Vec::new(),
            state: NodeState::default(),
            meta: BTreeMap::new(),
            conf: 0.9,
            room: None,
            quantity: 1,
        }
    }

    /// Sets the placement target and relation.
    #[must_use]
    pub fn onto(mut self, target: impl Into<String>) -> Self {
        self.target_object = Some(target.into());
        self.spatial_relation = SpatialRelation::OnTopOf;
        self
    }

    /// Places the object near `target`.
    #[must_use]
    pub fn near(mut self, target: impl Into<String>) -> Self {
        self.target_object = Some(target.into());
        self.spatial_relation = SpatialRelation::Near;
        self
    }

    /// Proposes an exact position, subject to physics validation.
    #[must_use]
    pub fn at(mut self, position: DVec3) -> Self {
        self.position = Some(position);
        self.spatial_relation = SpatialRelation::Custom;
        self
    }

    /// Sets the extents.
    #[must_use]
    pub fn sized(mut self, size: DVec3) -> Self {
        self.size = Some(size);
        self
    }

    /// Attaches the object(s) to a room.
    #[must_use]
    pub fn in_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    /// Requests several instances.
    #[must_use]
    pub fn times(mut self, quantity: usize) -> Self {
        self.quantity = quantity;
        self
    }
}

/// A mutation request against the scene.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Add object(s) via the placement engine.
    Add(AddCommand),
    /// Move object(s), carrying their recursive dependents along.
    Move {
        /// Which object(s).
        selector: Selector,
        /// Optional placement target.
        target_object: Option<String>,
        /// Optional placement preference; defaults to near-the-target when
        /// a target is given, otherwise ground.
        spatial_relation: Option<SpatialRelation>,
        /// Proposed position for `Custom`.
        position: Option<DVec3>,
    },
    /// Remove an object, cascading gravity over its dependents.
    Remove {
        /// Which object.
        selector: Selector,
    },
}

/// What a successful command did.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    /// Human-readable summary.
    pub message: String,
    /// Ids the command created, moved, or removed, in order.
    pub affected: Vec<String>,
}
