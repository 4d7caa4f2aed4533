// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The placement engine: intent in, valid position out.

use core::f64::consts::{FRAC_PI_4, TAU};

use glam::DVec3;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::debug;

use setpiece_collision::{CollisionReport, ColliderIndex};
use setpiece_geom::{SpatialParams, clamp_extents, distance_2d_xy, grounded_z, top_of};
use setpiece_graph::{Node, SceneGraph};

use crate::error::PlacementError;

/// Semantic input to the placement engine.
#[derive(Clone, Debug, PartialEq)]
pub enum Placement {
    /// On the named object's top surface.
    OnTopOf(String),
    /// On the ground near the named object.
    Near(String),
    /// Anywhere free on the ground within scene bounds.
    Ground,
    /// At a proposed position, validated and collision-adjusted.
    Custom(DVec3),
}

/// Computes physically valid positions for placement intents.
///
/// The engine owns a collider index (synchronized from the store before
/// every query, excluding the object being placed) and a random source for
/// candidate sampling. `new` seeds the source deterministically; use
/// [`PlacementEngine::with_rng`] for entropy or a test-specific seed.
#[derive(Debug)]
pub struct PlacementEngine<R = SmallRng> {
    params: SpatialParams,
    index: ColliderIndex,
    rng: R,
}

impl PlacementEngine<SmallRng> {
    /// An engine with a deterministic default seed.
    #[must_use]
    pub fn new(params: SpatialParams) -> Self {
        Self::with_rng(params, SmallRng::seed_from_u64(0))
    }
}

impl<R: Rng> PlacementEngine<R> {
    /// An engine using the supplied random source.
    #[must_use]
    pub fn with_rng(params: SpatialParams, rng: R) -> Self {
        Self {
            params,
            index: ColliderIndex::new(params),
            rng,
        }
    }

    /// Resolves `intent` into a position for an object of `size`.
    ///
    /// `object_id` names the object being placed so its own stale box never
    /// blocks it. `randomness` in `[0, 1]` scales surface offsets and
    /// near-placement jitter. Falls back intent by intent (`near` → `ground`,
    /// `custom` → `ground`) and only errs when even ground placement finds
    /// no free spot.
    pub fn place(
        &mut self,
        graph: &SceneGraph,
        object_id: &str,
        size: DVec3,
        intent: &Placement,
        randomness: f64,
    ) -> Result<DVec3, PlacementError> {
        let size = clamp_extents(size, self.params.min_extent);
        self.sync(graph, Some(object_id));

        match intent {
            Placement::OnTopOf(target) => match graph.get(target) {
                Some(target) => Ok(self.place_on_surface(target, size, randomness)),
                None => self.place_on_ground(size),
            },
            Placement::Near(target) => match graph.get(target) {
                Some(target) => self.place_near(target, size, randomness),
                None => self.place_on_ground(size),
            },
            Placement::Ground => self.place_on_ground(size),
            Placement::Custom(pos) => {
                let validated = graph.validate_position(object_id, *pos, size);
                match self
                    .index
                    .find_safe_position(&mut self.rng, size, validated, 0.8, 15)
                {
                    Some(found) => Ok(found),
                    None => self.place_on_ground(size),
                }
            }
        }
    }

    /// Synchronizes the index with the store and returns the layout report.
    pub fn collision_report(&mut self, graph: &SceneGraph) -> CollisionReport {
        self.sync(graph, None);
        self.index.report()
    }

    /// Rebuilds the collider index from the store, skipping rooms and the
    /// object being placed.
    fn sync(&mut self, graph: &SceneGraph, exclude: Option<&str>) {
        self.index.clear();
        for node in graph.nodes().values() {
            if node.is_room() || exclude == Some(node.id.as_str()) {
                continue;
            }
            self.index.upsert(&node.id, node.pos, node.bbox);
        }
    }

    /// Samples up to ten offsets on the target's top surface, accepting the
    /// first that collides with nothing except the target itself; otherwise
    /// places at the exact surface centre.
    fn place_on_surface(&mut self, target: &Node, size: DVec3, randomness: f64) -> DVec3 {
        let surface_z = top_of(target.pos, target.bbox) + size.z / 2.0 + self.params.placement_eps;
        let max_offset = target.bbox.x.min(target.bbox.y) * 0.3;

        for _ in 0..10 {
            let dx = self.rng.random_range(-max_offset..=max_offset) * randomness;
            let dy = self.rng.random_range(-max_offset..=max_offset) * randomness;
            let candidate = DVec3::new(target.pos.x + dx, target.pos.y + dy, surface_z);
            let hits = self.index.collides_at(None, candidate, size);
            if hits.iter().all(|id| *id == target.id) {
                return candidate;
            }
        }
        debug!(target = %target.id, "surface crowded, placing at centre");
        DVec3::new(target.pos.x, target.pos.y, surface_z)
    }

    /// Ground placement at a random bearing and clearance from the target,
    /// with optional jitter, falling back to plain ground placement.
    fn place_near(
        &mut self,
        target: &Node,
        size: DVec3,
        randomness: f64,
    ) -> Result<DVec3, PlacementError> {
        let min_d = 0.3 + size.max_element() / 2.0;
        let max_d = min_d.max(0.8);
        let theta = self.rng.random_range(0.0..TAU);
        let d = self.rng.random_range(min_d..=max_d);
        let preferred = DVec3::new(
            target.pos.x + d * theta.cos(),
            target.pos.y + d * theta.sin(),
            grounded_z(size, self.params.ground_z),
        );

        let Some(found) = self
            .index
            .find_safe_position(&mut self.rng, size, preferred, 0.8, 15)
        else {
            return self.place_on_ground(size);
        };

        if randomness > 0.0 {
            let angle_jitter = self.rng.random_range(-FRAC_PI_4..=FRAC_PI_4) * randomness;
            let dist_jitter = self.rng.random_range(-0.1..=0.1) * randomness;
            let bearing = (found.y - target.pos.y).atan2(found.x - target.pos.x) + angle_jitter;
            let dist = (distance_2d_xy(found, target.pos) + dist_jitter).max(min_d);
            return Ok(DVec3::new(
                target.pos.x + dist * bearing.cos(),
                target.pos.y + dist * bearing.sin(),
                grounded_z(size, self.params.ground_z),
            ));
        }
        Ok(found)
    }

    /// Uniform sampling inside the scene bounds, then the fixed fallback
    /// corner. Errs when even the corner is occupied.
    fn place_on_ground(&mut self, size: DVec3) -> Result<DVec3, PlacementError> {
        let bounds = self.params.bounds;
        let gz = grounded_z(size, self.params.ground_z);
        const ATTEMPTS: usize = 25;

        for _ in 0..ATTEMPTS {
            let candidate = DVec3::new(
                self.rng.random_range(bounds.min.x..=bounds.max.x),
                self.rng.random_range(bounds.min.y..=bounds.max.y),
                gz,
            );
            if self.index.collides_at(None, candidate, size).is_empty() {
                return Ok(candidate);
            }
        }

        let fallback = DVec3::new(bounds.min.x + 0.5, bounds.min.y + 0.5, gz);
        if self.index.collides_at(None, fallback, size).is_empty() {
            Ok(fallback)
        } else {
            Err(PlacementError::NoSafePosition { attempts: ATTEMPTS })
        }
    }
}
