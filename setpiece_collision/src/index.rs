// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat slot-vector collider registry with linear scans.

use core::f64::consts::TAU;
use core::fmt;

use glam::DVec3;
use hashbrown::HashMap;
use rand::Rng;
use smallvec::SmallVec;
use tracing::{debug, trace};

use setpiece_geom::{Aabb3, SpatialParams, clamp_extents, grounded_z};

/// Diagnostic summary of the registered layout.
///
/// Pairs are computed without the safety margin, so they report hard
/// overlaps only.
#[derive(Clone, Debug, Default)]
pub struct CollisionReport {
    /// Number of registered boxes.
    pub total_objects: usize,
    /// Ids of boxes that hard-overlap, each unordered pair once.
    pub colliding_pairs: Vec<(String, String)>,
}

/// Registry of axis-aligned boxes for collision queries, keyed by object id.
///
/// Slots are reused after removal; ids are interned into a side map. Queries
/// are linear over live slots.
pub struct ColliderIndex {
    params: SpatialParams,
    slots: HashMap<String, usize>,
    ids: Vec<Option<String>>,
    boxes: Vec<Option<Aabb3>>,
    free: Vec<usize>,
}

impl ColliderIndex {
    /// Creates an empty index using `params` for margins and ground height.
    #[must_use]
    pub fn new(params: SpatialParams) -> Self {
        Self {
            params,
            slots: HashMap::new(),
            ids: Vec::new(),
            boxes: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Number of registered boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Registers or repositions the box for `id`.
    ///
    /// Extents are clamped to the configured minimum.
    pub fn upsert(&mut self, id: &str, center: DVec3, size: DVec3) {
        let aabb = Aabb3::new(center, clamp_extents(size, self.params.min_extent));
        if let Some(&slot) = self.slots.get(id) {
            self.boxes[slot] = Some(aabb);
            return;
        }
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.ids.push(None);
                self.boxes.push(None);
                self.ids.len() - 1
            }
        };
        self.ids[slot] = Some(id.to_owned());
        self.boxes[slot] = Some(aabb);
        self.slots.insert(id.to_owned(), slot);
    }

    /// Unregisters `id`, freeing its slot. Unknown ids are ignored.
    pub fn remove(&mut self, id: &str) {
        if let Some(slot) = self.slots.remove(id) {
            self.ids[slot] = None;
            self.boxes[slot] = None;
            self.free.push(slot);
        }
    }

    /// Drops every registered box.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.ids.clear();
        self.boxes.clear();
        self.free.clear();
    }

    /// Visits the id of every registered box overlapping a candidate box,
    /// skipping `exclude`. The candidate is inflated by `margin` per
    /// half-extent before testing.
    pub fn visit_hits<F: FnMut(&str)>(
        &self,
        exclude: Option<&str>,
        center: DVec3,
        size: DVec3,
        margin: f64,
        mut f: F,
    ) {
        let candidate =
            Aabb3::new(center, clamp_extents(size, self.params.min_extent)).inflated(margin);
        for (slot, aabb) in self.boxes.iter().enumerate() {
            if let Some(aabb) = aabb
                && candidate.overlaps(aabb)
            {
                let id = self.ids[slot].as_deref().unwrap_or_default();
                if exclude != Some(id) {
                    f(id);
                }
            }
        }
    }

    /// Ids that would collide if the object `exclude` were placed as a box of
    /// `size` at `center`, with the configured safety margin applied.
    #[must_use]
    pub fn collides_at(
        &self,
        exclude: Option<&str>,
        center: DVec3,
        size: DVec3,
    ) -> SmallVec<[String; 4]> {
        let mut hits = SmallVec::new();
        self.visit_hits(exclude, center, size, self.params.collision_margin, |id| {
            hits.push(id.to_owned());
        });
        hits
    }

    /// Searches for a collision-free centre near `preferred`.
    ///
    /// The preferred point is first forced to ground height for the given
    /// size; if it is free it is returned as-is. Otherwise up to
    /// `max_attempts` polar offsets are sampled, the radius band widening
    /// with each attempt, all at ground height. Returns `None` when the
    /// attempt budget is exhausted.
    pub fn find_safe_position<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        size: DVec3,
        preferred: DVec3,
        search_radius: f64,
        max_attempts: usize,
    ) -> Option<DVec3> {
        let size = clamp_extents(size, self.params.min_extent);
        let gz = grounded_z(size, self.params.ground_z);
        let grounded = DVec3::new(preferred.x, preferred.y, gz);
        if self.collides_at(None, grounded, size).is_empty() {
            return Some(grounded);
        }

        for attempt in 0..max_attempts {
            let angle = rng.random_range(0.0..TAU);
            let reach = search_radius * (1.0 + attempt as f64 / max_attempts as f64);
            let dist = rng.random_range(0.0..reach);
            let candidate = DVec3::new(
                preferred.x + dist * angle.cos(),
                preferred.y + dist * angle.sin(),
                gz,
            );
            if self.collides_at(None, candidate, size).is_empty() {
                trace!(attempt, x = candidate.x, y = candidate.y, "safe position found");
                return Some(candidate);
            }
        }
        debug!(
            max_attempts,
            x = preferred.x,
            y = preferred.y,
            "no safe position within attempt budget"
        );
        None
    }

    /// Current layout summary with margin-free overlap pairs.
    #[must_use]
    pub fn report(&self) -> CollisionReport {
        let mut colliding_pairs = Vec::new();
        let live: Vec<(usize, &Aabb3)> = self
            .boxes
            .iter()
            .enumerate()
            .filter_map(|(slot, aabb)| aabb.as_ref().map(|a| (slot, a)))
            .collect();
        for (i, &(slot_a, a)) in live.iter().enumerate() {
            for &(slot_b, b) in &live[i + 1..] {
                if a.overlaps(b) {
                    let id_a = self.ids[slot_a].clone().unwrap_or_default();
                    let id_b = self.ids[slot_b].clone().unwrap_or_default();
                    colliding_pairs.push((id_a, id_b));
                }
            }
        }
        CollisionReport {
            total_objects: self.slots.len(),
            colliding_pairs,
        }
    }
}

impl fmt::Debug for ColliderIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.boxes.len();
        let alive = self.slots.len();
        f.debug_struct("ColliderIndex")
            .field("total_slots", &total)
            .field("alive", &alive)
            .finish_non_exhaustive()
    }
}
