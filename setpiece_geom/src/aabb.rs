// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-aligned box primitives and distance helpers.

use glam::DVec3;

/// Clamp every extent of `size` to at least `min_extent`.
///
/// Flat payloads (a sheet of paper with zero thickness) would otherwise
/// produce degenerate boxes that never overlap anything and cannot be
/// grounded sensibly.
#[must_use]
pub fn clamp_extents(size: DVec3, min_extent: f64) -> DVec3 {
    size.max(DVec3::splat(min_extent))
}

/// Centre z of a box of `size` resting on the ground plane at `ground`.
#[must_use]
pub fn grounded_z(size: DVec3, ground: f64) -> f64 {
    ground + size.z / 2.0
}

/// World z of the top face of a box at `center` with full extents `size`.
#[must_use]
pub fn top_of(center: DVec3, size: DVec3) -> f64 {
    center.z + size.z / 2.0
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance_3d(a: DVec3, b: DVec3) -> f64 {
    a.distance(b)
}

/// Euclidean distance in the horizontal (x, y) plane, ignoring height.
#[must_use]
pub fn distance_2d_xy(a: DVec3, b: DVec3) -> f64 {
    a.truncate().distance(b.truncate())
}

/// An axis-aligned box described by its world-frame centre and full extents.
///
/// Extents are full widths (width, depth, height), not half-extents. The box
/// does not enforce the minimum-extent rule itself; callers clamp with
/// [`clamp_extents`] at the boundaries where sizes enter the system.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    /// World-frame centre.
    pub center: DVec3,
    /// Full extents along each axis.
    pub size: DVec3,
}

impl Aabb3 {
    /// Creates a box from centre and full extents.
    #[must_use]
    pub const fn new(center: DVec3, size: DVec3) -> Self {
        Self { center, size }
    }

    /// Minimum corner.
    #[must_use]
    pub fn min_corner(&self) -> DVec3 {
        self.center - self.size / 2.0
    }

    /// Maximum corner.
    #[must_use]
    pub fn max_corner(&self) -> DVec3 {
        self.center + self.size / 2.0
    }

    /// World z of the top face.
    #[must_use]
    pub fn top(&self) -> f64 {
        self.center.z + self.size.z / 2.0
    }

    /// World z of the bottom face.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.center.z - self.size.z / 2.0
    }

    /// Strict overlap test in all three axes.
    ///
    /// Touching faces count as non-overlap, so stacked boxes that share a
    /// surface do not collide.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let (amin, amax) = (self.min_corner(), self.max_corner());
        let (bmin, bmax) = (other.min_corner(), other.max_corner());
        amax.x > bmin.x
            && amin.x < bmax.x
            && amax.y > bmin.y
            && amin.y < bmax.y
            && amax.z > bmin.z
            && amin.z < bmax.z
    }

    /// Returns this box grown by `margin` in each half-extent (so the full
    /// extent along every axis grows by `2 * margin`).
    #[must_use]
    pub fn inflated(&self, margin: f64) -> Self {
        Self {
            center: self.center,
            size: self.size + DVec3::splat(2.0 * margin),
        }
    }
}
