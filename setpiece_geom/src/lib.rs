// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Setpiece Geom: axis-aligned 3D box math for scene-graph physics.
//!
//! This crate is the leaf of the Setpiece workspace. It provides:
//! - [`Aabb3`]: a centre + full-extents box with corner, top, overlap, and
//!   inflation helpers.
//! - Free functions for extent clamping, ground alignment, and distances.
//! - [`SpatialParams`]: the immutable parameter set (tolerances, thresholds,
//!   scene bounds) shared by the collision index, relation kernel, scene
//!   graph store, and placement engine. Construct it once and pass it by
//!   value; there is no global configuration.
//!
//! All boxes are axis-aligned in the world frame. Orientations other than
//! axis-aligned are carried by higher layers but never interpreted here.
//! Float inputs are assumed to be finite (no NaNs).

mod aabb;
mod params;

pub use aabb::{Aabb3, clamp_extents, distance_2d_xy, distance_3d, grounded_z, top_of};
pub use params::{SceneBounds, SpatialParams};
