// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shared, immutable spatial parameter set.

use glam::DVec2;

/// Horizontal bounds of the scene used by ground placement.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SceneBounds {
    /// Minimum (x, y) corner.
    pub min: DVec2,
    /// Maximum (x, y) corner.
    pub max: DVec2,
}

impl Default for SceneBounds {
    fn default() -> Self {
        Self {
            min: DVec2::new(0.5, 0.5),
            max: DVec2::new(4.5, 2.5),
        }
    }
}

/// Tolerances, thresholds, and bounds shared across the workspace.
///
/// Every crate that needs a constant takes a `SpatialParams` at construction
/// instead of reading module-level state. `Default` yields the normative
/// values; tests and adapters may override individual fields.
///
/// Distances are metres, angles radians, confidences in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpatialParams {
    /// Minimum full extent per axis; smaller requests are clamped up.
    pub min_extent: f64,
    /// World z of the ground plane.
    pub ground_z: f64,
    /// Gap left above a support surface when stacking, against float error.
    pub placement_eps: f64,
    /// Safety margin added to each half-extent in collision queries.
    pub collision_margin: f64,
    /// Distance threshold separating `near` from `far`.
    pub near_threshold: f64,
    /// Vertical tolerance for the supported-by test.
    pub support_z_tol: f64,
    /// Horizontal slack added to a supporter's half-extent when validating.
    pub support_xy_slack: f64,
    /// Vertical tolerance of the `on_top_of` classification.
    pub on_top_z_tol: f64,
    /// Maximum centre-height difference for `beside`.
    pub beside_z_tol: f64,
    /// Minimum centre-height difference for `above` / `below`.
    pub above_below_z_min: f64,
    /// Maximum planar distance for `above` / `below`.
    pub above_below_xy_max: f64,
    /// Perception radius of a per-object agent.
    pub neighbor_radius: f64,
    /// Minimum confidence at which an agent accepts a proposed relation.
    pub accept_conf: f64,
    /// Band around the grounded height within which a node counts as grounded.
    pub grounded_tol: f64,
    /// Height above grounded beyond which an unsupported node is snapped down.
    pub float_ceiling: f64,
    /// Horizontal scene bounds for ground placement.
    pub bounds: SceneBounds,
}

impl Default for SpatialParams {
    fn default() -> Self {
        Self {
            min_extent: 0.01,
            ground_z: 0.0,
            placement_eps: 0.001,
            collision_margin: 0.05,
            near_threshold: 0.8,
            support_z_tol: 0.10,
            support_xy_slack: 0.1,
            on_top_z_tol: 0.15,
            beside_z_tol: 0.30,
            above_below_z_min: 0.50,
            above_below_xy_max: 1.5,
            neighbor_radius: 1.5,
            accept_conf: 0.60,
            grounded_tol: 0.05,
            float_ceiling: 2.0,
            bounds: SceneBounds::default(),
        }
    }
}
