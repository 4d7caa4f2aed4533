// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Classification rules and their confidence curves.

use core::fmt;
use std::collections::BTreeMap;

use glam::DVec3;

use setpiece_geom::{SpatialParams, distance_2d_xy, distance_3d, top_of};

/// Extra horizontal reach, beyond the combined footprints, within which two
/// similar-height objects still count as `beside`.
const BESIDE_REACH: f64 = 0.4;

/// The qualitative relation vocabulary.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationKind {
    /// Within the near threshold.
    Near,
    /// Beyond the near threshold.
    Far,
    /// Horizontally adjacent at similar height.
    Beside,
    /// Clearly higher, close in plan, not resting.
    Above,
    /// Clearly lower, close in plan, not resting.
    Below,
    /// Resting on the other object's top surface.
    OnTopOf,
    /// Carrying the other object (dual of `OnTopOf`).
    Supports,
    /// Contained in a room; carried through, never classified.
    In,
}

impl RelationKind {
    /// Stable wire name of the relation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Near => "near",
            Self::Far => "far",
            Self::Beside => "beside",
            Self::Above => "above",
            Self::Below => "below",
            Self::OnTopOf => "on_top_of",
            Self::Supports => "supports",
            Self::In => "in",
        }
    }

    /// Parses a wire name produced by [`RelationKind::as_str`].
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "near" => Self::Near,
            "far" => Self::Far,
            "beside" => Self::Beside,
            "above" => Self::Above,
            "below" => Self::Below,
            "on_top_of" => Self::OnTopOf,
            "supports" => Self::Supports,
            "in" => Self::In,
            _ => return None,
        })
    }

    /// The relation that must accompany this one with swapped endpoints,
    /// if any: `on_top_of(a, b)` pairs with `supports(b, a)`.
    #[must_use]
    pub const fn dual(self) -> Option<Self> {
        match self {
            Self::OnTopOf => Some(Self::Supports),
            Self::Supports => Some(Self::OnTopOf),
            _ => None,
        }
    }

    /// Whether agents treat this relation as connecting and propose it to
    /// the neighbor. Currently only `near`.
    #[must_use]
    pub const fn is_connecting(self) -> bool {
        matches!(self, Self::Near)
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A placed box as seen by the kernel: id, world centre, full extents.
#[derive(Copy, Clone, Debug)]
pub struct Placed<'a> {
    /// Object id, echoed into classification endpoints by callers.
    pub id: &'a str,
    /// World-frame centre.
    pub center: DVec3,
    /// Full extents.
    pub size: DVec3,
}

/// The outcome of classifying an ordered pair.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    /// The single best relation for the pair.
    pub kind: RelationKind,
    /// Numeric evidence backing the relation (distances, offsets).
    pub props: BTreeMap<String, f64>,
    /// Confidence in `[0, 1]`.
    pub conf: f64,
}

/// How well an object fits on a candidate supporter's top surface.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SupportFit {
    /// World z of the supporter's top surface.
    pub top: f64,
    /// Absolute error between the object's centre z and the resting height.
    pub z_err: f64,
}

/// Tests whether `object` rests on `supporter`'s top surface.
///
/// The object must be above the supporter's centre, overlap it horizontally
/// (within the supporter's half-extent plus a quarter of the object's own),
/// and sit within `z_tol` of the exact resting height.
#[must_use]
pub fn rests_on(object: &Placed<'_>, supporter: &Placed<'_>, z_tol: f64) -> Option<SupportFit> {
    if object.center.z <= supporter.center.z {
        return None;
    }
    let dx = (object.center.x - supporter.center.x).abs();
    let dy = (object.center.y - supporter.center.y).abs();
    if dx > supporter.size.x / 2.0 + object.size.x / 4.0
        || dy > supporter.size.y / 2.0 + object.size.y / 4.0
    {
        return None;
    }
    let top = top_of(supporter.center, supporter.size);
    let z_err = (object.center.z - (top + object.size.z / 2.0)).abs();
    (z_err <= z_tol).then_some(SupportFit { top, z_err })
}

fn on_top_conf(fit: SupportFit, z_tol: f64) -> f64 {
    (0.95 - fit.z_err / z_tol * 0.2).clamp(0.7, 1.0)
}

fn offsets(upper: &Placed<'_>, lower: &Placed<'_>) -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("height_diff".to_owned(), upper.center.z - lower.center.z),
        ("x_offset".to_owned(), upper.center.x - lower.center.x),
        ("y_offset".to_owned(), upper.center.y - lower.center.y),
    ])
}

/// Classifies the ordered pair `(a, b)` into its single best relation.
#[must_use]
pub fn classify(a: &Placed<'_>, b: &Placed<'_>, params: &SpatialParams) -> Classification {
    // Rule 1: a rests on b.
    if let Some(fit) = rests_on(a, b, params.on_top_z_tol) {
        return Classification {
            kind: RelationKind::OnTopOf,
            props: offsets(a, b),
            conf: on_top_conf(fit, params.on_top_z_tol),
        };
    }

    // Rule 2: b rests on a, so a supports b.
    if let Some(fit) = rests_on(b, a, params.on_top_z_tol) {
        return Classification {
            kind: RelationKind::Supports,
            props: offsets(b, a),
            conf: on_top_conf(fit, params.on_top_z_tol),
        };
    }

    let d_2d = distance_2d_xy(a.center, b.center);
    let height_diff = (a.center.z - b.center.z).abs();

    // Rule 3: beside.
    if height_diff <= params.beside_z_tol {
        let reach =
            (a.size.x.max(a.size.y) + b.size.x.max(b.size.y)) / 2.0 + BESIDE_REACH;
        if d_2d <= reach {
            let conf = (0.85 - height_diff / params.beside_z_tol * 0.15).clamp(0.7, 0.85);
            return Classification {
                kind: RelationKind::Beside,
                props: BTreeMap::from([
                    ("distance_2d".to_owned(), d_2d),
                    ("height_diff".to_owned(), height_diff),
                ]),
                conf,
            };
        }
    }

    // Rule 4: above / below.
    if height_diff >= params.above_below_z_min && d_2d <= params.above_below_xy_max {
        let kind = if a.center.z > b.center.z {
            RelationKind::Above
        } else {
            RelationKind::Below
        };
        let conf = (0.6 + (height_diff - params.above_below_z_min) * 0.2).min(0.8);
        return Classification {
            kind,
            props: BTreeMap::from([
                ("height_diff".to_owned(), height_diff),
                ("distance_2d".to_owned(), d_2d),
            ]),
            conf,
        };
    }

    // Rule 5: plain distance.
    relate_distance(a, b, params)
}

/// The distance-only classification: `near` within the threshold, `far`
/// beyond it.
///
/// This is the connecting-relation test that per-object agents run against
/// their neighbors; it deliberately ignores stacking and adjacency.
#[must_use]
pub fn relate_distance(a: &Placed<'_>, b: &Placed<'_>, params: &SpatialParams) -> Classification {
    let d = distance_3d(a.center, b.center);
    let near = params.near_threshold;
    let (kind, conf) = if d <= near {
        (RelationKind::Near, if d < near / 2.0 { 0.9 } else { 0.7 })
    } else {
        (RelationKind::Far, (0.3 + (d / near - 1.0) * 0.2).min(0.8))
    };
    Classification {
        kind,
        props: BTreeMap::from([("dist".to_owned(), d)]),
        conf,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec3;

    fn params() -> SpatialParams {
        SpatialParams::default()
    }

    fn cup(id: &str, center: DVec3) -> Placed<'_> {
        Placed {
            id,
            center,
            size: dvec3(0.08, 0.08, 0.1),
        }
    }

    const TABLE_SIZE: DVec3 = DVec3::new(1.2, 0.8, 0.75);

    fn table(id: &str) -> Placed<'_> {
        Placed {
            id,
            center: dvec3(2.0, 1.5, 0.375),
            size: TABLE_SIZE,
        }
    }

    #[test]
    fn cup_on_table_is_on_top_of() {
        let t = table("table");
        let c = cup("cup", dvec3(2.1, 1.4, 0.8));
        let out = classify(&c, &t, &params());
        assert_eq!(out.kind, RelationKind::OnTopOf);
        assert!((out.conf - 0.95).abs() < 1e-9);
        assert_eq!(out.props["height_diff"], 0.8 - 0.375);
        // And the mirrored order reports support.
        let out = classify(&t, &c, &params());
        assert_eq!(out.kind, RelationKind::Supports);
    }

    #[test]
    fn on_top_confidence_degrades_with_height_error() {
        let t = table("table");
        // Resting height is 0.8; 0.15 off is the edge of the tolerance.
        let c = cup("cup", dvec3(2.0, 1.5, 0.95));
        let out = classify(&c, &t, &params());
        assert_eq!(out.kind, RelationKind::OnTopOf);
        assert!((out.conf - 0.75).abs() < 1e-9);
    }

    #[test]
    fn hovering_past_the_tolerance_is_not_on_top() {
        let t = table("table");
        let c = cup("cup", dvec3(2.0, 1.5, 1.0));
        let out = classify(&c, &t, &params());
        assert_ne!(out.kind, RelationKind::OnTopOf);
    }

    #[test]
    fn adjacent_cubes_on_the_ground_are_beside() {
        let a = cup("a", dvec3(0.0, 0.0, 0.05));
        let b = cup("b", dvec3(0.3, 0.0, 0.05));
        let out = classify(&a, &b, &params());
        assert_eq!(out.kind, RelationKind::Beside);
        assert!((out.conf - 0.85).abs() < 1e-9);
    }

    #[test]
    fn the_distance_rule_still_calls_the_same_pair_near() {
        let a = cup("a", dvec3(0.0, 0.0, 0.05));
        let b = cup("b", dvec3(0.3, 0.0, 0.05));
        let out = relate_distance(&a, &b, &params());
        assert_eq!(out.kind, RelationKind::Near);
        assert!((out.conf - 0.9).abs() < 1e-9);
        assert!((out.props["dist"] - 0.3).abs() < 1e-9);
    }

    #[test]
    fn near_confidence_drops_in_the_outer_band() {
        let a = cup("a", dvec3(0.0, 0.0, 0.05));
        let b = cup("b", dvec3(0.0, 0.7, 0.05));
        let out = relate_distance(&a, &b, &params());
        assert_eq!(out.kind, RelationKind::Near);
        assert!((out.conf - 0.7).abs() < 1e-9);
    }

    #[test]
    fn far_confidence_grows_with_distance_up_to_a_cap() {
        let a = cup("a", dvec3(0.0, 0.0, 0.05));
        let b = cup("b", dvec3(1.6, 0.0, 0.05));
        let out = relate_distance(&a, &b, &params());
        assert_eq!(out.kind, RelationKind::Far);
        assert!((out.conf - 0.5).abs() < 1e-9);

        let c = cup("c", dvec3(8.0, 0.0, 0.05));
        let out = relate_distance(&a, &c, &params());
        assert_eq!(out.kind, RelationKind::Far);
        assert!((out.conf - 0.8).abs() < 1e-9);
    }

    #[test]
    fn lamp_over_a_table_corner_is_above() {
        let t = table("table");
        let lamp = Placed {
            id: "lamp",
            center: dvec3(2.2, 1.5, 2.2),
            size: dvec3(0.2, 0.2, 0.4),
        };
        let out = classify(&lamp, &t, &params());
        assert_eq!(out.kind, RelationKind::Above);
        let out = classify(&t, &lamp, &params());
        assert_eq!(out.kind, RelationKind::Below);
    }

    #[test]
    fn above_confidence_is_capped() {
        let a = cup("a", dvec3(0.0, 0.0, 3.0));
        let b = cup("b", dvec3(0.0, 0.0, 0.05));
        let out = classify(&a, &b, &params());
        assert_eq!(out.kind, RelationKind::Above);
        assert!((out.conf - 0.8).abs() < 1e-9);
    }

    #[test]
    fn classification_depends_only_on_pose_and_extents() {
        let a = cup("first", dvec3(0.1, 0.2, 0.05));
        let b = cup("second", dvec3(0.5, 0.2, 0.05));
        let one = classify(&a, &b, &params());
        let renamed_a = cup("renamed", dvec3(0.1, 0.2, 0.05));
        let two = classify(&renamed_a, &b, &params());
        assert_eq!(one, two);
    }

    #[test]
    fn dual_maps_resting_relations_both_ways() {
        assert_eq!(RelationKind::OnTopOf.dual(), Some(RelationKind::Supports));
        assert_eq!(RelationKind::Supports.dual(), Some(RelationKind::OnTopOf));
        assert_eq!(RelationKind::Near.dual(), None);
    }

    #[test]
    fn wire_names_round_trip() {
        for kind in [
            RelationKind::Near,
            RelationKind::Far,
            RelationKind::Beside,
            RelationKind::Above,
            RelationKind::Below,
            RelationKind::OnTopOf,
            RelationKind::Supports,
            RelationKind::In,
        ] {
            assert_eq!(RelationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(RelationKind::parse("touching"), None);
    }
}
