// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Setpiece Relate: the pure relation kernel.
//!
//! Given an ordered pair of placed boxes, [`classify`] produces at most one
//! qualitative spatial relation with a confidence score, applying a fixed
//! rule priority (first match wins):
//!
//! 1. `on_top_of`: the first box rests on the second's top surface.
//! 2. `supports`: the mirrored test; the first box carries the second.
//! 3. `beside`: similar height, horizontally adjacent.
//! 4. `above` / `below`: clearly separated in height, close in plan.
//! 5. `near` / `far`: plain distance, via [`relate_distance`].
//!
//! The kernel is pure: a classification depends only on the centres and
//! extents of the two boxes and the supplied [`SpatialParams`]. `in` is a
//! member of [`RelationKind`] but is never produced here; containment
//! relations are carried through from bootstrap data and external commands.
//!
//! [`rests_on`] exposes the rule-1 geometric test with a caller-chosen
//! vertical tolerance; the support tracker reuses it for supporter
//! inference.

mod rules;

pub use rules::{Classification, Placed, RelationKind, SupportFit, classify, relate_distance, rests_on};
