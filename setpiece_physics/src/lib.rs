// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Setpiece Physics: placement intents and the support-dependency subsystem.
//!
//! Two cooperating halves:
//!
//! - [`PlacementEngine`] turns a placement intent — [`Placement::OnTopOf`],
//!   [`Placement::Near`], [`Placement::Ground`], or [`Placement::Custom`] —
//!   into a physically valid position: ground-aligned, collision-checked
//!   against the live scene, and stacked with a small epsilon above support
//!   surfaces. Proposed positions from external planners go through the
//!   `Custom` path, which validates them against the single-node physics
//!   rule before searching for a collision-free spot.
//! - [`SupportTracker`] infers who supports whom from geometry alone, tracks
//!   dependents recursively, and drives the two cascades: when a supporter
//!   moves, its recursive dependents translate by the same offset
//!   ([`translation_patch`]); when a supporter is removed, its dependents
//!   fall, with collision avoidance, in dependency order
//!   ([`settle_after_removal`]).
//!
//! The engine synchronizes its [`ColliderIndex`](setpiece_collision) from
//! the store immediately before every query; the index is never treated as
//! authoritative.
//!
//! Everything here is synchronous and bounded; the only iteration without a
//! fixed count is capped by explicit attempt budgets.

mod error;
mod gravity;
mod placement;
mod support;

pub use error::PlacementError;
pub use gravity::settle_after_removal;
pub use placement::{Placement, PlacementEngine};
pub use support::{SupportSummary, SupportTracker, translation_patch};
