// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Setpiece Collision: a box registry with safety-margin queries.
//!
//! [`ColliderIndex`] maintains the set of boxes currently registered for
//! collision queries, keyed by object id. It is **not** authoritative for
//! positions: it is a transient cache that the placement engine and the
//! gravity pass synchronize from the scene graph immediately before querying,
//! and never read outside those windows.
//!
//! - [`ColliderIndex::upsert`] / [`ColliderIndex::remove`] /
//!   [`ColliderIndex::clear`] maintain the registry.
//! - [`ColliderIndex::collides_at`] answers "what would I hit if placed
//!   here", inflating the candidate by the configured safety margin.
//! - [`ColliderIndex::find_safe_position`] samples polar offsets around a
//!   preferred point at ground height until it finds a collision-free spot.
//! - [`ColliderIndex::report`] summarizes the registered layout and any
//!   margin-free overlaps for diagnostics.
//!
//! Storage is a flat slot vector with an id intern map and linear scans.
//! Registered sets are small (a room's worth of furniture), so a linear
//! backend beats any acceleration structure here.

mod index;

pub use index::{CollisionReport, ColliderIndex};
