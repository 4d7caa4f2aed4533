// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Setpiece Graph: the scene graph store.
//!
//! The store is the single source of truth for a scene: a map of
//! [`Node`]s, a map of typed, directed [`Relation`]s, and an append-only
//! [`Event`] log. Mutations arrive exclusively as [`GraphPatch`] deltas.
//!
//! ## Patch semantics
//!
//! [`SceneGraph::apply_patch`] is atomic: it mutates a shadow copy of the
//! node and relation maps, validates it, and swaps on success. Within one
//! patch the apply order is fixed — node adds, then field-wise node updates,
//! then relation removals, then relation upserts. Relation upserts resolve
//! conflicts last-write-wins by timestamp: the incoming relation is kept iff
//! its `ts` is greater than or equal to the stored one.
//!
//! ## Physics validation
//!
//! Unless disabled, every added node and every node whose position a patch
//! changed is validated against the single-node physics rule: it must rest
//! on the ground plane, sit on some other node's top surface within
//! tolerance, or carry the `physics_override` state flag. Invalid heights
//! are snapped to the ground. Validation runs after the whole update bucket,
//! so a patch that moves a supporter and its dependents together validates
//! the dependents against the supporter's new position.
//!
//! Bootstrap loading applies a stronger rule — every non-pinned node is
//! force-grounded — because bootstrap payloads carry no temporal order for
//! stacks.
//!
//! ## Concurrency contract
//!
//! All operations are synchronous and externally serialized by the caller
//! (orchestrator or command executor); the store has no internal locking.

mod clock;
mod context;
mod error;
mod event;
mod node;
mod patch;
mod relation;
mod store;

pub use clock::{Clock, Stamp};
pub use context::{ContextObject, ContextRelation, LlmContext};
pub use error::PatchError;
pub use event::Event;
pub use node::{Attachment, Lom, Node, NodeState, ROOM_CLASS, StateFlags, Value};
pub use patch::{FieldMask, GraphPatch, NodeUpdate};
pub use relation::{RelKey, Relation};
pub use store::SceneGraph;
