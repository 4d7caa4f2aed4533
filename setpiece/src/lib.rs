// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Setpiece: a live, queryable 3D spatial scene graph.
//!
//! The workspace maintains a scene of physical objects (furniture,
//! appliances, small items, rooms) and derives from it, through cooperating
//! per-object agents, a physics rulebook, and a pure relation kernel, a set
//! of qualitative spatial relations (`near`, `far`, `beside`, `above`,
//! `below`, `on_top_of`, `supports`, `in`) and a gravity-consistent
//! support-dependency graph.
//!
//! This crate is the outward face: the [`Session`] command executor, the
//! structured [`Command`] surface consumed by language front-ends, and the
//! JSON-shaped bootstrap/export payloads. The moving parts live in the
//! member crates and are re-exported here:
//!
//! - [`setpiece_geom`]: box math and the shared [`SpatialParams`].
//! - [`setpiece_collision`]: the collision index and safe-position search.
//! - [`setpiece_relate`]: the pure pair classifier.
//! - [`setpiece_graph`]: the store with nodes, relations, patches, events.
//! - [`setpiece_physics`]: placement intents, support inference, gravity.
//! - [`setpiece_agents`]: the negotiation agents, bus, and tick loop.
//!
//! ## A complete round trip
//!
//! ```
//! use setpiece::{AddCommand, BootstrapPayload, Command, Session, SpatialParams};
//!
//! let mut session = Session::new(SpatialParams::default());
//! session.load_bootstrap(
//!     BootstrapPayload::from_json(
//!         r#"{ "scene": {
//!             "rooms": [ { "id": "kitchen",
//!                          "bbox": { "min": [0, 0, 0], "max": [5, 3, 2.5] } } ],
//!             "objects": [
//!                 { "id": "table_1", "cls": "table", "pos": [2.0, 1.5, 0.375],
//!                   "bbox": { "type": "OBB", "xyz": [1.2, 0.8, 0.75] } }
//!             ],
//!             "relations": [ { "r": "in", "a": "table_1", "b": "kitchen" } ] } }"#,
//!     )
//!     .unwrap(),
//! );
//!
//! // Put a cup on the table and let the agents negotiate for a few rounds.
//! session
//!     .execute(Command::Add(
//!         AddCommand::new("cup")
//!             .onto("table_1")
//!             .sized(glam::DVec3::new(0.08, 0.08, 0.10))
//!             .in_room("kitchen"),
//!     ))
//!     .unwrap();
//! session.run_ticks(3);
//!
//! assert_eq!(session.tracker().supporter_of("cup_1"), Some("table_1"));
//! let export = session.export();
//! assert_eq!(export.scene.export_metadata.unwrap().total_objects, 2);
//! ```

mod bootstrap;
mod command;
mod error;
mod export;
mod session;

pub use bootstrap::{
    BboxPayload, BootstrapPayload, CornersPayload, EventPayload, ExportMetadata, ObjectPayload,
    RelationPayload, RoomPayload, ScenePayload,
};
pub use command::{AddCommand, Command, Outcome, Selector, SpatialRelation};
pub use error::CommandError;
pub use export::export_scene;
pub use session::Session;

pub use setpiece_agents::{Agent, Bus, Decision, Envelope, Payload, RelationClaim};
pub use setpiece_collision::{CollisionReport, ColliderIndex};
pub use setpiece_geom::{Aabb3, SceneBounds, SpatialParams};
pub use setpiece_graph::{
    Attachment, Clock, Event, FieldMask, GraphPatch, LlmContext, Lom, Node, NodeState,
    NodeUpdate, PatchError, RelKey, Relation, SceneGraph, Stamp, StateFlags, Value,
};
pub use setpiece_physics::{
    Placement, PlacementEngine, PlacementError, SupportSummary, SupportTracker,
    settle_after_removal, translation_patch,
};
pub use setpiece_relate::{Classification, Placed, RelationKind, classify, relate_distance};
