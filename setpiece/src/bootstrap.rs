// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON-shaped payload types for bootstrap and export.
//!
//! These DTOs are the only serde surface of the workspace; core types stay
//! serialization-free and the conversions live here. The payload shape:
//!
//! ```json
//! { "scene": { "id": "...", "name": "...", "frame": "map",
//!   "rooms":     [ { "id", "name", "bbox": { "min": [x,y,z], "max": [x,y,z] } } ],
//!   "objects":   [ { "id", "name", "cls", "pos", "ori",
//!                    "bbox": { "type": "OBB", "xyz": [w,d,h] },
//!                    "aff", "lom", "conf", "state", "meta" } ],
//!   "relations": [ { "r", "a", "b", "conf", "props", "ts" } ] } }
//! ```
//!
//! Rooms become pinned nodes of class `room` so that `in` relations have
//! valid endpoints; they are invisible to collision, placement, and support.

use std::collections::BTreeMap;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::warn;

use setpiece_graph::{
    Attachment, Lom, Node, NodeState, Relation, Stamp, StateFlags, Value,
};
use setpiece_relate::RelationKind;

/// Top-level bootstrap/export document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BootstrapPayload {
    /// The scene body.
    pub scene: ScenePayload,
}

impl BootstrapPayload {
    /// Parses a payload from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Renders the payload as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// The scene body of a payload.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScenePayload {
    /// Scene id.
    #[serde(default)]
    pub id: String,
    /// Scene name.
    #[serde(default)]
    pub name: String,
    /// Coordinate frame; always `"map"` in this system.
    #[serde(default = "default_frame")]
    pub frame: String,
    /// Rooms.
    #[serde(default)]
    pub rooms: Vec<RoomPayload>,
    /// Objects.
    #[serde(default)]
    pub objects: Vec<ObjectPayload>,
    /// Relations.
    #[serde(default)]
    pub relations: Vec<RelationPayload>,
    /// Present on exports only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_metadata: Option<ExportMetadata>,
    /// The last few event-log entries; present on exports only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recent_events: Vec<EventPayload>,
}

fn default_frame() -> String {
    "map".to_owned()
}

fn default_conf() -> f64 {
    1.0
}

fn default_ori() -> [f64; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn default_lom() -> String {
    "medium".to_owned()
}

/// A room, described by its axis-aligned extent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomPayload {
    /// Room id, the endpoint of `in` relations.
    pub id: String,
    /// Room name.
    #[serde(default)]
    pub name: String,
    /// Extent corners.
    pub bbox: CornersPayload,
}

/// Min/max corner pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CornersPayload {
    /// Minimum corner.
    pub min: [f64; 3],
    /// Maximum corner.
    pub max: [f64; 3],
}

/// An object.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectPayload {
    /// Object id.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Class tag.
    pub cls: String,
    /// World-frame centre.
    pub pos: [f64; 3],
    /// Orientation quaternion.
    #[serde(default = "default_ori")]
    pub ori: [f64; 4],
    /// Extents.
    pub bbox: BboxPayload,
    /// Affordance tags.
    #[serde(default)]
    pub aff: Vec<String>,
    /// Level of mobility.
    #[serde(default = "default_lom")]
    pub lom: String,
    /// Confidence.
    #[serde(default = "default_conf")]
    pub conf: f64,
    /// State mapping; recognized keys are typed on conversion.
    #[serde(default)]
    pub state: BTreeMap<String, serde_json::Value>,
    /// Opaque metadata.
    #[serde(default)]
    pub meta: BTreeMap<String, serde_json::Value>,
}

/// Oriented-bounding-box extents. Only the extents are interpreted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BboxPayload {
    /// Box representation tag, conventionally `"OBB"`.
    #[serde(rename = "type", default = "default_bbox_type")]
    pub kind: String,
    /// Full extents (width, depth, height).
    pub xyz: [f64; 3],
}

fn default_bbox_type() -> String {
    "OBB".to_owned()
}

/// A relation row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationPayload {
    /// Relation kind wire name.
    pub r: String,
    /// Source endpoint.
    pub a: String,
    /// Target endpoint.
    pub b: String,
    /// Confidence.
    #[serde(default = "default_conf")]
    pub conf: f64,
    /// Numeric evidence.
    #[serde(default)]
    pub props: BTreeMap<String, f64>,
    /// Timestamp; exports always carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<f64>,
}

/// Export-only scene statistics.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Node count, rooms excluded.
    pub total_objects: usize,
    /// Relation count.
    pub total_relationships: usize,
    /// `REL_UPSERT` + `REL_REMOVED` entries in the event log.
    pub negotiation_events: usize,
}

/// One exported event-log entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventPayload {
    /// Event kind wire name.
    #[serde(rename = "type")]
    pub kind: String,
    /// Timestamp in seconds.
    pub ts: f64,
    /// Node id, for node events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Relation key rendering, for relation events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl ObjectPayload {
    /// Converts to a core node, typing recognized state keys.
    #[must_use]
    pub fn into_node(self) -> Node {
        let mut node = Node::new(
            self.id,
            self.cls,
            DVec3::from_array(self.pos),
            DVec3::from_array(self.bbox.xyz),
        );
        node.name = self.name;
        node.ori = self.ori;
        node.aff = self.aff;
        node.lom = Lom::parse(&self.lom);
        node.conf = self.conf;
        node.state = state_from_json(self.state);
        node.meta = self
            .meta
            .into_iter()
            .map(|(k, v)| (k, json_to_value(v)))
            .collect();
        node
    }
}

impl RoomPayload {
    /// Converts to a pinned node of class `room` spanning the extent.
    #[must_use]
    pub fn into_node(self) -> Node {
        let min = DVec3::from_array(self.bbox.min);
        let max = DVec3::from_array(self.bbox.max);
        let mut node = Node::new(self.id, "room", (min + max) / 2.0, max - min);
        node.name = self.name;
        node.lom = Lom::Fixed;
        node.state = NodeState::pinned(None);
        node
    }
}

impl RelationPayload {
    /// Converts to a core relation; unknown kinds are dropped with a
    /// warning.
    #[must_use]
    pub fn into_relation(self, default_ts: Stamp) -> Option<Relation> {
        let Some(kind) = RelationKind::parse(&self.r) else {
            warn!(r = %self.r, "unknown relation kind in payload, dropped");
            return None;
        };
        Some(Relation {
            kind,
            a: self.a,
            b: self.b,
            props: self.props,
            ts: self.ts.map_or(default_ts, Stamp),
            conf: self.conf,
        })
    }
}

/// Types the recognized state keys and keeps the rest verbatim.
fn state_from_json(raw: BTreeMap<String, serde_json::Value>) -> NodeState {
    let mut state = NodeState::default();
    for (key, value) in raw {
        match key.as_str() {
            "physics_override" => {
                state
                    .flags
                    .set(StateFlags::PHYSICS_OVERRIDE, value.as_bool() == Some(true));
            }
            "prevent_gravity" => {
                state
                    .flags
                    .set(StateFlags::PREVENT_GRAVITY, value.as_bool() == Some(true));
            }
            "attachment_type" => {
                state.attachment = value.as_str().map(Attachment::parse);
            }
            _ => {
                state.extra.insert(key, json_to_value(value));
            }
        }
    }
    state
}

/// Flattens typed state back into a JSON mapping.
#[must_use]
pub(crate) fn state_to_json(state: &NodeState) -> BTreeMap<String, serde_json::Value> {
    let mut raw: BTreeMap<String, serde_json::Value> = state
        .extra
        .iter()
        .map(|(k, v)| (k.clone(), value_to_json(v)))
        .collect();
    if state.is_pinned() {
        raw.insert("physics_override".to_owned(), serde_json::Value::Bool(true));
    }
    if state.prevents_gravity() {
        raw.insert("prevent_gravity".to_owned(), serde_json::Value::Bool(true));
    }
    if let Some(attachment) = &state.attachment {
        raw.insert(
            "attachment_type".to_owned(),
            serde_json::Value::String(attachment.as_str().to_owned()),
        );
    }
    raw
}

pub(crate) fn json_to_value(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => Value::Text(s),
        other => Value::Text(other.to_string()),
    }
}

pub(crate) fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::Text(s) => serde_json::Value::String(s.clone()),
    }
}
