// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Exporting the live scene back into the payload shape.

use setpiece_graph::{Event, Node, Relation, SceneGraph};

use crate::bootstrap::{
    BboxPayload, BootstrapPayload, CornersPayload, EventPayload, ExportMetadata, ObjectPayload,
    RelationPayload, RoomPayload, ScenePayload, state_to_json, value_to_json,
};
use crate::session::Session;

/// How many trailing event-log entries an export carries.
const EXPORTED_EVENTS: usize = 10;

impl Session {
    /// Snapshots the current scene as a payload, with export metadata and
    /// the last few event-log entries.
    #[must_use]
    pub fn export(&self) -> BootstrapPayload {
        export_scene(self.graph())
    }
}

/// Renders a store as a bootstrap-shaped payload.
#[must_use]
pub fn export_scene(graph: &SceneGraph) -> BootstrapPayload {
    let mut rooms = Vec::new();
    let mut objects = Vec::new();
    for node in graph.nodes().values() {
        if node.is_room() {
            rooms.push(room_payload(node));
        } else {
            objects.push(object_payload(node));
        }
    }

    let relations: Vec<RelationPayload> =
        graph.relations().values().map(relation_payload).collect();

    let negotiation_events = graph.events().iter().filter(|e| e.is_negotiation()).count();
    let export_metadata = Some(ExportMetadata {
        total_objects: objects.len(),
        total_relationships: relations.len(),
        negotiation_events,
    });

    let recent_events = graph
        .events()
        .iter()
        .rev()
        .take(EXPORTED_EVENTS)
        .rev()
        .map(event_payload)
        .collect();

    BootstrapPayload {
        scene: ScenePayload {
            id: String::new(),
            name: String::new(),
            frame: "map".to_owned(),
            rooms,
            objects,
            relations,
            export_metadata,
            recent_events,
        },
    }
}

fn room_payload(node: &Node) -> RoomPayload {
    let half = node.bbox / 2.0;
    RoomPayload {
        id: node.id.clone(),
        name: node.name.clone(),
        bbox: CornersPayload {
            min: (node.pos - half).to_array(),
            max: (node.pos + half).to_array(),
        },
    }
}

fn object_payload(node: &Node) -> ObjectPayload {
    ObjectPayload {
        id: node.id.clone(),
        name: node.name.clone(),
        cls: node.class.clone(),
        pos: node.pos.to_array(),
        ori: node.ori,
        bbox: BboxPayload {
            kind: "OBB".to_owned(),
            xyz: node.bbox.to_array(),
        },
        aff: node.aff.clone(),
        lom: node.lom.as_str().to_owned(),
        conf: node.conf,
        state: state_to_json(&node.state),
        meta: node
            .meta
            .iter()
            .map(|(k, v)| (k.clone(), value_to_json(v)))
            .collect(),
    }
}

fn relation_payload(relation: &Relation) -> RelationPayload {
    RelationPayload {
        r: relation.kind.as_str().to_owned(),
        a: relation.a.clone(),
        b: relation.b.clone(),
        conf: relation.conf,
        props: relation.props.clone(),
        ts: Some(relation.ts.seconds()),
    }
}

fn event_payload(event: &Event) -> EventPayload {
    let (id, key) = match event {
        Event::NodeAdded { id, .. } | Event::NodeUpdated { id, .. } => (Some(id.clone()), None),
        Event::RelUpsert { key, .. } | Event::RelRemoved { key, .. } => {
            (None, Some(key.to_string()))
        }
        Event::BootstrapLoaded { .. } => (None, None),
    };
    EventPayload {
        kind: event.kind().to_owned(),
        ts: event.ts().seconds(),
        id,
        key,
    }
}
