// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end scenarios over the full stack, driven through the session.

use glam::dvec3;
use setpiece::{
    AddCommand, BootstrapPayload, Command, CommandError, GraphPatch, Node, Relation, RelationKind,
    Selector, Session, SpatialParams, SpatialRelation, Stamp, translation_patch,
};

const EPS: f64 = 1e-3;

fn session() -> Session {
    Session::new(SpatialParams::default())
}

fn bootstrap_json(session: &mut Session, json: &str) {
    session.load_bootstrap(BootstrapPayload::from_json(json).unwrap());
}

fn kitchen_with_table(session: &mut Session) {
    bootstrap_json(
        session,
        r#"{ "scene": {
            "rooms": [ { "id": "kitchen", "name": "Kitchen",
                         "bbox": { "min": [0, 0, 0], "max": [5, 3, 2.5] } } ],
            "objects": [
                { "id": "table_1", "name": "Table 1", "cls": "table",
                  "pos": [2.0, 1.5, 0.375],
                  "bbox": { "type": "OBB", "xyz": [1.2, 0.8, 0.75] } }
            ],
            "relations": [ { "r": "in", "a": "table_1", "b": "kitchen" } ] } }"#,
    );
}

/// Every non-pinned, non-room node is grounded or supported.
fn assert_world_invariant(session: &Session) {
    let params = SpatialParams::default();
    for (id, node) in session.graph().nodes() {
        if node.is_room() || node.state.is_pinned() {
            continue;
        }
        let gz = params.ground_z + node.bbox.z / 2.0;
        let grounded = (node.pos.z - gz).abs() <= params.grounded_tol;
        let supported = session.tracker().supporter_of(id).is_some();
        assert!(grounded || supported, "{id} is floating at {:?}", node.pos);
    }
}

// Scenario 1: bootstrap snaps a floating chair to the ground and logs it.
#[test]
fn bootstrap_snap() {
    let mut s = session();
    bootstrap_json(
        &mut s,
        r#"{ "scene": { "objects": [
            { "id": "chair_1", "cls": "chair", "pos": [1.0, 1.5, 1.2],
              "bbox": { "type": "OBB", "xyz": [0.5, 0.5, 0.9] } }
        ] } }"#,
    );

    let chair = s.graph().get("chair_1").unwrap();
    assert!((chair.pos.z - 0.45).abs() < EPS);
    assert!(s.graph().relations().is_empty());
    let kinds: Vec<&str> = s.graph().events().iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, ["NODE_ADDED", "BOOTSTRAP_LOADED"]);
}

// Scenario 2: two small boxes 0.3 m apart negotiate reciprocal near
// relations within two ticks, with nothing else appearing.
#[test]
fn near_proposal_converges() {
    let mut s = session();
    bootstrap_json(
        &mut s,
        r#"{ "scene": { "objects": [
            { "id": "a", "cls": "box", "pos": [0.0, 0.0, 0.05],
              "bbox": { "type": "OBB", "xyz": [0.1, 0.1, 0.1] } },
            { "id": "b", "cls": "box", "pos": [0.3, 0.0, 0.05],
              "bbox": { "type": "OBB", "xyz": [0.1, 0.1, 0.1] } }
        ] } }"#,
    );

    s.run_ticks(2);

    let relations = s.graph().relations();
    assert_eq!(relations.len(), 2);
    for (a, b) in [("a", "b"), ("b", "a")] {
        let rel = relations
            .values()
            .find(|r| r.kind == RelationKind::Near && r.a == a && r.b == b)
            .unwrap_or_else(|| panic!("missing near({a}, {b})"));
        assert!((rel.conf - 0.9).abs() < EPS);
    }
}

// Scenario 3: a cup placed on the table lands on the surface with the
// stacking epsilon, near the centre, and the tracker records the edge.
#[test]
fn place_on_top() {
    let mut s = session();
    kitchen_with_table(&mut s);

    let outcome = s
        .execute(Command::Add(
            AddCommand::new("cup")
                .onto("table_1")
                .sized(dvec3(0.08, 0.08, 0.10))
                .in_room("kitchen"),
        ))
        .unwrap();
    assert_eq!(outcome.affected, ["cup_1"]);

    let cup = s.graph().get("cup_1").unwrap();
    assert!((cup.pos.z - 0.801).abs() < EPS);
    assert!((cup.pos.x - 2.0).abs() <= 0.12);
    assert!((cup.pos.y - 1.5).abs() <= 0.12);

    assert_eq!(s.tracker().supporter_of("cup_1"), Some("table_1"));
    assert_eq!(s.tracker().direct_dependents("table_1"), ["cup_1"]);

    // The resting duals are kept in the relation set.
    assert!(s.graph().relations().values().any(|r| {
        r.kind == RelationKind::OnTopOf && r.a == "cup_1" && r.b == "table_1"
    }));
    assert!(s.graph().relations().values().any(|r| {
        r.kind == RelationKind::Supports && r.a == "table_1" && r.b == "cup_1"
    }));
    assert_world_invariant(&s);
}

// Scenario 4: moving the table carries the book by the exact same offset.
#[test]
fn cascade_move() {
    let mut s = session();
    kitchen_with_table(&mut s);
    let mut patch = GraphPatch::new();
    patch.add_node(Node::new(
        "book_1",
        "book",
        dvec3(2.0, 1.5, 0.765),
        dvec3(0.23, 0.15, 0.03),
    ));
    s.apply_patch(patch).unwrap();
    assert_eq!(s.tracker().supporter_of("book_1"), Some("table_1"));

    let patch = translation_patch(s.graph(), s.tracker(), "table_1", dvec3(3.0, 1.5, 0.375));
    s.apply_patch(patch).unwrap();

    let table = s.graph().get("table_1").unwrap();
    let book = s.graph().get("book_1").unwrap();
    assert!((table.pos.x - 3.0).abs() < EPS);
    assert!((book.pos.x - 3.0).abs() < EPS);
    assert!((book.pos.z - 0.765).abs() < EPS);
    assert_eq!(s.tracker().supporter_of("book_1"), Some("table_1"));
    assert_world_invariant(&s);
}

// Scenario 5: removing the table drops the whole stack to the ground and
// purges every relation that referenced it.
#[test]
fn cascade_remove_applies_gravity() {
    let mut s = session();
    kitchen_with_table(&mut s);
    let mut patch = GraphPatch::new();
    patch.add_node(Node::new(
        "plate_1",
        "plate",
        dvec3(2.0, 1.5, 0.766),
        dvec3(0.25, 0.25, 0.03),
    ));
    patch.add_node(Node::new(
        "cup_1",
        "cup",
        dvec3(2.0, 1.5, 0.832),
        dvec3(0.08, 0.08, 0.10),
    ));
    s.apply_patch(patch).unwrap();

    let plate_z_before = s.graph().get("plate_1").unwrap().pos.z;
    let cup_z_before = s.graph().get("cup_1").unwrap().pos.z;

    s.execute(Command::Remove {
        selector: Selector::Id("table_1".to_owned()),
    })
    .unwrap();

    assert!(s.graph().get("table_1").is_none());
    let plate = s.graph().get("plate_1").unwrap();
    let cup = s.graph().get("cup_1").unwrap();
    assert!((plate.pos.z - 0.015).abs() < EPS);
    assert!((cup.pos.z - 0.05).abs() < EPS);
    // Gravity is monotone.
    assert!(plate.pos.z <= plate_z_before);
    assert!(cup.pos.z <= cup_z_before);

    let cup_support = s.tracker().supporter_of("cup_1");
    assert!(cup_support.is_none() || cup_support == Some("plate_1"));
    assert!(s.graph().relations().keys().all(|k| !k.touches("table_1")));
    assert_world_invariant(&s);
}

// Scenario 6: LWW replay — the older incoming stamp loses.
#[test]
fn lww_relation_replay() {
    let mut s = session();
    bootstrap_json(
        &mut s,
        r#"{ "scene": { "objects": [
            { "id": "a", "cls": "box", "pos": [0.0, 0.0, 0.05],
              "bbox": { "type": "OBB", "xyz": [0.1, 0.1, 0.1] } },
            { "id": "b", "cls": "box", "pos": [0.3, 0.0, 0.05],
              "bbox": { "type": "OBB", "xyz": [0.1, 0.1, 0.1] } }
        ] } }"#,
    );

    let mut patch = GraphPatch::new();
    patch.upsert_relation(Relation::new(RelationKind::Near, "a", "b", Stamp(10.0), 0.7));
    s.apply_patch(patch).unwrap();

    let mut patch = GraphPatch::new();
    patch.upsert_relation(Relation::new(RelationKind::Near, "a", "b", Stamp(9.0), 0.9));
    s.apply_patch(patch).unwrap();

    let rel = s
        .graph()
        .relations()
        .values()
        .find(|r| r.kind == RelationKind::Near && r.a == "a" && r.b == "b")
        .unwrap();
    assert!((rel.conf - 0.7).abs() < EPS);
    assert_eq!(rel.ts, Stamp(10.0));
}

#[test]
fn quantity_adds_get_sequential_ids_and_rooms() {
    let mut s = session();
    kitchen_with_table(&mut s);

    let outcome = s
        .execute(Command::Add(
            AddCommand::new("chair")
                .sized(dvec3(0.5, 0.5, 0.9))
                .in_room("kitchen")
                .times(2),
        ))
        .unwrap();
    assert_eq!(outcome.affected, ["chair_1", "chair_2"]);

    for id in ["chair_1", "chair_2"] {
        let chair = s.graph().get(id).unwrap();
        assert!((chair.pos.z - 0.45).abs() < EPS);
        assert!(s.graph().relations().values().any(|r| {
            r.kind == RelationKind::In && r.a == id && r.b == "kitchen"
        }));
        assert!(s.agents().contains_key(id));
    }

    // The two chairs were placed collision-aware against each other.
    let a = s.graph().get("chair_1").unwrap().pos;
    let b = s.graph().get("chair_2").unwrap().pos;
    assert!((a.x - b.x).abs() >= 0.5 || (a.y - b.y).abs() >= 0.5);
}

#[test]
fn unknown_objects_report_the_available_ids() {
    let mut s = session();
    kitchen_with_table(&mut s);

    let err = s
        .execute(Command::Remove {
            selector: Selector::Id("sofa".to_owned()),
        })
        .unwrap_err();
    match err {
        CommandError::UnknownObject { wanted, available } => {
            assert_eq!(wanted, "sofa");
            assert_eq!(available, ["kitchen", "table_1"]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn short_class_quantities_are_ambiguous() {
    let mut s = session();
    kitchen_with_table(&mut s);

    let err = s
        .execute(Command::Move {
            selector: Selector::Class {
                class: "chair".to_owned(),
                quantity: 2,
            },
            target_object: None,
            spatial_relation: None,
            position: None,
        })
        .unwrap_err();
    assert_eq!(
        err,
        CommandError::AmbiguousTarget {
            object_type: "chair".to_owned(),
            requested: 2,
            found: 0,
        }
    );
}

#[test]
fn moving_by_class_takes_ascending_id_order() {
    let mut s = session();
    kitchen_with_table(&mut s);
    s.execute(Command::Add(
        AddCommand::new("chair").sized(dvec3(0.5, 0.5, 0.9)).times(3),
    ))
    .unwrap();

    let outcome = s
        .execute(Command::Move {
            selector: Selector::Class {
                class: "chair".to_owned(),
                quantity: 2,
            },
            target_object: Some("table_1".to_owned()),
            spatial_relation: Some(SpatialRelation::Near),
            position: None,
        })
        .unwrap();
    assert_eq!(outcome.affected, ["chair_1", "chair_2"]);
    assert_world_invariant(&s);
}

#[test]
fn pinned_fixtures_survive_every_cascade() {
    let mut s = session();
    bootstrap_json(
        &mut s,
        r#"{ "scene": { "objects": [
            { "id": "table_1", "cls": "table", "pos": [2.0, 1.5, 0.375],
              "bbox": { "type": "OBB", "xyz": [1.2, 0.8, 0.75] } },
            { "id": "lamp_1", "cls": "lamp", "pos": [2.0, 1.5, 2.3],
              "bbox": { "type": "OBB", "xyz": [0.2, 0.2, 0.3] },
              "state": { "physics_override": true, "attachment_type": "ceiling" } }
        ] } }"#,
    );
    // Bootstrap left the ceiling lamp at height.
    assert!((s.graph().get("lamp_1").unwrap().pos.z - 2.3).abs() < EPS);

    s.execute(Command::Remove {
        selector: Selector::Id("table_1".to_owned()),
    })
    .unwrap();
    assert!((s.graph().get("lamp_1").unwrap().pos.z - 2.3).abs() < EPS);

    let corrections = s.validate_scene();
    assert!(corrections.is_empty());
}

#[test]
fn export_round_trips_through_bootstrap() {
    let mut s = session();
    kitchen_with_table(&mut s);
    s.execute(Command::Add(
        AddCommand::new("cup")
            .onto("table_1")
            .sized(dvec3(0.08, 0.08, 0.10))
            .in_room("kitchen"),
    ))
    .unwrap();
    s.run_ticks(2);

    let payload = s.export();
    let meta = payload.scene.export_metadata.unwrap();
    assert_eq!(meta.total_objects, 2);
    assert_eq!(meta.total_relationships, payload.scene.relations.len());
    assert!(meta.negotiation_events > 0);
    assert!(payload.scene.recent_events.len() <= 10);
    assert_eq!(payload.scene.rooms.len(), 1);

    // Feed the export back into a fresh session. Bootstrap physics is
    // stronger than validation: the cup is force-grounded, not restacked.
    let json = payload.to_json().unwrap();
    let mut replay = session();
    replay.load_bootstrap(BootstrapPayload::from_json(&json).unwrap());
    assert_eq!(replay.graph().nodes().len(), s.graph().nodes().len());
    assert!((replay.graph().get("cup_1").unwrap().pos.z - 0.05).abs() < EPS);
    assert_eq!(replay.tracker().supporter_of("cup_1"), None);
}
