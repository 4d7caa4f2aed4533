// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for patch application laws.

use glam::dvec3;
use proptest::prelude::*;
use setpiece_geom::SpatialParams;
use setpiece_graph::{GraphPatch, Node, Relation, SceneGraph, Stamp};
use setpiece_relate::RelationKind;

const IDS: [&str; 4] = ["a", "b", "c", "d"];

fn seeded_store() -> SceneGraph {
    let mut g = SceneGraph::new(SpatialParams::default());
    let nodes = IDS
        .iter()
        .enumerate()
        .map(|(i, id)| {
            Node::new(
                *id,
                "box",
                dvec3(i as f64 * 0.5, 0.0, 0.05),
                dvec3(0.1, 0.1, 0.1),
            )
        })
        .collect();
    g.load_bootstrap(nodes, Vec::new());
    g
}

fn arb_relation() -> impl Strategy<Value = Relation> {
    (
        prop_oneof![
            Just(RelationKind::Near),
            Just(RelationKind::Far),
            Just(RelationKind::Beside),
        ],
        0..IDS.len(),
        0..IDS.len(),
        0u32..100,
        0.0f64..1.0,
    )
        .prop_map(|(kind, a, b, ts, conf)| {
            Relation::new(kind, IDS[a], IDS[b], Stamp(f64::from(ts)), conf)
        })
}

proptest! {
    // Applying the same relation patch twice leaves the store exactly as a
    // single application does (LWW with `>=` makes replays idempotent).
    #[test]
    fn lww_replay_is_idempotent(relations in prop::collection::vec(arb_relation(), 1..8)) {
        let mut once = seeded_store();
        let mut twice = seeded_store();

        let patch = GraphPatch {
            add_relations: relations.clone(),
            ..GraphPatch::default()
        };
        once.apply_patch(patch.clone()).unwrap();
        twice.apply_patch(patch.clone()).unwrap();
        twice.apply_patch(patch).unwrap();

        prop_assert_eq!(once.relations(), twice.relations());
    }

    // A patch with any dangling relation mutates nothing, no matter what
    // valid content shares the patch with it.
    #[test]
    fn dangling_relations_abort_atomically(
        relations in prop::collection::vec(arb_relation(), 0..4),
        ts in 0u32..100,
    ) {
        let mut g = seeded_store();
        let nodes_before = g.nodes().clone();
        let relations_before = g.relations().clone();

        let mut patch = GraphPatch::default();
        for r in relations {
            patch.upsert_relation(r);
        }
        patch.upsert_relation(Relation::new(
            RelationKind::Near,
            "a",
            "ghost",
            Stamp(f64::from(ts)),
            0.9,
        ));
        prop_assert!(g.apply_patch(patch).is_err());
        prop_assert_eq!(g.nodes(), &nodes_before);
        prop_assert_eq!(g.relations(), &relations_before);
    }
}
