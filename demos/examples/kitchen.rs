// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bootstrap a kitchen, let the agents negotiate, then nudge the chair and
//! watch the relations update.

use glam::dvec3;
use setpiece::{GraphPatch, Session, SpatialParams};
use setpiece_demos::kitchen_payload;

fn print_relations(session: &Session, heading: &str) {
    println!("{heading}");
    for relation in session.graph().relations().values() {
        println!(
            "  {}({}, {})  conf={:.2}  props={:?}",
            relation.kind, relation.a, relation.b, relation.conf, relation.props
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut session = Session::new(SpatialParams::default());
    session.load_bootstrap(kitchen_payload());
    session.run_ticks(3);
    print_relations(&session, "Relations after initial negotiation:");

    // The chair slides over next to the stove.
    let mut patch = GraphPatch::new();
    patch.move_node("chair_12", dvec3(3.4, 1.1, 0.45));
    session
        .apply_patch(patch)
        .expect("the chair move is a valid patch");
    session.run_ticks(3);
    print_relations(&session, "\nRelations after the chair moved:");

    let context = session.llm_context(dvec3(3.0, 1.3, 1.6), "kitchen", 5);
    println!("\n{}", context.summary);
    for notice in &context.notices {
        println!("notice: {notice}");
    }
    for object in &context.objects {
        println!(
            "  {} ({}) at ({:.2}, {:.2}, {:.2})",
            object.id, object.class, object.pos.x, object.pos.y, object.pos.z
        );
    }
}
