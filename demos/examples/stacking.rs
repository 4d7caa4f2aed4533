// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stack dishes on the table, then pull the table away and let gravity
//! sort out the rest.

use glam::dvec3;
use setpiece::{AddCommand, Command, Selector, Session, SpatialParams};
use setpiece_demos::kitchen_payload;

fn print_stack(session: &Session) {
    for (id, node) in session.graph().nodes() {
        if node.is_room() {
            continue;
        }
        let support = session
            .tracker()
            .supporter_of(id)
            .map_or_else(|| "ground".to_owned(), str::to_owned);
        println!(
            "  {id:<10} z={:.3}  resting on {support}",
            node.pos.z
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut session = Session::new(SpatialParams::default());
    session.load_bootstrap(kitchen_payload());

    for command in [
        Command::Add(
            AddCommand::new("plate")
                .onto("table_12")
                .sized(dvec3(0.25, 0.25, 0.03))
                .in_room("kitchen"),
        ),
        Command::Add(
            AddCommand::new("cup")
                .onto("plate_1")
                .sized(dvec3(0.08, 0.08, 0.10))
                .in_room("kitchen"),
        ),
    ] {
        let outcome = session.execute(command).expect("add commands succeed");
        println!("{}", outcome.message);
    }

    println!("\nBefore removal:");
    print_stack(&session);

    let outcome = session
        .execute(Command::Remove {
            selector: Selector::Id("table_12".to_owned()),
        })
        .expect("the table exists");
    println!("\n{}", outcome.message);

    println!("\nAfter removal:");
    print_stack(&session);

    let report = session.collision_report();
    println!(
        "\n{} objects tracked, {} hard overlap(s)",
        report.total_objects,
        report.colliding_pairs.len()
    );
}
