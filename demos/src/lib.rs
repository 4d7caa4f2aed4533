// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for the Setpiece demo binaries.

use setpiece::BootstrapPayload;

/// A small kitchen: one room, a table, a chair dropped from mid-air (the
/// bootstrap snap grounds it), and a stove that is switched on.
#[must_use]
pub fn kitchen_payload() -> BootstrapPayload {
    BootstrapPayload::from_json(
        r#"{ "scene": {
            "id": "kitchen_demo", "name": "Kitchen Demo", "frame": "map",
            "rooms": [
                { "id": "kitchen", "name": "Kitchen",
                  "bbox": { "min": [0, 0, 0], "max": [5, 3, 2.5] } }
            ],
            "objects": [
                { "id": "table_12", "name": "Kitchen Table", "cls": "table",
                  "pos": [2.0, 1.5, 0.375],
                  "bbox": { "type": "OBB", "xyz": [1.2, 0.8, 0.75] },
                  "aff": ["support"], "lom": "low" },
                { "id": "chair_12", "name": "Kitchen Chair", "cls": "chair",
                  "pos": [1.2, 1.5, 1.1],
                  "bbox": { "type": "OBB", "xyz": [0.5, 0.5, 0.9] },
                  "aff": ["sit"], "lom": "medium" },
                { "id": "stove_1", "name": "Stove", "cls": "stove",
                  "pos": [4.0, 0.8, 0.45],
                  "bbox": { "type": "OBB", "xyz": [0.6, 0.6, 0.9] },
                  "lom": "fixed", "state": { "power": "on" } }
            ],
            "relations": [
                { "r": "in", "a": "table_12", "b": "kitchen" },
                { "r": "in", "a": "chair_12", "b": "kitchen" },
                { "r": "in", "a": "stove_1", "b": "kitchen" }
            ] } }"#,
    )
    .expect("the embedded kitchen payload is valid")
}
