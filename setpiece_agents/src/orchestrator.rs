// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The tick loop driving one negotiation round.

use std::collections::BTreeMap;

use tracing::warn;

use setpiece_geom::SpatialParams;
use setpiece_graph::SceneGraph;

use crate::agent::Agent;
use crate::bus::Bus;

/// Builds one agent per existing node id, skipping ids the store does not
/// know.
#[must_use]
pub fn make_agents<I, S>(graph: &SceneGraph, ids: I, params: SpatialParams) -> BTreeMap<String, Agent>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut agents = BTreeMap::new();
    for id in ids {
        let id = id.as_ref();
        if let Some(node) = graph.get(id) {
            agents.insert(id.to_owned(), Agent::new(id, node.class.clone(), params));
        }
    }
    agents
}

/// Runs one negotiation round: deliver, perceive and propose, handle and
/// patch — in that exact order, agents in ascending id order.
///
/// Proposals sent during step two are not delivered within the same tick;
/// they become inbox entries next round. Patch application is best-effort:
/// a patch that fails (for example, it names a node removed between
/// proposal and acceptance) is logged and dropped, leaving the scene valid.
pub fn tick(graph: &mut SceneGraph, bus: &mut Bus, agents: &mut BTreeMap<String, Agent>) {
    for (id, agent) in agents.iter_mut() {
        let delivered = bus.drain(id);
        agent.inbox.extend(delivered);
    }

    for agent in agents.values() {
        agent.perceive_and_propose(graph, bus);
    }

    for agent in agents.values_mut() {
        let patch = agent.handle_inbox(bus);
        if patch.is_empty() {
            continue;
        }
        if let Err(err) = graph.apply_patch(patch) {
            warn!(agent = %agent.id, %err, "negotiation patch dropped");
        }
    }
}
