// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-object agent.

use tracing::{debug, trace};

use setpiece_geom::SpatialParams;
use setpiece_graph::{GraphPatch, SceneGraph};
use setpiece_relate::relate_distance;

use crate::bus::Bus;
use crate::message::{Decision, Envelope, Payload, RelationClaim};

/// Predicate name reported as the basis of every proposal.
const PROPOSAL_BASIS: &str = "topo.relate";

/// One negotiation agent, bound to a node id.
///
/// Agents hold no node data and no store reference: they are handed the
/// store read-only on each call, write proposals to the bus, and return
/// accepted relations as a patch for the orchestrator to apply.
#[derive(Clone, Debug)]
pub struct Agent {
    /// The node this agent speaks for.
    pub id: String,
    /// The node's class, for diagnostics.
    pub class: String,
    /// Undelivered messages, appended by the orchestrator's delivery step.
    pub inbox: Vec<Envelope>,
    params: SpatialParams,
}

impl Agent {
    /// An agent for node `id`.
    #[must_use]
    pub fn new(id: impl Into<String>, class: impl Into<String>, params: SpatialParams) -> Self {
        Self {
            id: id.into(),
            class: class.into(),
            inbox: Vec::new(),
            params,
        }
    }

    /// Classifies every neighbor within the perception radius and proposes
    /// connecting relations to them.
    ///
    /// Only the distance rule runs here: `near` is the connecting relation
    /// agents negotiate; resting and adjacency relations are maintained by
    /// support inference, not by gossip.
    pub fn perceive_and_propose(&self, graph: &SceneGraph, bus: &mut Bus) {
        let Some(me) = graph.get(&self.id) else {
            return;
        };
        for neighbor in graph.neighbors(&self.id, self.params.neighbor_radius) {
            let classification =
                relate_distance(&me.placed(), &neighbor.placed(), &self.params);
            if !classification.kind.is_connecting() {
                continue;
            }
            trace!(
                from = %self.id,
                to = %neighbor.id,
                conf = classification.conf,
                "proposing near relation"
            );
            let claim =
                RelationClaim::from_classification(classification, &self.id, &neighbor.id);
            bus.post(
                &self.id,
                &neighbor.id,
                Payload::RelationPropose {
                    relation: claim,
                    basis: PROPOSAL_BASIS.to_owned(),
                },
            );
        }
    }

    /// Answers every message in the inbox and folds accepted proposals into
    /// a patch.
    ///
    /// Proposals are accepted iff their confidence reaches the configured
    /// threshold; every proposal is acked either way. Acks and reserved
    /// `STATE_UPDATE` messages are consumed without action.
    pub fn handle_inbox(&mut self, bus: &mut Bus) -> GraphPatch {
        let mut patch = GraphPatch::new();
        for envelope in std::mem::take(&mut self.inbox) {
            match envelope.payload {
                Payload::RelationPropose { relation, .. } => {
                    if envelope.receiver != self.id {
                        continue;
                    }
                    let decision = if relation.conf >= self.params.accept_conf {
                        Decision::Accept
                    } else {
                        Decision::Reject
                    };
                    debug!(
                        agent = %self.id,
                        from = %envelope.sender,
                        relation = %relation.kind,
                        decision = decision.as_str(),
                        "proposal answered"
                    );
                    bus.post(
                        &self.id,
                        &envelope.sender,
                        Payload::RelationAck {
                            relation: relation.clone(),
                            decision,
                        },
                    );
                    if decision == Decision::Accept {
                        let ts = bus.stamp();
                        patch.upsert_relation(relation.into_relation(ts));
                    }
                }
                Payload::RelationAck { .. } => {
                    // Reserved for confidence feedback; nothing yet.
                }
                Payload::StateUpdate { .. } => {
                    // Reserved.
                }
            }
        }
        patch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec3;
    use setpiece_graph::Node;
    use setpiece_relate::RelationKind;

    fn two_cubes(gap: f64) -> SceneGraph {
        let mut g = SceneGraph::new(SpatialParams::default());
        g.load_bootstrap(
            vec![
                Node::new("a", "box", dvec3(0.0, 0.0, 0.05), dvec3(0.1, 0.1, 0.1)),
                Node::new("b", "box", dvec3(gap, 0.0, 0.05), dvec3(0.1, 0.1, 0.1)),
            ],
            Vec::new(),
        );
        g
    }

    #[test]
    fn agents_propose_near_to_close_neighbors() {
        let g = two_cubes(0.3);
        let mut bus = Bus::new();
        let agent = Agent::new("a", "box", SpatialParams::default());
        agent.perceive_and_propose(&g, &mut bus);

        let queued = bus.drain("b");
        assert_eq!(queued.len(), 1);
        match &queued[0].payload {
            Payload::RelationPropose { relation, basis } => {
                assert_eq!(relation.kind, RelationKind::Near);
                assert_eq!(relation.a, "a");
                assert_eq!(relation.b, "b");
                assert_eq!(relation.conf, 0.9);
                assert_eq!(basis, "topo.relate");
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn distant_neighbors_get_no_proposal() {
        // Within the perception radius but beyond the near threshold.
        let g = two_cubes(1.2);
        let mut bus = Bus::new();
        let agent = Agent::new("a", "box", SpatialParams::default());
        agent.perceive_and_propose(&g, &mut bus);
        assert_eq!(bus.pending("b"), 0);
    }

    #[test]
    fn confident_proposals_are_accepted_and_acked() {
        let g = two_cubes(0.3);
        let mut bus = Bus::new();
        let proposer = Agent::new("a", "box", SpatialParams::default());
        proposer.perceive_and_propose(&g, &mut bus);

        let mut receiver = Agent::new("b", "box", SpatialParams::default());
        receiver.inbox.extend(bus.drain("b"));
        let patch = receiver.handle_inbox(&mut bus);

        assert_eq!(patch.add_relations.len(), 1);
        assert_eq!(patch.add_relations[0].kind, RelationKind::Near);

        let acks = bus.drain("a");
        assert_eq!(acks.len(), 1);
        assert!(matches!(
            &acks[0].payload,
            Payload::RelationAck { decision: Decision::Accept, .. }
        ));
    }

    #[test]
    fn weak_proposals_are_rejected_but_still_acked() {
        let mut bus = Bus::new();
        let claim = RelationClaim {
            kind: RelationKind::Near,
            a: "a".to_owned(),
            b: "b".to_owned(),
            props: std::collections::BTreeMap::new(),
            conf: 0.5,
        };
        bus.post(
            "a",
            "b",
            Payload::RelationPropose {
                relation: claim,
                basis: "topo.relate".to_owned(),
            },
        );

        let mut receiver = Agent::new("b", "box", SpatialParams::default());
        receiver.inbox.extend(bus.drain("b"));
        let patch = receiver.handle_inbox(&mut bus);
        assert!(patch.is_empty());

        let acks = bus.drain("a");
        assert!(matches!(
            &acks[0].payload,
            Payload::RelationAck { decision: Decision::Reject, .. }
        ));
    }
}
