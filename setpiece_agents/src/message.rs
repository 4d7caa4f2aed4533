// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Message envelopes exchanged between agents.

use std::collections::BTreeMap;

use uuid::Uuid;

use setpiece_graph::{Relation, Stamp, Value};
use setpiece_relate::{Classification, RelationKind};

/// A relation as carried inside proposals and acks: identity and evidence,
/// but no timestamp yet. The accepting agent stamps it when it enters the
/// store.
#[derive(Clone, Debug, PartialEq)]
pub struct RelationClaim {
    /// Relation kind.
    pub kind: RelationKind,
    /// Source endpoint id.
    pub a: String,
    /// Target endpoint id.
    pub b: String,
    /// Numeric evidence.
    pub props: BTreeMap<String, f64>,
    /// Proposer's confidence.
    pub conf: f64,
}

impl RelationClaim {
    /// Wraps a kernel classification with its endpoint ids.
    #[must_use]
    pub fn from_classification(
        classification: Classification,
        a: impl Into<String>,
        b: impl Into<String>,
    ) -> Self {
        Self {
            kind: classification.kind,
            a: a.into(),
            b: b.into(),
            props: classification.props,
            conf: classification.conf,
        }
    }

    /// Stamps the claim into a store relation.
    #[must_use]
    pub fn into_relation(self, ts: Stamp) -> Relation {
        Relation {
            kind: self.kind,
            a: self.a,
            b: self.b,
            props: self.props,
            ts,
            conf: self.conf,
        }
    }
}

/// Verdict on a proposed relation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// The proposal meets the acceptance threshold.
    Accept,
    /// It does not.
    Reject,
}

impl Decision {
    /// Stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
        }
    }
}

/// Message body variants.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Propose a relation to the receiving agent.
    RelationPropose {
        /// The proposed relation.
        relation: RelationClaim,
        /// Which predicate produced it.
        basis: String,
    },
    /// Answer a proposal.
    RelationAck {
        /// The relation being answered.
        relation: RelationClaim,
        /// The verdict.
        decision: Decision,
    },
    /// Reserved for future node-state gossip; consumed without action.
    StateUpdate {
        /// The node whose state changed.
        node_id: String,
        /// Changed fields.
        fields: BTreeMap<String, Value>,
    },
}

impl Payload {
    /// Stable wire name of the message type.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RelationPropose { .. } => "RELATION_PROPOSE",
            Self::RelationAck { .. } => "RELATION_ACK",
            Self::StateUpdate { .. } => "STATE_UPDATE",
        }
    }
}

/// One message on the bus.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    /// Unique message id.
    pub mid: Uuid,
    /// Bus timestamp at post time.
    pub ts: Stamp,
    /// Sending agent id.
    pub sender: String,
    /// Receiving agent id.
    pub receiver: String,
    /// The body.
    pub payload: Payload,
}
