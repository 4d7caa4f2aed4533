// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only scene summaries for language-model consumers.

use glam::DVec3;
use setpiece_relate::RelationKind;

use crate::node::{Lom, NodeState};

/// Snapshot of one nearby object.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextObject {
    /// Node id.
    pub id: String,
    /// Class tag.
    pub class: String,
    /// World-frame centre.
    pub pos: DVec3,
    /// Full extents.
    pub bbox: DVec3,
    /// Level of mobility.
    pub lom: Lom,
    /// Affordance tags.
    pub aff: Vec<String>,
    /// State snapshot.
    pub state: NodeState,
    /// Confidence.
    pub conf: f64,
}

/// One relation whose endpoints intersect the selected objects.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextRelation {
    /// Relation kind.
    pub kind: RelationKind,
    /// Source endpoint id.
    pub a: String,
    /// Target endpoint id.
    pub b: String,
    /// Confidence.
    pub conf: f64,
}

/// A structured summary of the scene around an agent pose.
///
/// Produced by [`SceneGraph::llm_context`](crate::SceneGraph::llm_context);
/// purely a read-only export.
#[derive(Clone, Debug, PartialEq)]
pub struct LlmContext {
    /// Coordinate frame of the poses, always `"map"`.
    pub frame: String,
    /// The querying agent's pose.
    pub agent_pose: DVec3,
    /// Region of interest label echoed from the request.
    pub roi: String,
    /// One-line natural-language summary.
    pub summary: String,
    /// The K nearest objects, closest first.
    pub objects: Vec<ContextObject>,
    /// Relations among or touching the selected objects.
    pub relations: Vec<ContextRelation>,
    /// Synthesized notices ("Stove is ON nearby.").
    pub notices: Vec<String>,
}
