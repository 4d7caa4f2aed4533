// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Directed, typed relations between nodes.

use core::fmt;
use std::collections::BTreeMap;

use setpiece_relate::RelationKind;

use crate::clock::Stamp;

/// Identity of a relation: kind plus ordered endpoints.
///
/// The store holds at most one relation per key. Keys order lexicographically
/// by `(kind, a, b)`, which — together with the timestamp — makes
/// last-write-wins resolution total.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelKey {
    /// Relation kind.
    pub kind: RelationKind,
    /// Source endpoint id.
    pub a: String,
    /// Target endpoint id.
    pub b: String,
}

impl RelKey {
    /// Builds a key.
    #[must_use]
    pub fn new(kind: RelationKind, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            kind,
            a: a.into(),
            b: b.into(),
        }
    }

    /// Whether either endpoint is `id`.
    #[must_use]
    pub fn touches(&self, id: &str) -> bool {
        self.a == id || self.b == id
    }
}

impl fmt::Display for RelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.kind, self.a, self.b)
    }
}

/// A directed, typed edge between two nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct Relation {
    /// Relation kind.
    pub kind: RelationKind,
    /// Source endpoint id.
    pub a: String,
    /// Target endpoint id.
    pub b: String,
    /// Numeric evidence (distances, offsets).
    pub props: BTreeMap<String, f64>,
    /// Upsert timestamp, the LWW discriminator.
    pub ts: Stamp,
    /// Confidence in `[0, 1]`.
    pub conf: f64,
}

impl Relation {
    /// A relation with empty props.
    #[must_use]
    pub fn new(
        kind: RelationKind,
        a: impl Into<String>,
        b: impl Into<String>,
        ts: Stamp,
        conf: f64,
    ) -> Self {
        Self {
            kind,
            a: a.into(),
            b: b.into(),
            props: BTreeMap::new(),
            ts,
            conf,
        }
    }

    /// Attaches props.
    #[must_use]
    pub fn with_props(mut self, props: BTreeMap<String, f64>) -> Self {
        self.props = props;
        self
    }

    /// The store key of this relation.
    #[must_use]
    pub fn key(&self) -> RelKey {
        RelKey::new(self.kind, self.a.clone(), self.b.clone())
    }
}
