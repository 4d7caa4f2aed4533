// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The append-only event log.

use crate::clock::Stamp;
use crate::patch::FieldMask;
use crate::relation::RelKey;

/// One entry in the store's event log.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A bootstrap payload finished loading.
    BootstrapLoaded {
        /// When.
        ts: Stamp,
    },
    /// A node entered the store.
    NodeAdded {
        /// Node id.
        id: String,
        /// When.
        ts: Stamp,
    },
    /// A node was updated in place.
    NodeUpdated {
        /// Node id.
        id: String,
        /// Which fields changed.
        changed: FieldMask,
        /// When.
        ts: Stamp,
    },
    /// A relation was inserted or refreshed under LWW.
    RelUpsert {
        /// Relation identity.
        key: RelKey,
        /// The relation's own timestamp.
        ts: Stamp,
        /// The relation's confidence.
        conf: f64,
    },
    /// A relation was removed.
    RelRemoved {
        /// Relation identity.
        key: RelKey,
        /// When.
        ts: Stamp,
    },
}

impl Event {
    /// Stable wire name of the event kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::BootstrapLoaded { .. } => "BOOTSTRAP_LOADED",
            Self::NodeAdded { .. } => "NODE_ADDED",
            Self::NodeUpdated { .. } => "NODE_UPDATED",
            Self::RelUpsert { .. } => "REL_UPSERT",
            Self::RelRemoved { .. } => "REL_REMOVED",
        }
    }

    /// The entry's timestamp.
    #[must_use]
    pub const fn ts(&self) -> Stamp {
        match self {
            Self::BootstrapLoaded { ts }
            | Self::NodeAdded { ts, .. }
            | Self::NodeUpdated { ts, .. }
            | Self::RelUpsert { ts, .. }
            | Self::RelRemoved { ts, .. } => *ts,
        }
    }

    /// Whether this entry records relation negotiation activity.
    #[must_use]
    pub const fn is_negotiation(&self) -> bool {
        matches!(self, Self::RelUpsert { .. } | Self::RelRemoved { .. })
    }
}
