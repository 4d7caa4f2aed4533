// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The command-level error taxonomy.

use core::fmt;

use setpiece_graph::PatchError;
use setpiece_physics::PlacementError;

/// Why a command failed. Commands are all-or-nothing: whenever one of these
/// is returned the scene is exactly as it was before the call.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandError {
    /// A referenced object is not in the store.
    UnknownObject {
        /// What the command asked for.
        wanted: String,
        /// Every id currently available, ascending.
        available: Vec<String>,
    },
    /// A class + quantity selector matched fewer objects than requested.
    AmbiguousTarget {
        /// The class asked for.
        object_type: String,
        /// How many the command wanted.
        requested: usize,
        /// How many exist.
        found: usize,
    },
    /// The placement engine found no valid position.
    Placement(PlacementError),
    /// The store rejected a patch.
    Patch(PatchError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownObject { wanted, available } => {
                write!(
                    f,
                    "no object matching {wanted:?}; available: {}",
                    available.join(", ")
                )
            }
            Self::AmbiguousTarget {
                object_type,
                requested,
                found,
            } => {
                write!(
                    f,
                    "found only {found} object(s) of type {object_type:?}, but {requested} requested"
                )
            }
            Self::Placement(err) => write!(f, "placement failed: {err}"),
            Self::Patch(err) => write!(f, "patch rejected: {err}"),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Placement(err) => Some(err),
            Self::Patch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PlacementError> for CommandError {
    fn from(err: PlacementError) -> Self {
        Self::Placement(err)
    }
}

impl From<PatchError> for CommandError {
    fn from(err: PatchError) -> Self {
        Self::Patch(err)
    }
}
