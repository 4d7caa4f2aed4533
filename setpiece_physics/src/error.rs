// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placement failure as a value.

use core::fmt;

/// Why the placement engine could not produce a position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlacementError {
    /// Every sampled candidate collided within the attempt budget.
    NoSafePosition {
        /// How many candidates were tried.
        attempts: usize,
    },
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSafePosition { attempts } => {
                write!(f, "no collision-free position found in {attempts} attempts")
            }
        }
    }
}

impl std::error::Error for PlacementError {}
