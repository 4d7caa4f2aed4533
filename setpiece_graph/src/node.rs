// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nodes: physical objects, rooms, and their typed state.

use core::fmt;
use std::collections::BTreeMap;

use glam::DVec3;
use setpiece_relate::Placed;

/// Class name of room nodes, which are exempt from physics and collision.
pub const ROOM_CLASS: &str = "room";

/// A scalar state or metadata value.
///
/// Unrecognized `state` and all `meta` entries are preserved verbatim as
/// these and ignored by the core.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string.
    Text(String),
}

impl Value {
    /// The string payload, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Level of mobility of an object.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Lom {
    /// Never moves (walls, built-ins).
    Fixed,
    /// Rarely moves (large furniture).
    Low,
    /// Occasionally moves.
    #[default]
    Medium,
    /// Freely portable.
    High,
}

impl Lom {
    /// Stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parses a wire name; unknown names map to the default.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "fixed" => Self::Fixed,
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }
}

bitflags::bitflags! {
    /// Recognized boolean state switches.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct StateFlags: u8 {
        /// Pinned: exempt from grounding, validation, and gravity cascades.
        const PHYSICS_OVERRIDE = 0b0000_0001;
        /// Never moved by gravity cascades even when support is lost.
        const PREVENT_GRAVITY  = 0b0000_0010;
    }
}

/// How a pinned object is attached to the structure.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// Hangs from the ceiling.
    Ceiling,
    /// Mounted on a wall.
    Wall,
    /// Any other attachment named by the payload.
    Other(String),
}

impl Attachment {
    /// Stable wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ceiling => "ceiling",
            Self::Wall => "wall",
            Self::Other(s) => s,
        }
    }

    /// Parses a wire name.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "ceiling" => Self::Ceiling,
            "wall" => Self::Wall,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// Typed view of a node's `state` mapping.
///
/// Recognized keys (`physics_override`, `prevent_gravity`,
/// `attachment_type`) get typed storage; everything else lands in `extra`
/// untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeState {
    /// Recognized boolean switches.
    pub flags: StateFlags,
    /// Recognized attachment kind.
    pub attachment: Option<Attachment>,
    /// Unrecognized keys, preserved verbatim.
    pub extra: BTreeMap<String, Value>,
}

impl NodeState {
    /// State with `physics_override` set, optionally attached.
    #[must_use]
    pub fn pinned(attachment: Option<Attachment>) -> Self {
        Self {
            flags: StateFlags::PHYSICS_OVERRIDE,
            attachment,
            ..Self::default()
        }
    }

    /// Whether the node is exempt from physics.
    #[must_use]
    pub const fn is_pinned(&self) -> bool {
        self.flags.contains(StateFlags::PHYSICS_OVERRIDE)
    }

    /// Whether gravity cascades must leave the node alone.
    #[must_use]
    pub const fn prevents_gravity(&self) -> bool {
        self.flags.contains(StateFlags::PREVENT_GRAVITY)
    }
}

/// An object in the scene.
///
/// Positions are world-frame centres; `bbox` holds full extents (width,
/// depth, height). The store clamps extents to the configured minimum when
/// nodes enter it. Only axis-aligned orientation is interpreted by the core;
/// `ori` is carried for consumers.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Globally unique id.
    pub id: String,
    /// Human-readable name; not unique, may be empty.
    pub name: String,
    /// Class tag (`table`, `chair`, `cup`, `wall`, `room`, ...).
    pub class: String,
    /// World-frame centre.
    pub pos: DVec3,
    /// Orientation quaternion `[x, y, z, w]`.
    pub ori: [f64; 4],
    /// Full extents.
    pub bbox: DVec3,
    /// Affordance tags.
    pub aff: Vec<String>,
    /// Level of mobility.
    pub lom: Lom,
    /// Detection/record confidence in `[0, 1]`.
    pub conf: f64,
    /// Typed state.
    pub state: NodeState,
    /// Opaque metadata.
    pub meta: BTreeMap<String, Value>,
}

impl Node {
    /// A node with the given identity and geometry and default everything
    /// else (identity orientation, medium mobility, confidence 1).
    #[must_use]
    pub fn new(id: impl Into<String>, class: impl Into<String>, pos: DVec3, bbox: DVec3) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            class: class.into(),
            pos,
            ori: [0.0, 0.0, 0.0, 1.0],
            bbox,
            aff: Vec::new(),
            lom: Lom::default(),
            conf: 1.0,
            state: NodeState::default(),
            meta: BTreeMap::new(),
        }
    }

    /// Whether this node is a room.
    #[must_use]
    pub fn is_room(&self) -> bool {
        self.class == ROOM_CLASS
    }

    /// The kernel's view of this node.
    #[must_use]
    pub fn placed(&self) -> Placed<'_> {
        Placed {
            id: &self.id,
            center: self.pos,
            size: self.bbox,
        }
    }
}
