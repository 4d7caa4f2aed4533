// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Setpiece Agents: per-object negotiation over a mailbox bus.
//!
//! Every scene object gets one [`Agent`]. Agents never own nodes: they read
//! the store through `get`/`neighbors` and change it only by folding
//! accepted proposals into a [`GraphPatch`](setpiece_graph::GraphPatch).
//!
//! One [`tick`] runs a single negotiation round in a fixed order:
//!
//! 1. **Deliver** — every agent drains its mailbox into its inbox.
//! 2. **Perceive & propose** — every agent classifies its neighbors and
//!    sends `RELATION_PROPOSE` messages for connecting relations. Messages
//!    sent here sit in the bus until the next tick's delivery step, so a
//!    proposal is never observable in the tick that produced it.
//! 3. **Handle & patch** — every agent answers its inbox with
//!    `RELATION_ACK` messages and applies accepted relations to the store.
//!
//! Agents run in ascending id order throughout, so a round is fully
//! deterministic given the scene. Under a static scene negotiation is
//! monotone: a tick either upserts relations (or refreshes them under LWW)
//! or is a no-op; the kernel never flaps between contradictory answers.

mod agent;
mod bus;
mod message;
mod orchestrator;

pub use agent::Agent;
pub use bus::Bus;
pub use message::{Decision, Envelope, Payload, RelationClaim};
pub use orchestrator::{make_agents, tick};
