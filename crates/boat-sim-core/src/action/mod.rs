// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Goal-based action protocol between nodes.
//!
//! ```text
//! client node                         server node
//!     |  send_goal ----- GoalRequest ---->  |  on_goal_request
//!     |  <---- GoalResponse (accept/reject) |
//!     |  <---- Feedback (0..n) ------------ |
//!     |  <---- Result (exactly one) ------- |
//! ```
//!
//! Every event carries the [`GoalId`] assigned by the client, so a client can
//! keep several goals apart with a plain map keyed by id.

mod client;
mod error;
mod server;
mod types;

pub use client::ActionClient;
pub use error::{ActionError, ActionResult};
pub use server::{ActionServer, GoalHandle};
pub(crate) use types::ActionServerEntry;
pub use types::{Action, ActionEvent, GoalEvent, GoalId, GoalRequest};
