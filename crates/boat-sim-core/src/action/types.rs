// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Action protocol types.

use crate::node::{Event, NodeId};
use crossbeam::channel::Sender;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Identity of a goal: the client that sent it and its per-client sequence.
///
/// Used as the correlation key for goal responses, feedback and results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GoalId {
    /// Unique id of the sending client within the context
    pub client_id: u64,

    /// Goal sequence number, starting at 1 per client
    pub sequence_number: u64,
}

impl GoalId {
    pub fn new(client_id: u64, sequence_number: u64) -> Self {
        Self {
            client_id,
            sequence_number,
        }
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.client_id, self.sequence_number)
    }
}

/// An action type: goal, feedback and result messages.
pub trait Action: Send + 'static {
    /// Registered action type name (e.g. `"SimRudderActuation"`).
    const TYPE_NAME: &'static str;

    type Goal: Serialize + DeserializeOwned + fmt::Debug + Send;
    type Feedback: Serialize + DeserializeOwned + fmt::Debug + Send;
    type Result: Serialize + DeserializeOwned + fmt::Debug + Send;
}

/// Raw action event delivered to a client node.
#[derive(Debug, Clone)]
pub enum ActionEvent {
    /// Server accepted or rejected a goal
    GoalResponse {
        action: String,
        goal_id: GoalId,
        accepted: bool,
    },

    /// Intermediate feedback for an accepted goal
    Feedback {
        action: String,
        goal_id: GoalId,
        payload: Vec<u8>,
    },

    /// Final result for an accepted goal
    Result {
        action: String,
        goal_id: GoalId,
        payload: Vec<u8>,
    },
}

impl ActionEvent {
    /// Action name the event belongs to.
    pub fn action_name(&self) -> &str {
        match self {
            Self::GoalResponse { action, .. }
            | Self::Feedback { action, .. }
            | Self::Result { action, .. } => action,
        }
    }

    pub fn goal_id(&self) -> GoalId {
        match self {
            Self::GoalResponse { goal_id, .. }
            | Self::Feedback { goal_id, .. }
            | Self::Result { goal_id, .. } => *goal_id,
        }
    }
}

/// Decoded action event for a specific action type.
#[derive(Debug)]
pub enum GoalEvent<A: Action> {
    Response { goal_id: GoalId, accepted: bool },
    Feedback { goal_id: GoalId, feedback: A::Feedback },
    Result { goal_id: GoalId, result: A::Result },
}

/// A goal received by a server node.
pub struct GoalRequest {
    pub(crate) action: String,
    pub(crate) goal_id: GoalId,
    pub(crate) payload: Vec<u8>,
    pub(crate) reply: Sender<Event>,
}

impl GoalRequest {
    pub fn action_name(&self) -> &str {
        &self.action
    }

    pub fn goal_id(&self) -> GoalId {
        self.goal_id
    }
}

impl fmt::Debug for GoalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoalRequest")
            .field("action", &self.action)
            .field("goal_id", &self.goal_id)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

/// Registry entry of an action server.
#[derive(Clone)]
pub(crate) struct ActionServerEntry {
    pub(crate) type_name: &'static str,
    pub(crate) node_id: NodeId,
    pub(crate) waker: Sender<Event>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_id_display_and_order() {
        let a = GoalId::new(3, 1);
        let b = GoalId::new(3, 2);
        assert_eq!(a.to_string(), "3.1");
        assert!(a < b);
    }

    #[test]
    fn test_action_event_accessors() {
        let event = ActionEvent::Feedback {
            action: "rudder_actuation".into(),
            goal_id: GoalId::new(1, 4),
            payload: Vec::new(),
        };
        assert_eq!(event.action_name(), "rudder_actuation");
        assert_eq!(event.goal_id(), GoalId::new(1, 4));
    }
}
