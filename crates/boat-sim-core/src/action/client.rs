// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Action client.
//!
//! Goals are sent to the server node's executor. Responses, feedback and
//! results come back as [`ActionEvent`]s on the client node's executor and are
//! decoded with [`ActionClient::decode`].

use super::error::{ActionError, ActionResult};
use super::types::{Action, ActionEvent, GoalEvent, GoalId, GoalRequest};
use crate::bus::Context;
use crate::node::Event;
use crossbeam::channel::Sender;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Poll interval of [`ActionClient::wait_for_server`].
const SERVER_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Client side of an action.
pub struct ActionClient<A: Action> {
    /// Action name
    action_name: String,

    /// Shared bus
    context: Context,

    /// Client id used in every [`GoalId`] this client creates
    client_id: u64,

    /// Goal sequence counter
    sequence: AtomicU64,

    /// Waker of the owning node
    reply: Sender<Event>,

    _marker: PhantomData<fn(A)>,
}

impl<A: Action> ActionClient<A> {
    pub(crate) fn new(context: &Context, action_name: &str, reply: Sender<Event>) -> Self {
        Self {
            action_name: action_name.to_string(),
            context: context.clone(),
            client_id: context.next_id(),
            sequence: AtomicU64::new(1),
            reply,
            _marker: PhantomData,
        }
    }

    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    pub fn client_id(&self) -> u64 {
        self.client_id
    }

    /// Whether a server of the right type is registered.
    pub fn server_is_ready(&self) -> bool {
        self.context
            .action_server(&self.action_name)
            .map(|entry| entry.type_name == A::TYPE_NAME)
            .unwrap_or(false)
    }

    /// Block until the server is ready or `timeout` elapses.
    ///
    /// Returns `true` when the server is ready.
    pub fn wait_for_server(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.server_is_ready() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep(SERVER_POLL_INTERVAL.min(deadline - now));
        }
    }

    /// Send a goal to the server.
    pub fn send_goal(&self, goal: &A::Goal) -> ActionResult<GoalId> {
        let entry = self
            .context
            .action_server(&self.action_name)
            .ok_or_else(|| ActionError::ServerUnavailable(self.action_name.clone()))?;

        if entry.type_name != A::TYPE_NAME {
            return Err(ActionError::TypeMismatch {
                action: self.action_name.clone(),
                registered: entry.type_name.to_string(),
                requested: A::TYPE_NAME.to_string(),
            });
        }

        let payload = serde_json::to_vec(goal)?;
        let goal_id = GoalId::new(self.client_id, self.sequence.fetch_add(1, Ordering::Relaxed));

        let request = GoalRequest {
            action: self.action_name.clone(),
            goal_id,
            payload,
            reply: self.reply.clone(),
        };
        entry
            .waker
            .send(Event::GoalRequest(request))
            .map_err(|_| ActionError::ServerUnavailable(self.action_name.clone()))?;

        log::debug!("[action] sent goal {} on '{}': {:?}", goal_id, self.action_name, goal);
        Ok(goal_id)
    }

    /// Decode an event addressed to this client.
    ///
    /// Returns `None` for events of other actions or other clients.
    pub fn decode(&self, event: &ActionEvent) -> Option<ActionResult<GoalEvent<A>>> {
        if event.action_name() != self.action_name || event.goal_id().client_id != self.client_id {
            return None;
        }

        let decoded = match event {
            ActionEvent::GoalResponse {
                goal_id, accepted, ..
            } => Ok(GoalEvent::Response {
                goal_id: *goal_id,
                accepted: *accepted,
            }),
            ActionEvent::Feedback {
                goal_id, payload, ..
            } => serde_json::from_slice(payload)
                .map(|feedback| GoalEvent::Feedback {
                    goal_id: *goal_id,
                    feedback,
                })
                .map_err(ActionError::from),
            ActionEvent::Result {
                goal_id, payload, ..
            } => serde_json::from_slice(payload)
                .map(|result| GoalEvent::Result {
                    goal_id: *goal_id,
                    result,
                })
                .map_err(ActionError::from),
        };
        Some(decoded)
    }
}
