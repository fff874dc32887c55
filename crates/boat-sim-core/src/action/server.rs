// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Action server.

use super::error::{ActionError, ActionResult};
use super::types::{Action, ActionEvent, ActionServerEntry, GoalId, GoalRequest};
use crate::bus::Context;
use crate::node::{Event, NodeId};
use crossbeam::channel::Sender;
use std::marker::PhantomData;

/// Server side of an action.
///
/// Registered under its action name for as long as it lives. Goals arrive in
/// the owning node's [`NodeCallbacks::on_goal_request`](crate::NodeCallbacks::on_goal_request).
pub struct ActionServer<A: Action> {
    action_name: String,
    context: Context,
    node_id: NodeId,
    _marker: PhantomData<fn(A)>,
}

impl<A: Action> ActionServer<A> {
    pub(crate) fn new(
        context: &Context,
        action_name: &str,
        node_id: NodeId,
        waker: Sender<Event>,
    ) -> ActionResult<Self> {
        let entry = ActionServerEntry {
            type_name: A::TYPE_NAME,
            node_id,
            waker,
        };
        if !context.register_action_server(action_name, entry) {
            return Err(ActionError::AlreadyRegistered(action_name.to_string()));
        }

        Ok(Self {
            action_name: action_name.to_string(),
            context: context.clone(),
            node_id,
            _marker: PhantomData,
        })
    }

    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    /// Whether the request is addressed to this server.
    pub fn owns(&self, request: &GoalRequest) -> bool {
        request.action == self.action_name
    }

    pub fn decode_goal(&self, request: &GoalRequest) -> ActionResult<A::Goal> {
        Ok(serde_json::from_slice(&request.payload)?)
    }

    /// Accept a goal and return the handle used to report progress.
    pub fn accept(&self, request: GoalRequest) -> GoalHandle<A> {
        respond(&request, true);
        GoalHandle {
            action: request.action,
            goal_id: request.goal_id,
            reply: request.reply,
            _marker: PhantomData,
        }
    }

    pub fn reject(&self, request: GoalRequest) {
        respond(&request, false);
    }
}

impl<A: Action> Drop for ActionServer<A> {
    fn drop(&mut self) {
        self.context
            .unregister_action_server(&self.action_name, self.node_id);
    }
}

fn respond(request: &GoalRequest, accepted: bool) {
    let event = ActionEvent::GoalResponse {
        action: request.action.clone(),
        goal_id: request.goal_id,
        accepted,
    };
    if request.reply.send(Event::Action(event)).is_err() {
        log::debug!(
            "[action] client of goal {} gone before response",
            request.goal_id
        );
    }
}

/// Handle of an accepted goal.
///
/// Consumed by [`GoalHandle::succeed`], so a goal gets exactly one result.
pub struct GoalHandle<A: Action> {
    action: String,
    goal_id: GoalId,
    reply: Sender<Event>,
    _marker: PhantomData<fn(A)>,
}

impl<A: Action> GoalHandle<A> {
    pub fn goal_id(&self) -> GoalId {
        self.goal_id
    }

    pub fn publish_feedback(&self, feedback: &A::Feedback) -> ActionResult<()> {
        let event = ActionEvent::Feedback {
            action: self.action.clone(),
            goal_id: self.goal_id,
            payload: serde_json::to_vec(feedback)?,
        };
        self.reply
            .send(Event::Action(event))
            .map_err(|_| ActionError::ClientGone(self.goal_id))
    }

    /// Send the final result.
    pub fn succeed(self, result: &A::Result) -> ActionResult<()> {
        let event = ActionEvent::Result {
            action: self.action.clone(),
            goal_id: self.goal_id,
            payload: serde_json::to_vec(result)?,
        };
        self.reply
            .send(Event::Action(event))
            .map_err(|_| ActionError::ClientGone(self.goal_id))
    }
}
