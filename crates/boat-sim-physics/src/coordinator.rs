// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Actuation request coordinator.
//!
//! Turns one actuation command into the asynchronous goal workflow of an
//! actuator service and tracks it until it reaches a terminal state:
//!
//! ```text
//! Pending --accept--> Accepted --result--> Completed
//!    |
//!    +--reject--> Rejected
//!    +--no server / no response--> TimedOut
//! ```
//!
//! At most one request is outstanding. Submitting while a request is Pending
//! or Accepted returns [`ActuationError::Busy`] and changes nothing.
//!
//! The coordinator never blocks on the workflow itself. Goal responses,
//! feedback and results are fed back by the owning node through
//! [`ActuationCoordinator::handle_goal_event`] (or the `on_*` methods), all on
//! the node's executor thread.

use crate::service::{ActuatorService, ScalarActuation};
use boat_sim_core::{ActionError, GoalEvent, GoalId, Scalar};
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Number of requests kept observable, the outstanding one included.
pub const HISTORY_CAPACITY: usize = 16;

/// Identifier of a request, valid while the request is retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestHandle(u64);

impl RequestHandle {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    Accepted,
    Rejected,
    Completed,
    TimedOut,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Completed | Self::TimedOut)
    }
}

/// One actuation goal and what is known about it.
#[derive(Debug, Clone)]
pub struct ActuationRequest {
    pub handle: RequestHandle,

    /// Target value (radians)
    pub desired_heading: Scalar,

    pub state: RequestState,

    /// Most recent actuator angle reported in feedback
    pub last_feedback_angle: Option<Scalar>,

    /// Final residual, only set once Completed
    pub result: Option<Scalar>,

    /// Goal identity, set once dispatched
    pub goal_id: Option<GoalId>,

    pub submitted_at: Instant,
}

/// Transition notification sent to observers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuationEvent {
    Accepted { handle: RequestHandle },
    Rejected { handle: RequestHandle },
    Feedback { handle: RequestHandle, angle: Scalar },
    Completed { handle: RequestHandle, residual: Scalar },
    TimedOut { handle: RequestHandle },
}

impl ActuationEvent {
    pub fn handle(&self) -> RequestHandle {
        match *self {
            Self::Accepted { handle }
            | Self::Rejected { handle }
            | Self::Feedback { handle, .. }
            | Self::Completed { handle, .. }
            | Self::TimedOut { handle } => handle,
        }
    }
}

/// Submission errors. None of them is fatal.
#[derive(Debug, Error)]
pub enum ActuationError {
    #[error("Request {0} is still outstanding")]
    Busy(RequestHandle),

    #[error("Actuator service did not respond within {timeout:?} (request {handle})")]
    Unavailable {
        handle: RequestHandle,
        timeout: Duration,
    },

    #[error("Failed to dispatch request {handle}: {source}")]
    Dispatch {
        handle: RequestHandle,
        #[source]
        source: ActionError,
    },
}

/// Coordinator of actuation requests for one actuator.
pub struct ActuationCoordinator<S: ActuatorService> {
    /// Log prefix (usually the action name)
    name: String,

    service: S,

    /// Bound for the server wait and for the goal response
    timeout: Duration,

    next_handle: u64,

    outstanding: Option<RequestHandle>,

    /// Retained requests, oldest first
    requests: VecDeque<ActuationRequest>,

    /// Dispatch table: goal identity -> request
    goals: HashMap<GoalId, RequestHandle>,

    observers: Vec<Sender<ActuationEvent>>,
}

impl<S: ActuatorService> ActuationCoordinator<S> {
    pub fn new(name: &str, service: S, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            service,
            timeout,
            next_handle: 1,
            outstanding: None,
            requests: VecDeque::with_capacity(HISTORY_CAPACITY),
            goals: HashMap::new(),
            observers: Vec::new(),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Handle of the Pending or Accepted request, if any.
    pub fn outstanding(&self) -> Option<RequestHandle> {
        self.outstanding
    }

    pub fn is_busy(&self) -> bool {
        self.outstanding.is_some()
    }

    pub fn request(&self, handle: RequestHandle) -> Option<&ActuationRequest> {
        self.requests.iter().find(|r| r.handle == handle)
    }

    /// Retained requests, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &ActuationRequest> {
        self.requests.iter()
    }

    /// Subscribe to transition events.
    ///
    /// Events are dropped for this observer while its queue is full.
    pub fn subscribe(&mut self, capacity: usize) -> Receiver<ActuationEvent> {
        let (tx, rx) = channel::bounded(capacity.max(1));
        self.observers.push(tx);
        rx
    }

    /// Submit a goal toward `desired_heading`.
    ///
    /// Blocks at most `timeout` waiting for the actuator service. On success
    /// the returned request is Pending until the goal response arrives.
    pub fn submit_goal(&mut self, desired_heading: Scalar) -> Result<RequestHandle, ActuationError> {
        if let Some(handle) = self.outstanding {
            log::debug!(
                "[{}] request {} still outstanding, skipping submission",
                self.name,
                handle
            );
            return Err(ActuationError::Busy(handle));
        }

        let handle = self.create_request(desired_heading);
        log::debug!("[{}] initiating goal request {}", self.name, handle);

        if !self.service.wait_for_server(self.timeout) {
            log::warn!(
                "[{}] goal request timed out after {} seconds. Aborting...",
                self.name,
                self.timeout.as_secs_f64()
            );
            self.finish(handle, RequestState::TimedOut);
            return Err(ActuationError::Unavailable {
                handle,
                timeout: self.timeout,
            });
        }

        match self.service.send_goal(desired_heading) {
            Ok(goal_id) => {
                if let Some(request) = self.request_mut(handle) {
                    request.goal_id = Some(goal_id);
                }
                self.goals.insert(goal_id, handle);
                self.outstanding = Some(handle);
                log::debug!(
                    "[{}] completed goal request {} (goal {})",
                    self.name,
                    handle,
                    goal_id
                );
                Ok(handle)
            }
            Err(source) => {
                log::warn!("[{}] failed to dispatch goal request {}: {}", self.name, handle, source);
                self.finish(handle, RequestState::TimedOut);
                Err(ActuationError::Dispatch { handle, source })
            }
        }
    }

    /// Apply an accept/reject response.
    pub fn on_goal_response(&mut self, goal_id: GoalId, accepted: bool) -> Option<ActuationEvent> {
        let handle = self.live_request(goal_id, RequestState::Pending)?;

        if accepted {
            if let Some(request) = self.request_mut(handle) {
                request.state = RequestState::Accepted;
            }
            log::debug!("[{}] goal {} accepted, beginning actuation", self.name, goal_id);
            let event = ActuationEvent::Accepted { handle };
            self.emit(event);
            Some(event)
        } else {
            log::warn!("[{}] attempted to send goal {}, but it was rejected", self.name, goal_id);
            Some(self.finish(handle, RequestState::Rejected))
        }
    }

    /// Record the actuator angle reported for an accepted goal.
    pub fn on_feedback(&mut self, goal_id: GoalId, angle: Scalar) -> Option<ActuationEvent> {
        let handle = self.live_request(goal_id, RequestState::Accepted)?;
        if let Some(request) = self.request_mut(handle) {
            request.last_feedback_angle = Some(angle);
        }

        let event = ActuationEvent::Feedback { handle, angle };
        self.emit(event);
        Some(event)
    }

    /// Complete an accepted goal with its residual.
    pub fn on_result(&mut self, goal_id: GoalId, residual: Scalar) -> Option<ActuationEvent> {
        let handle = self.live_request(goal_id, RequestState::Accepted)?;
        if let Some(request) = self.request_mut(handle) {
            request.result = Some(residual);
        }
        log::debug!(
            "[{}] goal {} finished with a residual of {:.2} radians",
            self.name,
            goal_id,
            residual
        );
        Some(self.finish(handle, RequestState::Completed))
    }

    /// Decode-free entry point for the events of a scalar actuation client.
    pub fn handle_goal_event<A: ScalarActuation>(&mut self, event: &GoalEvent<A>) -> Option<ActuationEvent> {
        match event {
            GoalEvent::Response { goal_id, accepted } => self.on_goal_response(*goal_id, *accepted),
            GoalEvent::Feedback { goal_id, feedback } => {
                self.on_feedback(*goal_id, A::feedback_angle(feedback))
            }
            GoalEvent::Result { goal_id, result } => self.on_result(*goal_id, A::residual(result)),
        }
    }

    /// Time out the outstanding request if its goal response is overdue.
    pub fn expire_stale(&mut self, now: Instant) -> Option<ActuationEvent> {
        let handle = self.outstanding?;
        let request = self.request(handle)?;
        if request.state != RequestState::Pending
            || now.saturating_duration_since(request.submitted_at) < self.timeout
        {
            return None;
        }

        log::warn!(
            "[{}] no goal response for request {} after {} seconds",
            self.name,
            handle,
            self.timeout.as_secs_f64()
        );
        Some(self.finish(handle, RequestState::TimedOut))
    }

    fn create_request(&mut self, desired_heading: Scalar) -> RequestHandle {
        let handle = RequestHandle(self.next_handle);
        self.next_handle += 1;

        // Only terminal requests are evicted: the outstanding one is always newest
        while self.requests.len() >= HISTORY_CAPACITY {
            self.requests.pop_front();
        }
        self.requests.push_back(ActuationRequest {
            handle,
            desired_heading,
            state: RequestState::Pending,
            last_feedback_angle: None,
            result: None,
            goal_id: None,
            submitted_at: Instant::now(),
        });
        handle
    }

    fn request_mut(&mut self, handle: RequestHandle) -> Option<&mut ActuationRequest> {
        self.requests.iter_mut().find(|r| r.handle == handle)
    }

    /// Resolve a goal to its request if the request is in `expected` state.
    fn live_request(&self, goal_id: GoalId, expected: RequestState) -> Option<RequestHandle> {
        let Some(&handle) = self.goals.get(&goal_id) else {
            log::debug!("[{}] ignoring event for unknown or finished goal {}", self.name, goal_id);
            return None;
        };
        let state = self.request(handle)?.state;
        if state != expected {
            log::debug!(
                "[{}] ignoring event for goal {} in state {:?}",
                self.name,
                goal_id,
                state
            );
            return None;
        }
        Some(handle)
    }

    /// Move a request to a terminal state and reset the coordinator.
    fn finish(&mut self, handle: RequestHandle, state: RequestState) -> ActuationEvent {
        let mut residual = 0.0;
        let mut goal_id = None;
        if let Some(request) = self.request_mut(handle) {
            request.state = state;
            residual = request.result.unwrap_or_default();
            goal_id = request.goal_id;
        }
        if let Some(goal_id) = goal_id {
            self.goals.remove(&goal_id);
        }
        if self.outstanding == Some(handle) {
            self.outstanding = None;
        }

        let event = match state {
            RequestState::Rejected => ActuationEvent::Rejected { handle },
            RequestState::Completed => ActuationEvent::Completed { handle, residual },
            _ => ActuationEvent::TimedOut { handle },
        };
        self.emit(event);
        event
    }

    fn emit(&mut self, event: ActuationEvent) {
        self.observers.retain(|tx| match tx.try_send(event) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        });
    }
}
