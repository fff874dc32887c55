// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Nodes and their single-threaded executor.
//!
//! A [`Node`] owns an event queue fed by its timers, subscriptions and action
//! endpoints. [`Node::spin`] drains that queue and calls the matching
//! [`NodeCallbacks`] method, one event at a time. Nothing inside a node runs
//! concurrently, so callback state needs no locking.
//!
//! Timers take priority over queued events: a due timer fires before the next
//! message is dispatched.

mod timer;

pub use timer::TimerId;

use crate::action::{Action, ActionClient, ActionError, ActionEvent, ActionServer, GoalRequest};
use crate::bus::{BusError, Context, Publisher, Sample, SampleQueue, SubscriptionEntry};
use crate::msg::Message;
use crate::params::{ParamError, ParameterType, ParameterValue, Parameters};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use timer::Timer;

pub(crate) type NodeId = u64;

/// Upper bound of a single blocking wait inside [`Node::spin`].
const SPIN_POLL: Duration = Duration::from_millis(100);

/// Node errors.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Invalid node name: {0:?}")]
    InvalidName(String),

    #[error("Invalid timer period: {0}")]
    InvalidPeriod(String),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Action(#[from] ActionError),
}

/// Identifier of a subscription created on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

/// Executor wake-up events.
pub(crate) enum Event {
    Message(SubscriptionId),
    Action(ActionEvent),
    GoalRequest(GoalRequest),
    Shutdown,
}

/// Callbacks invoked by a node's executor.
///
/// Every method has a no-op default.
pub trait NodeCallbacks {
    fn on_timer(&mut self, _node: &Node, _timer: TimerId) {}

    fn on_message(&mut self, _node: &Node, _subscription: SubscriptionId, _sample: Sample) {}

    /// Goal response, feedback or result for a goal this node sent.
    fn on_action_event(&mut self, _node: &Node, _event: ActionEvent) {}

    /// Goal addressed to an action server of this node.
    fn on_goal_request(&mut self, node: &Node, request: GoalRequest) {
        log::warn!(
            "[{}] no handler for goal {} on '{}', dropping it",
            node.name(),
            request.goal_id(),
            request.action_name()
        );
    }

    /// Runs exactly once, when the node shuts down.
    fn on_shutdown(&mut self, _node: &Node) {}
}

/// Requests shutdown of a spinning node from any thread.
#[derive(Clone)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
    waker: Sender<Event>,
}

impl ShutdownHandle {
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
        let _ = self.waker.send(Event::Shutdown);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

struct SubscriptionState {
    topic: String,
    queue: Arc<SampleQueue>,
    received: bool,
}

/// Convert a period in seconds into a timer period.
pub fn period_from_secs(secs: f64) -> Result<Duration, NodeError> {
    if !(secs.is_finite() && secs > 0.0) {
        return Err(NodeError::InvalidPeriod(format!("{} s", secs)));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| NodeError::InvalidPeriod(e.to_string()))
}

/// A named participant on the bus.
pub struct Node {
    id: NodeId,
    name: String,
    context: Context,
    parameters: Parameters,
    sender: Sender<Event>,
    receiver: Receiver<Event>,
    timers: Vec<Timer>,
    subscriptions: HashMap<SubscriptionId, SubscriptionState>,
    shutdown: ShutdownHandle,
    shut_down: bool,
}

impl Node {
    /// Create a node.
    ///
    /// Names follow ROS rules: ASCII letters, digits and `_`, not starting
    /// with a digit.
    pub fn new(context: &Context, name: &str) -> Result<Self, NodeError> {
        let valid = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(NodeError::InvalidName(name.to_string()));
        }

        let (sender, receiver) = channel::unbounded();
        let shutdown = ShutdownHandle {
            requested: Arc::new(AtomicBool::new(false)),
            waker: sender.clone(),
        };

        log::debug!("[{}] node created", name);
        Ok(Self {
            id: context.next_id(),
            name: name.to_string(),
            context: context.clone(),
            parameters: Parameters::default(),
            sender,
            receiver,
            timers: Vec::new(),
            subscriptions: HashMap::new(),
            shutdown,
            shut_down: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    /// Declare parameters and read their values from the context's store.
    pub fn declare_parameters(&mut self, declarations: &[(&str, ParameterType)]) -> Result<(), NodeError> {
        for &(name, ty) in declarations {
            let value = self
                .parameters
                .declare(self.context.parameters(), &self.name, name, ty)?;
            log::debug!("[{}] Got parameter {} with value {}", self.name, name, value);
        }
        Ok(())
    }

    pub fn get_f64(&self, name: &str) -> Result<f64, ParamError> {
        match self.parameters.get(name)? {
            ParameterValue::Double(v) => Ok(*v),
            _ => Err(wrong_type(name, ParameterType::Double)),
        }
    }

    pub fn get_i64(&self, name: &str) -> Result<i64, ParamError> {
        match self.parameters.get(name)? {
            ParameterValue::Integer(v) => Ok(*v),
            _ => Err(wrong_type(name, ParameterType::Integer)),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, ParamError> {
        match self.parameters.get(name)? {
            ParameterValue::Bool(v) => Ok(*v),
            _ => Err(wrong_type(name, ParameterType::Bool)),
        }
    }

    pub fn get_string(&self, name: &str) -> Result<String, ParamError> {
        match self.parameters.get(name)? {
            ParameterValue::String(v) => Ok(v.clone()),
            _ => Err(wrong_type(name, ParameterType::String)),
        }
    }

    pub fn get_string_array(&self, name: &str) -> Result<Vec<String>, ParamError> {
        match self.parameters.get(name)? {
            ParameterValue::StringArray(v) => Ok(v.clone()),
            _ => Err(wrong_type(name, ParameterType::StringArray)),
        }
    }

    // ========================================================================
    // Endpoints
    // ========================================================================

    pub fn create_publisher<M: Message>(&self, topic: &str) -> Result<Publisher<M>, NodeError> {
        let publisher = Publisher::new(&self.context, topic)?;
        log::debug!("[{}] publisher on '{}' ({})", self.name, topic, M::TYPE_NAME);
        Ok(publisher)
    }

    /// Subscribe to a topic with a keep-last queue of `depth` samples.
    pub fn create_subscription<M: Message>(
        &mut self,
        topic: &str,
        depth: usize,
    ) -> Result<SubscriptionId, NodeError> {
        self.create_raw_subscription(topic, M::TYPE_NAME, depth)
    }

    /// Subscribe to a topic by type name, without a static message type.
    pub fn create_raw_subscription(
        &mut self,
        topic: &str,
        type_name: &str,
        depth: usize,
    ) -> Result<SubscriptionId, NodeError> {
        self.context.register_topic(topic, type_name)?;

        let id = SubscriptionId(self.context.next_id());
        let queue = Arc::new(SampleQueue::new(depth));
        self.context.add_subscription(
            topic,
            SubscriptionEntry {
                id,
                node_id: self.id,
                queue: Arc::clone(&queue),
                waker: self.sender.clone(),
            },
        );
        self.subscriptions.insert(
            id,
            SubscriptionState {
                topic: topic.to_string(),
                queue,
                received: false,
            },
        );

        log::debug!("[{}] subscription on '{}' ({})", self.name, topic, type_name);
        Ok(id)
    }

    pub fn subscription_topic(&self, id: SubscriptionId) -> Option<&str> {
        self.subscriptions.get(&id).map(|s| s.topic.as_str())
    }

    /// Whether every subscription has received at least one sample.
    pub fn all_subscriptions_active(&self) -> bool {
        self.subscriptions.values().all(|s| s.received)
    }

    pub fn create_timer(&mut self, period: Duration) -> Result<TimerId, NodeError> {
        if period.is_zero() {
            return Err(NodeError::InvalidPeriod("zero".to_string()));
        }
        let id = TimerId(self.context.next_id());
        self.timers.push(Timer::new(id, period, Instant::now()));
        Ok(id)
    }

    pub fn create_action_client<A: Action>(&self, action_name: &str) -> ActionClient<A> {
        ActionClient::new(&self.context, action_name, self.sender.clone())
    }

    pub fn create_action_server<A: Action>(&self, action_name: &str) -> Result<ActionServer<A>, NodeError> {
        let server = ActionServer::new(&self.context, action_name, self.id, self.sender.clone())?;
        log::debug!("[{}] action server '{}' ({})", self.name, action_name, A::TYPE_NAME);
        Ok(server)
    }

    // ========================================================================
    // Executor
    // ========================================================================

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Dispatch at most one timer tick or event, waiting up to `timeout`.
    ///
    /// Returns `true` if a callback ran.
    pub fn spin_once<C: NodeCallbacks + ?Sized>(&mut self, callbacks: &mut C, timeout: Duration) -> bool {
        if self.shut_down {
            return false;
        }
        if self.fire_due_timer(callbacks) {
            return true;
        }

        let now = Instant::now();
        let deadline = self
            .timers
            .iter()
            .map(Timer::next_due)
            .min()
            .map_or(now + timeout, |due| due.min(now + timeout));

        match self.receiver.recv_deadline(deadline) {
            Ok(event) => self.dispatch(callbacks, event),
            Err(RecvTimeoutError::Timeout) => self.fire_due_timer(callbacks),
            Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Run until shutdown is requested, then run the shutdown callback.
    pub fn spin<C: NodeCallbacks + ?Sized>(&mut self, callbacks: &mut C) {
        log::info!("[{}] spinning", self.name);
        while !self.shutdown.is_requested() {
            self.spin_once(callbacks, SPIN_POLL);
        }
        self.shutdown(callbacks);
    }

    /// Shut the node down. Idempotent.
    pub fn shutdown<C: NodeCallbacks + ?Sized>(&mut self, callbacks: &mut C) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        log::info!("[{}] shutting down", self.name);
        callbacks.on_shutdown(self);
    }

    fn fire_due_timer<C: NodeCallbacks + ?Sized>(&mut self, callbacks: &mut C) -> bool {
        let now = Instant::now();
        let Some(idx) = timer::earliest_due(&self.timers, now) else {
            return false;
        };
        let timer = &mut self.timers[idx];
        timer.advance(now);
        let id = timer.id;
        callbacks.on_timer(self, id);
        true
    }

    fn dispatch<C: NodeCallbacks + ?Sized>(&mut self, callbacks: &mut C, event: Event) -> bool {
        match event {
            Event::Message(id) => {
                let Some(state) = self.subscriptions.get_mut(&id) else {
                    return false;
                };
                // Evicted by keep-last: the event outlived its sample
                let Some(sample) = state.queue.pop() else {
                    return false;
                };
                state.received = true;
                callbacks.on_message(self, id, sample);
                true
            }
            Event::Action(event) => {
                callbacks.on_action_event(self, event);
                true
            }
            Event::GoalRequest(request) => {
                callbacks.on_goal_request(self, request);
                true
            }
            Event::Shutdown => false,
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.context.remove_node(self.id);
    }
}

fn wrong_type(name: &str, expected: ParameterType) -> ParamError {
    ParamError::WrongType {
        name: name.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msg::{Gps, WindSensors};

    #[derive(Default)]
    struct Recorder {
        ticks: Vec<TimerId>,
        messages: Vec<(String, u64)>,
        shutdowns: usize,
    }

    impl NodeCallbacks for Recorder {
        fn on_timer(&mut self, _node: &Node, timer: TimerId) {
            self.ticks.push(timer);
        }

        fn on_message(&mut self, node: &Node, subscription: SubscriptionId, sample: Sample) {
            let topic = node.subscription_topic(subscription).unwrap_or_default();
            self.messages.push((topic.to_string(), sample.sequence_number));
        }

        fn on_shutdown(&mut self, _node: &Node) {
            self.shutdowns += 1;
        }
    }

    #[test]
    fn test_node_name_rules() {
        let context = Context::new();
        assert!(Node::new(&context, "physics_engine_node").is_ok());
        assert!(Node::new(&context, "_private").is_ok());
        assert!(Node::new(&context, "").is_err());
        assert!(Node::new(&context, "1node").is_err());
        assert!(Node::new(&context, "my-node").is_err());
    }

    #[test]
    fn test_subscription_activity() {
        let context = Context::new();
        let mut node = Node::new(&context, "listener").expect("node");
        assert!(node.all_subscriptions_active());

        node.create_subscription::<Gps>("gps", 10).expect("sub");
        node.create_subscription::<WindSensors>("wind_sensors", 10).expect("sub");
        assert!(!node.all_subscriptions_active());

        let gps = node.create_publisher::<Gps>("gps").expect("pub");
        gps.publish(&Gps::default()).expect("publish");

        let mut recorder = Recorder::default();
        assert!(node.spin_once(&mut recorder, Duration::from_millis(100)));
        assert_eq!(recorder.messages, vec![("gps".to_string(), 1)]);
        assert!(!node.all_subscriptions_active());

        let wind = node.create_publisher::<WindSensors>("wind_sensors").expect("pub");
        wind.publish(&WindSensors::default()).expect("publish");
        assert!(node.spin_once(&mut recorder, Duration::from_millis(100)));
        assert!(node.all_subscriptions_active());
    }

    #[test]
    fn test_keep_last_depth_drops_oldest() {
        let context = Context::new();
        let mut node = Node::new(&context, "listener").expect("node");
        node.create_subscription::<Gps>("gps", 2).expect("sub");
        let publisher = node.create_publisher::<Gps>("gps").expect("pub");

        for _ in 0..5 {
            publisher.publish(&Gps::default()).expect("publish");
        }

        let mut recorder = Recorder::default();
        while node.spin_once(&mut recorder, Duration::from_millis(10))
            || !node.receiver.is_empty()
        {}

        let seqs: Vec<u64> = recorder.messages.iter().map(|(_, s)| *s).collect();
        assert_eq!(seqs, vec![4, 5]);
    }

    #[test]
    fn test_period_from_secs() {
        assert_eq!(period_from_secs(0.5).expect("valid"), Duration::from_millis(500));
        assert!(period_from_secs(0.0).is_err());
        assert!(period_from_secs(-1.0).is_err());
        assert!(period_from_secs(f64::NAN).is_err());
    }

    #[test]
    fn test_zero_timer_period_rejected() {
        let context = Context::new();
        let mut node = Node::new(&context, "timed").expect("node");
        assert!(matches!(
            node.create_timer(Duration::ZERO),
            Err(NodeError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn test_shutdown_runs_once() {
        let context = Context::new();
        let mut node = Node::new(&context, "stopper").expect("node");
        let mut recorder = Recorder::default();

        node.shutdown_handle().request();
        node.spin(&mut recorder);
        node.shutdown(&mut recorder);

        assert_eq!(recorder.shutdowns, 1);
        assert!(node.is_shut_down());
        assert!(!node.spin_once(&mut recorder, Duration::from_millis(1)));
    }

    #[test]
    fn test_drop_removes_subscriptions() {
        let context = Context::new();
        {
            let mut node = Node::new(&context, "temporary").expect("node");
            node.create_subscription::<Gps>("gps", 1).expect("sub");
            assert_eq!(context.subscription_count("gps"), 1);
        }
        assert_eq!(context.subscription_count("gps"), 0);
    }
}
