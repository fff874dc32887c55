// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process publish/subscribe bus.
//!
//! A [`Context`] is shared by every node of the process. It owns:
//! - the topic registry (topic -> type name, subscriptions)
//! - the action server registry
//! - the parameter store loaded at startup
//!
//! Publishing encodes the message once, pushes the payload into the keep-last
//! queue of every subscription on the topic, then wakes the owning node's
//! executor. Callbacks therefore never run on the publisher's thread.
//!
//! # Topic Types
//!
//! The first endpoint created on a topic fixes its type name. Any later
//! publisher or subscription with another type is refused with
//! [`BusError::TypeMismatch`].

mod error;
mod queue;

pub use error::BusError;
pub(crate) use queue::SampleQueue;

use crate::action::ActionServerEntry;
use crate::msg::{self, Message};
use crate::node::{Event, NodeId, SubscriptionId};
use crate::params::ParameterStore;
use crossbeam::channel::Sender;
use dashmap::DashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// A message received from the bus.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Topic name.
    pub topic: String,

    /// Registered type name of the payload.
    pub type_name: String,

    /// Publisher sequence number (starts at 1).
    pub sequence_number: u64,

    /// Publish time in nanoseconds since the Unix epoch.
    pub timestamp_nanos: u64,

    /// Encoded payload.
    pub payload: Arc<[u8]>,
}

impl Sample {
    /// Decode the payload as `M`.
    pub fn decode<M: Message>(&self) -> Result<M, BusError> {
        if self.type_name != M::TYPE_NAME {
            return Err(BusError::TypeMismatch {
                topic: self.topic.clone(),
                registered: self.type_name.clone(),
                requested: M::TYPE_NAME.to_string(),
            });
        }
        Ok(msg::decode(&self.payload)?)
    }
}

pub(crate) struct SubscriptionEntry {
    pub(crate) id: SubscriptionId,
    pub(crate) node_id: NodeId,
    pub(crate) queue: Arc<SampleQueue>,
    pub(crate) waker: Sender<Event>,
}

struct ContextInner {
    topic_types: DashMap<String, String>,
    subscriptions: DashMap<String, Vec<SubscriptionEntry>>,
    action_servers: DashMap<String, ActionServerEntry>,
    parameters: ParameterStore,
    next_id: AtomicU64,
}

/// Process-wide bus shared by all nodes.
///
/// Cheap to clone (reference counted).
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// Create a context with no parameters.
    pub fn new() -> Self {
        Self::with_parameters(ParameterStore::default())
    }

    /// Create a context whose nodes read their parameters from `parameters`.
    pub fn with_parameters(parameters: ParameterStore) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                topic_types: DashMap::new(),
                subscriptions: DashMap::new(),
                action_servers: DashMap::new(),
                parameters,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Parameter store of this context.
    pub fn parameters(&self) -> &ParameterStore {
        &self.inner.parameters
    }

    /// Wall clock in nanoseconds since the Unix epoch.
    pub fn now_nanos() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }

    /// Registered type name of a topic, if any endpoint exists on it.
    pub fn topic_type(&self, topic: &str) -> Option<String> {
        self.inner.topic_types.get(topic).map(|t| t.value().clone())
    }

    /// Number of live subscriptions on a topic.
    pub fn subscription_count(&self, topic: &str) -> usize {
        self.inner
            .subscriptions
            .get(topic)
            .map(|subs| subs.len())
            .unwrap_or(0)
    }

    /// Whether an action server is registered under `name`.
    pub fn has_action_server(&self, name: &str) -> bool {
        self.inner.action_servers.contains_key(name)
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Fix the topic type on first use, refuse a different type afterwards.
    pub(crate) fn register_topic(&self, topic: &str, type_name: &str) -> Result<(), BusError> {
        if topic.is_empty() || topic.chars().any(char::is_whitespace) {
            return Err(BusError::InvalidTopic(topic.to_string()));
        }

        let registered = self
            .inner
            .topic_types
            .entry(topic.to_string())
            .or_insert_with(|| type_name.to_string());

        if registered.value() != type_name {
            return Err(BusError::TypeMismatch {
                topic: topic.to_string(),
                registered: registered.value().clone(),
                requested: type_name.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn add_subscription(&self, topic: &str, entry: SubscriptionEntry) {
        self.inner
            .subscriptions
            .entry(topic.to_string())
            .or_default()
            .push(entry);
    }

    /// Push a payload to every subscription on `topic`.
    ///
    /// Returns the number of subscriptions reached.
    pub(crate) fn deliver(&self, topic: &str, type_name: &str, sequence_number: u64, payload: Arc<[u8]>) -> usize {
        let Some(entries) = self.inner.subscriptions.get(topic) else {
            return 0;
        };

        let timestamp_nanos = Self::now_nanos();
        for entry in entries.iter() {
            let sample = Sample {
                topic: topic.to_string(),
                type_name: type_name.to_string(),
                sequence_number,
                timestamp_nanos,
                payload: Arc::clone(&payload),
            };
            if entry.queue.push(sample) {
                log::trace!(
                    "[bus] queue full on '{}' (depth {}), dropped oldest sample",
                    topic,
                    entry.queue.depth()
                );
            }
            // Executor may already be gone during shutdown
            let _ = entry.waker.send(Event::Message(entry.id));
        }
        entries.len()
    }

    pub(crate) fn register_action_server(&self, name: &str, entry: ActionServerEntry) -> bool {
        match self.inner.action_servers.entry(name.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(entry);
                log::debug!("[bus] registered action server '{}'", name);
                true
            }
        }
    }

    pub(crate) fn action_server(&self, name: &str) -> Option<ActionServerEntry> {
        self.inner.action_servers.get(name).map(|e| e.value().clone())
    }

    pub(crate) fn unregister_action_server(&self, name: &str, node_id: NodeId) {
        if self
            .inner
            .action_servers
            .remove_if(name, |_, entry| entry.node_id == node_id)
            .is_some()
        {
            log::debug!("[bus] unregistered action server '{}'", name);
        }
    }

    /// Drop every subscription owned by a node.
    pub(crate) fn remove_node(&self, node_id: NodeId) {
        for mut subs in self.inner.subscriptions.iter_mut() {
            subs.retain(|entry| entry.node_id != node_id);
        }
        self.inner.subscriptions.retain(|_, subs| !subs.is_empty());
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Typed publisher for one topic.
pub struct Publisher<M: Message> {
    context: Context,
    topic: String,
    sequence: AtomicU64,
    _marker: PhantomData<fn(M)>,
}

impl<M: Message> Publisher<M> {
    pub(crate) fn new(context: &Context, topic: &str) -> Result<Self, BusError> {
        context.register_topic(topic, M::TYPE_NAME)?;
        Ok(Self {
            context: context.clone(),
            topic: topic.to_string(),
            sequence: AtomicU64::new(1),
            _marker: PhantomData,
        })
    }

    /// Publish a message.
    ///
    /// Returns the number of subscriptions the message was delivered to.
    pub fn publish(&self, msg: &M) -> Result<usize, BusError> {
        let payload: Arc<[u8]> = Arc::from(msg::encode(msg)?);
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        Ok(self.context.deliver(&self.topic, M::TYPE_NAME, seq, payload))
    }

    /// Topic name.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msg::{Gps, WindSensors};

    #[test]
    fn test_topic_type_is_fixed_by_first_endpoint() {
        let context = Context::new();
        context.register_topic("gps", "GPS").expect("register");
        context.register_topic("gps", "GPS").expect("same type again");

        let err = context
            .register_topic("gps", "WindSensors")
            .expect_err("different type");
        assert!(matches!(err, BusError::TypeMismatch { .. }));
        assert_eq!(context.topic_type("gps").as_deref(), Some("GPS"));
    }

    #[test]
    fn test_invalid_topic_name() {
        let context = Context::new();
        assert!(matches!(
            context.register_topic("", "GPS"),
            Err(BusError::InvalidTopic(_))
        ));
        assert!(matches!(
            context.register_topic("wind sensors", "WindSensors"),
            Err(BusError::InvalidTopic(_))
        ));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let context = Context::new();
        let publisher = Publisher::<Gps>::new(&context, "gps").expect("publisher");
        assert_eq!(publisher.publish(&Gps::default()).expect("publish"), 0);
        assert_eq!(publisher.topic(), "gps");
    }

    #[test]
    fn test_publisher_type_mismatch() {
        let context = Context::new();
        let _gps = Publisher::<Gps>::new(&context, "gps").expect("publisher");
        assert!(Publisher::<WindSensors>::new(&context, "gps").is_err());
    }

    #[test]
    fn test_sample_decode_checks_type() {
        let sample = Sample {
            topic: "gps".into(),
            type_name: "GPS".into(),
            sequence_number: 1,
            timestamp_nanos: 0,
            payload: Arc::from(msg::encode(&Gps::default()).expect("encode")),
        };

        assert!(sample.decode::<Gps>().is_ok());
        assert!(matches!(
            sample.decode::<WindSensors>(),
            Err(BusError::TypeMismatch { .. })
        ));
    }
}
