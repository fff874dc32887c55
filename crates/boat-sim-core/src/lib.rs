// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Boat simulator middleware core
//!
//! Small ROS-style runtime shared by the simulator nodes:
//! - [`bus`]: in-process topics with keep-last queues
//! - [`node`]: single-threaded cooperative executor (timers, subscriptions, actions)
//! - [`action`]: goal / feedback / result protocol between nodes
//! - [`params`]: typed node parameters loaded from a YAML globals file
//! - [`msg`]: simulator message types
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use boat_sim_core::{Context, Node, NodeCallbacks, SubscriptionId, Sample};
//! use boat_sim_core::msg::Gps;
//! use std::time::Duration;
//!
//! struct Echo;
//!
//! impl NodeCallbacks for Echo {
//!     fn on_message(&mut self, _node: &Node, _id: SubscriptionId, sample: Sample) {
//!         println!("{} -> {} bytes", sample.topic, sample.payload.len());
//!     }
//! }
//!
//! let context = Context::new();
//! let mut node = Node::new(&context, "echo_node")?;
//! node.create_subscription::<Gps>("gps", 10)?;
//! let publisher = node.create_publisher::<Gps>("gps")?;
//! publisher.publish(&Gps::default())?;
//! node.spin_once(&mut Echo, Duration::from_millis(10));
//! # Ok::<(), boat_sim_core::NodeError>(())
//! ```

pub mod action;
pub mod bus;
pub mod constants;
pub mod msg;
pub mod node;
pub mod params;

pub use action::{
    Action, ActionClient, ActionError, ActionEvent, ActionServer, GoalEvent, GoalHandle, GoalId,
    GoalRequest,
};
pub use bus::{BusError, Context, Publisher, Sample};
pub use msg::Message;
pub use node::{Node, NodeCallbacks, NodeError, ShutdownHandle, SubscriptionId, TimerId};
pub use params::{ParamError, ParameterStore, ParameterType, ParameterValue};

/// Scalar quantity used for angles, headings and residuals (radians).
pub type Scalar = f64;
