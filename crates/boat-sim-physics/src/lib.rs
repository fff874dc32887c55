// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Boat simulator physics engine node
//!
//! - [`coordinator`]: actuation request coordinator (goal lifecycle tracking)
//! - [`engine`]: physics engine node publishing simulated sensor data
//! - [`actuator`]: simulated rudder actuator serving rudder actuation goals
//!
//! # Running the workflow
//!
//! ```rust,no_run
//! use boat_sim_core::{Context, Node, ParameterStore};
//! use boat_sim_physics::{ActuatorConfig, PhysicsEngineNode, RudderActuatorNode};
//!
//! let params = ParameterStore::from_file("config/globals.yaml")?;
//! let context = Context::with_parameters(params);
//!
//! let mut actuator_node = Node::new(&context, "rudder_actuator_node")?;
//! let mut actuator = RudderActuatorNode::new(&mut actuator_node, ActuatorConfig::default())?;
//! std::thread::spawn(move || actuator_node.spin(&mut actuator));
//!
//! let mut engine_node = Node::new(&context, "physics_engine_node")?;
//! let mut engine = PhysicsEngineNode::new(&mut engine_node)?;
//! engine_node.spin(&mut engine);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod actuator;
pub mod coordinator;
pub mod engine;
pub mod service;
pub mod state;

pub use actuator::{ActuatorConfig, RudderActuatorNode};
pub use coordinator::{
    ActuationCoordinator, ActuationError, ActuationEvent, ActuationRequest, RequestHandle,
    RequestState,
};
pub use engine::PhysicsEngineNode;
pub use service::{ActuatorService, ScalarActuation};
pub use state::SimulationState;
