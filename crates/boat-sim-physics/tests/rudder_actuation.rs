// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end rudder actuation between the physics engine and the actuator.

use boat_sim_core::msg::{DesiredHeading, HelperHeading};
use boat_sim_core::{Context, Node, NodeCallbacks, ParameterStore, ParameterValue};
use boat_sim_physics::{
    ActuationEvent, ActuatorConfig, PhysicsEngineNode, RequestState, RudderActuatorNode,
};
use std::thread;
use std::time::{Duration, Instant};

fn context() -> Context {
    let mut store = ParameterStore::default();
    store.set("**", "pub_period_sec", ParameterValue::Double(0.05));
    Context::with_parameters(store)
}

fn publish_heading(context: &Context, heading: f32) {
    let planner = Node::new(context, "planner").expect("node");
    let publisher = planner
        .create_publisher::<DesiredHeading>("desired_heading")
        .expect("publisher");
    publisher
        .publish(&DesiredHeading {
            heading: HelperHeading { heading },
        })
        .expect("publish");
}

fn spin_until<C: NodeCallbacks>(node: &mut Node, callbacks: &mut C, mut done: impl FnMut(&C) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(callbacks) {
        assert!(Instant::now() < deadline, "condition not reached in time");
        node.spin_once(callbacks, Duration::from_millis(20));
    }
}

#[test]
fn test_goal_completes_with_actuator() {
    let context = context();

    let mut actuator_node = Node::new(&context, "rudder_actuator_node").expect("node");
    let config = ActuatorConfig {
        step_period_sec: 0.02,
        ..ActuatorConfig::default()
    };
    let mut actuator = RudderActuatorNode::new(&mut actuator_node, config).expect("actuator");
    let actuator_shutdown = actuator_node.shutdown_handle();
    let actuator_thread = thread::spawn(move || actuator_node.spin(&mut actuator));

    let mut engine_node = Node::new(&context, "physics_engine_node").expect("node");
    let mut engine = PhysicsEngineNode::new(&mut engine_node).expect("engine");
    let events = engine.rudder_mut().subscribe(64);

    publish_heading(&context, 0.2);
    spin_until(&mut engine_node, &mut engine, |e| e.state().desired_heading.is_some());

    engine.request_rudder_actuation(&engine_node);
    let handle = engine.rudder().outstanding().expect("dispatched");

    spin_until(&mut engine_node, &mut engine, |e| !e.rudder().is_busy());

    let request = engine.rudder().request(handle).expect("retained");
    assert_eq!(request.state, RequestState::Completed);
    let residual = request.result.expect("result");
    assert!(residual <= config.tolerance_rad);
    let last_angle = request.last_feedback_angle.expect("feedback");
    assert!((last_angle - 0.2).abs() <= config.tolerance_rad);
    assert_eq!(engine.state().rudder_angle, last_angle);

    let seen: Vec<ActuationEvent> = events.try_iter().collect();
    assert!(matches!(seen.first(), Some(ActuationEvent::Accepted { .. })));
    assert!(matches!(seen.last(), Some(ActuationEvent::Completed { .. })));
    assert!(seen
        .iter()
        .any(|e| matches!(e, ActuationEvent::Feedback { .. })));

    actuator_shutdown.request();
    actuator_thread.join().expect("join");
}

#[test]
fn test_goal_times_out_without_actuator() {
    let context = context();
    let mut engine_node = Node::new(&context, "physics_engine_node").expect("node");
    let mut engine = PhysicsEngineNode::new(&mut engine_node).expect("engine");

    publish_heading(&context, -0.2);
    spin_until(&mut engine_node, &mut engine, |e| e.state().desired_heading.is_some());

    let start = Instant::now();
    engine.request_rudder_actuation(&engine_node);
    assert!(start.elapsed() >= engine.rudder().timeout());

    let request = engine.rudder().history().last().expect("recorded");
    assert_eq!(request.state, RequestState::TimedOut);
    assert!(request.goal_id.is_none());
    assert!(!engine.rudder().is_busy());
}
