// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Physics engine node.
//!
//! Publishes simulated sensor and kinematics data every `pub_period_sec` and
//! periodically asks the rudder actuator to steer toward the last desired
//! heading. The physics itself is not modelled: every published value is zero.

use crate::coordinator::{ActuationCoordinator, ActuationError, ActuationEvent, RequestHandle};
use crate::state::SimulationState;
use boat_sim_core::constants::{
    action_clients, physics_engine_publishers, physics_engine_subscriptions,
    ACTION_SEND_GOAL_TIMEOUT_SEC, QOS_DEPTH, RUDDER_ACTUATION_REQUEST_PERIOD_SEC,
};
use boat_sim_core::msg::{DesiredHeading, Gps, SimRudderActuation, SimWorldState, WindSensor, WindSensors};
use boat_sim_core::node::period_from_secs;
use boat_sim_core::{
    ActionClient, ActionEvent, BusError, Node, NodeCallbacks, NodeError, ParameterType, Publisher,
    Sample, SubscriptionId, TimerId,
};
use std::time::Instant;

/// Number of wind sensors on the boat.
const WIND_SENSOR_COUNT: usize = 2;

type RudderCoordinator = ActuationCoordinator<ActionClient<SimRudderActuation>>;

pub struct PhysicsEngineNode {
    pub_period_sec: f64,
    gps_pub: Publisher<Gps>,
    wind_sensors_pub: Publisher<WindSensors>,
    kinematics_pub: Publisher<SimWorldState>,
    desired_heading_sub: SubscriptionId,
    publish_timer: TimerId,
    rudder_timer: TimerId,
    rudder: RudderCoordinator,
    state: SimulationState,
}

impl PhysicsEngineNode {
    /// Declare parameters and create every endpoint on `node`.
    pub fn new(node: &mut Node) -> Result<Self, NodeError> {
        log::debug!("[{}] initializing node", node.name());

        node.declare_parameters(&[("pub_period_sec", ParameterType::Double)])?;
        let pub_period_sec = node.get_f64("pub_period_sec")?;
        let publish_period = period_from_secs(pub_period_sec)?;

        let desired_heading_sub = node.create_subscription::<DesiredHeading>(
            physics_engine_subscriptions::DESIRED_HEADING,
            QOS_DEPTH,
        )?;

        let gps_pub = node.create_publisher(physics_engine_publishers::GPS)?;
        let wind_sensors_pub = node.create_publisher(physics_engine_publishers::WIND_SENSORS)?;
        let kinematics_pub = node.create_publisher(physics_engine_publishers::KINEMATICS)?;

        let rudder = ActuationCoordinator::new(
            action_clients::RUDDER_ACTUATION,
            node.create_action_client::<SimRudderActuation>(action_clients::RUDDER_ACTUATION),
            period_from_secs(ACTION_SEND_GOAL_TIMEOUT_SEC)?,
        );

        let publish_timer = node.create_timer(publish_period)?;
        let rudder_timer = node.create_timer(period_from_secs(RUDDER_ACTUATION_REQUEST_PERIOD_SEC)?)?;

        log::debug!("[{}] node initialization complete, starting execution", node.name());
        Ok(Self {
            pub_period_sec,
            gps_pub,
            wind_sensors_pub,
            kinematics_pub,
            desired_heading_sub,
            publish_timer,
            rudder_timer,
            rudder,
            state: SimulationState::default(),
        })
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn rudder(&self) -> &RudderCoordinator {
        &self.rudder
    }

    pub fn rudder_mut(&mut self) -> &mut RudderCoordinator {
        &mut self.rudder
    }

    /// Publish one round of sensor and kinematics data.
    pub fn publish(&mut self) -> Result<(), BusError> {
        log::info!("Publishing simulated sensor and kinematics data");

        let gps = Gps::default();
        self.gps_pub.publish(&gps)?;
        log::debug!("Publishing to {}: {:?}", self.gps_pub.topic(), gps);

        let wind_sensors = WindSensors {
            wind_sensors: vec![WindSensor::default(); WIND_SENSOR_COUNT],
        };
        self.wind_sensors_pub.publish(&wind_sensors)?;
        log::debug!("Publishing to {}: {:?}", self.wind_sensors_pub.topic(), wind_sensors);

        self.kinematics_pub.publish(&self.kinematics())?;
        log::debug!("Publishing to {}", self.kinematics_pub.topic());

        self.state.advance_counter();
        Ok(())
    }

    /// World state for the current tick. Identity orientation, zero motion.
    fn kinematics(&self) -> SimWorldState {
        let mut msg = SimWorldState::default();
        msg.header.stamp = self.state.stamp(self.pub_period_sec);
        msg.header.frame_id = self.state.publish_counter.to_string();
        msg
    }

    /// Ask the rudder actuator to steer toward the last desired heading.
    ///
    /// Returns the handle of the dispatched request, if one was dispatched.
    pub fn request_rudder_actuation(&mut self, node: &Node) -> Option<RequestHandle> {
        if !node.all_subscriptions_active() {
            log::debug!("[{}] waiting for every subscription to receive data", node.name());
            return None;
        }
        let Some(desired) = self.state.desired_heading else {
            log::debug!("[{}] no desired heading received yet", node.name());
            return None;
        };

        self.rudder.expire_stale(Instant::now());
        match self.rudder.submit_goal(f64::from(desired.heading.heading)) {
            Ok(handle) => Some(handle),
            Err(ActuationError::Busy(outstanding)) => {
                log::debug!("[{}] rudder request {} still in flight", node.name(), outstanding);
                None
            }
            // Logged at warn by the coordinator; the next tick tries again
            Err(ActuationError::Unavailable { .. } | ActuationError::Dispatch { .. }) => None,
        }
    }

    fn on_rudder_event(&mut self, event: ActionEvent) {
        let decoded = match self.rudder.service().decode(&event) {
            Some(Ok(decoded)) => decoded,
            Some(Err(e)) => {
                log::warn!("Failed to decode rudder actuation event: {}", e);
                return;
            }
            None => return,
        };

        match self.rudder.handle_goal_event(&decoded) {
            Some(ActuationEvent::Feedback { angle, .. }) => {
                self.state.rudder_angle = angle;
                log::debug!(
                    "Rudder actuation action reported a rudder angle of {}",
                    self.state.rudder_angle
                );
            }
            Some(ActuationEvent::Completed { residual, .. }) => {
                log::debug!(
                    "Rudder actuation action finished with a heading residual of {:.2} radians and final rudder angle of {} radians",
                    residual,
                    self.state.rudder_angle
                );
            }
            _ => {}
        }
    }
}

impl NodeCallbacks for PhysicsEngineNode {
    fn on_timer(&mut self, node: &Node, timer: TimerId) {
        if timer == self.publish_timer {
            if let Err(e) = self.publish() {
                log::error!("[{}] publish failed: {}", node.name(), e);
            }
        } else if timer == self.rudder_timer {
            self.request_rudder_actuation(node);
        }
    }

    fn on_message(&mut self, node: &Node, subscription: SubscriptionId, sample: Sample) {
        if subscription != self.desired_heading_sub {
            return;
        }
        match sample.decode::<DesiredHeading>() {
            Ok(msg) => {
                log::info!("Received data from {}: {:?}", sample.topic, msg);
                self.state.desired_heading = Some(msg);
            }
            Err(e) => log::warn!("[{}] dropping desired heading: {}", node.name(), e),
        }
    }

    fn on_action_event(&mut self, _node: &Node, event: ActionEvent) {
        self.on_rudder_event(event);
    }
}
