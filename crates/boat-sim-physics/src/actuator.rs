// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Simulated rudder actuator.
//!
//! Serves the rudder actuation action. An accepted goal moves the rudder
//! toward the desired heading (clamped to the mechanical limit) by at most
//! `max_step_rad` per step, reporting the angle after each step. The goal
//! finishes when the rudder is within `tolerance_rad` of its clamped target
//! or after `max_steps` steps. The reported residual is measured against the
//! requested heading, so an unreachable goal finishes with a non-zero residual.

use boat_sim_core::constants::action_clients;
use boat_sim_core::msg::{RudderFeedback, RudderResult, SimRudderActuation};
use boat_sim_core::node::period_from_secs;
use boat_sim_core::{
    ActionServer, GoalHandle, GoalRequest, Node, NodeCallbacks, NodeError, Scalar, TimerId,
};

/// Motion limits of the simulated rudder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorConfig {
    pub step_period_sec: f64,
    pub max_step_rad: Scalar,
    pub tolerance_rad: Scalar,
    /// Mechanical limit, symmetric around zero
    pub max_angle_rad: Scalar,
    pub max_steps: u32,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            step_period_sec: 0.1,
            max_step_rad: 0.05,
            tolerance_rad: 0.01,
            max_angle_rad: std::f64::consts::FRAC_PI_4,
            max_steps: 100,
        }
    }
}

struct ActiveGoal {
    handle: GoalHandle<SimRudderActuation>,
    /// Heading as requested by the client
    requested: Scalar,
    /// Requested heading clamped to the mechanical limit
    target: Scalar,
    steps: u32,
}

pub struct RudderActuatorNode {
    config: ActuatorConfig,
    server: ActionServer<SimRudderActuation>,
    step_timer: TimerId,
    rudder_angle: Scalar,
    active: Option<ActiveGoal>,
}

impl RudderActuatorNode {
    pub fn new(node: &mut Node, config: ActuatorConfig) -> Result<Self, NodeError> {
        let server = node.create_action_server::<SimRudderActuation>(action_clients::RUDDER_ACTUATION)?;
        let step_timer = node.create_timer(period_from_secs(config.step_period_sec)?)?;

        Ok(Self {
            config,
            server,
            step_timer,
            rudder_angle: 0.0,
            active: None,
        })
    }

    pub fn rudder_angle(&self) -> Scalar {
        self.rudder_angle
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Move the rudder one step toward the active goal.
    pub fn step(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let delta = (active.target - self.rudder_angle).clamp(-self.config.max_step_rad, self.config.max_step_rad);
        self.rudder_angle += delta;
        active.steps += 1;

        let reached = (active.target - self.rudder_angle).abs() <= self.config.tolerance_rad;
        let remaining = (active.requested - self.rudder_angle).abs();
        let feedback = RudderFeedback {
            rudder_angle: self.rudder_angle,
        };
        if let Err(e) = active.handle.publish_feedback(&feedback) {
            log::warn!("Dropping rudder goal {}: {}", active.handle.goal_id(), e);
            self.active = None;
            return;
        }

        if reached || active.steps >= self.config.max_steps {
            self.finish(remaining);
        }
    }

    fn finish(&mut self, remaining: Scalar) {
        let Some(active) = self.active.take() else {
            return;
        };
        let goal_id = active.handle.goal_id();
        let result = RudderResult {
            remaining_angular_distance: remaining,
        };
        match active.handle.succeed(&result) {
            Ok(()) => log::debug!(
                "Rudder goal {} finished after {} steps at {:.3} radians",
                goal_id,
                active.steps,
                self.rudder_angle
            ),
            Err(e) => log::debug!("Rudder goal {} result not delivered: {}", goal_id, e),
        }
    }
}

impl NodeCallbacks for RudderActuatorNode {
    fn on_timer(&mut self, _node: &Node, timer: TimerId) {
        if timer == self.step_timer {
            self.step();
        }
    }

    fn on_goal_request(&mut self, node: &Node, request: GoalRequest) {
        if !self.server.owns(&request) {
            return;
        }

        let goal = match self.server.decode_goal(&request) {
            Ok(goal) => goal,
            Err(e) => {
                log::warn!("[{}] rejecting undecodable goal {}: {}", node.name(), request.goal_id(), e);
                self.server.reject(request);
                return;
            }
        };

        let heading = f64::from(goal.desired_heading.heading.heading);
        if self.active.is_some() || !heading.is_finite() {
            log::warn!(
                "[{}] rejecting goal {} (heading {}, busy: {})",
                node.name(),
                request.goal_id(),
                heading,
                self.active.is_some()
            );
            self.server.reject(request);
            return;
        }

        let target = heading.clamp(-self.config.max_angle_rad, self.config.max_angle_rad);
        log::debug!("[{}] accepted goal {} toward {:.3} radians", node.name(), request.goal_id(), target);
        self.active = Some(ActiveGoal {
            handle: self.server.accept(request),
            requested: heading,
            target,
            steps: 0,
        });
    }

    fn on_shutdown(&mut self, _node: &Node) {
        if let Some(active) = &self.active {
            let remaining = (active.requested - self.rudder_angle).abs();
            self.finish(remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boat_sim_core::msg::{DesiredHeading, HelperHeading, RudderGoal};
    use boat_sim_core::{ActionEvent, Context, GoalEvent};
    use std::time::Duration;

    #[derive(Default)]
    struct Inbox {
        events: Vec<ActionEvent>,
    }

    impl NodeCallbacks for Inbox {
        fn on_action_event(&mut self, _node: &Node, event: ActionEvent) {
            self.events.push(event);
        }
    }

    fn goal(heading: f32) -> RudderGoal {
        RudderGoal {
            desired_heading: DesiredHeading {
                heading: HelperHeading { heading },
            },
        }
    }

    #[test]
    fn test_steps_toward_target() {
        let context = Context::new();
        let mut actuator_node = Node::new(&context, "rudder_actuator_node").expect("node");
        let config = ActuatorConfig {
            max_step_rad: 0.1,
            ..ActuatorConfig::default()
        };
        let mut actuator = RudderActuatorNode::new(&mut actuator_node, config).expect("actuator");

        let mut client_node = Node::new(&context, "client_node").expect("node");
        let client = client_node.create_action_client::<SimRudderActuation>("rudder_actuation");
        client.send_goal(&goal(0.25)).expect("send");

        let mut inbox = Inbox::default();
        // Deliver the goal request only; timers are driven by hand
        actuator_node.spin_once(&mut actuator, Duration::from_millis(50));
        assert!(actuator.is_busy());

        while actuator.is_busy() {
            actuator.step();
        }
        assert!((actuator.rudder_angle() - 0.25).abs() <= 0.01);

        while client_node.spin_once(&mut inbox, Duration::from_millis(10)) {}
        let decoded: Vec<GoalEvent<SimRudderActuation>> = inbox
            .events
            .iter()
            .filter_map(|e| client.decode(e))
            .map(|e| e.expect("decode"))
            .collect();

        assert!(matches!(decoded[0], GoalEvent::Response { accepted: true, .. }));
        let angles: Vec<f64> = decoded
            .iter()
            .filter_map(|e| match e {
                GoalEvent::Feedback { feedback, .. } => Some(feedback.rudder_angle),
                _ => None,
            })
            .collect();
        assert_eq!(angles.len(), 3);
        assert!(matches!(decoded.last(), Some(GoalEvent::Result { .. })));
    }

    #[test]
    fn test_target_is_clamped_and_steps_bounded() {
        let context = Context::new();
        let mut actuator_node = Node::new(&context, "rudder_actuator_node").expect("node");
        let config = ActuatorConfig {
            max_step_rad: 0.1,
            max_steps: 3,
            ..ActuatorConfig::default()
        };
        let mut actuator = RudderActuatorNode::new(&mut actuator_node, config).expect("actuator");

        let client_node = Node::new(&context, "client_node").expect("node");
        let client = client_node.create_action_client::<SimRudderActuation>("rudder_actuation");
        client.send_goal(&goal(3.0)).expect("send");
        actuator_node.spin_once(&mut actuator, Duration::from_millis(50));

        for _ in 0..10 {
            actuator.step();
        }
        assert!(!actuator.is_busy());
        assert!((actuator.rudder_angle() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_unreachable_heading_reports_residual() {
        let context = Context::new();
        let mut actuator_node = Node::new(&context, "rudder_actuator_node").expect("node");
        let config = ActuatorConfig {
            max_step_rad: 0.1,
            ..ActuatorConfig::default()
        };
        let mut actuator = RudderActuatorNode::new(&mut actuator_node, config).expect("actuator");

        let mut client_node = Node::new(&context, "client_node").expect("node");
        let client = client_node.create_action_client::<SimRudderActuation>("rudder_actuation");
        client.send_goal(&goal(3.0)).expect("send");
        actuator_node.spin_once(&mut actuator, Duration::from_millis(50));

        while actuator.is_busy() {
            actuator.step();
        }
        let max_angle = config.max_angle_rad;
        assert!((actuator.rudder_angle() - max_angle).abs() <= config.tolerance_rad);

        let mut inbox = Inbox::default();
        while client_node.spin_once(&mut inbox, Duration::from_millis(10)) {}
        let residual = inbox
            .events
            .iter()
            .filter_map(|e| client.decode(e))
            .map(|e| e.expect("decode"))
            .find_map(|e| match e {
                GoalEvent::Result { result, .. } => Some(result.remaining_angular_distance),
                _ => None,
            })
            .expect("result");
        assert!((residual - (3.0 - actuator.rudder_angle())).abs() < 1e-6);
        assert!(residual > 2.0);
    }

    #[test]
    fn test_rejects_non_finite_and_busy() {
        let context = Context::new();
        let mut actuator_node = Node::new(&context, "rudder_actuator_node").expect("node");
        let mut actuator =
            RudderActuatorNode::new(&mut actuator_node, ActuatorConfig::default()).expect("actuator");

        let mut client_node = Node::new(&context, "client_node").expect("node");
        let client = client_node.create_action_client::<SimRudderActuation>("rudder_actuation");
        client.send_goal(&goal(f32::NAN)).expect("send");
        client.send_goal(&goal(0.2)).expect("send");
        client.send_goal(&goal(0.3)).expect("send");
        for _ in 0..3 {
            actuator_node.spin_once(&mut actuator, Duration::from_millis(50));
        }

        let mut inbox = Inbox::default();
        while client_node.spin_once(&mut inbox, Duration::from_millis(10)) {}
        let accepted: Vec<bool> = inbox
            .events
            .iter()
            .filter_map(|e| match e {
                ActionEvent::GoalResponse { accepted, .. } => Some(*accepted),
                _ => None,
            })
            .collect();
        assert_eq!(accepted, vec![false, true, false]);
    }
}
