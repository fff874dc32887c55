// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mutable state of the physics engine node.

use boat_sim_core::msg::{DesiredHeading, Time};
use boat_sim_core::Scalar;

#[derive(Debug, Clone, Default)]
pub struct SimulationState {
    /// Number of completed publish ticks (wraps)
    pub publish_counter: u64,

    /// Last rudder angle reported by the actuator (radians)
    pub rudder_angle: Scalar,

    /// Last desired heading received
    pub desired_heading: Option<DesiredHeading>,
}

impl SimulationState {
    /// Simulated time of the current publish tick.
    pub fn stamp(&self, pub_period_sec: f64) -> Time {
        Time::from_secs_f64(pub_period_sec * self.publish_counter as f64)
    }

    pub fn advance_counter(&mut self) {
        self.publish_counter = self.publish_counter.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_follows_counter() {
        let mut state = SimulationState::default();
        assert_eq!(state.stamp(0.5), Time::default());

        for _ in 0..5 {
            state.advance_counter();
        }
        let stamp = state.stamp(0.5);
        assert_eq!(stamp.sec, 2);
        assert_eq!(stamp.nanosec, 500_000_000);
    }

    #[test]
    fn test_counter_wraps() {
        let mut state = SimulationState {
            publish_counter: u64::MAX,
            ..SimulationState::default()
        };
        state.advance_counter();
        assert_eq!(state.publish_counter, 0);
    }
}
