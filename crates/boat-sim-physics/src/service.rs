// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Actuator service seam used by the coordinator.

use boat_sim_core::msg::{
    DesiredHeading, HelperHeading, RudderFeedback, RudderGoal, RudderResult, SailTrimTabFeedback,
    SailTrimTabGoal, SailTrimTabResult, SimRudderActuation, SimSailTrimTabActuation,
};
use boat_sim_core::{Action, ActionClient, ActionError, GoalId, Scalar};
use std::time::Duration;

/// An action whose goal, feedback and result each reduce to one scalar.
pub trait ScalarActuation: Action {
    fn goal(target: Scalar) -> Self::Goal;

    /// Current actuator angle reported in feedback.
    fn feedback_angle(feedback: &Self::Feedback) -> Scalar;

    /// Residual reported in the result.
    fn residual(result: &Self::Result) -> Scalar;
}

impl ScalarActuation for SimRudderActuation {
    fn goal(target: Scalar) -> RudderGoal {
        RudderGoal {
            desired_heading: DesiredHeading {
                heading: HelperHeading {
                    heading: target as f32,
                },
            },
        }
    }

    fn feedback_angle(feedback: &RudderFeedback) -> Scalar {
        feedback.rudder_angle
    }

    fn residual(result: &RudderResult) -> Scalar {
        result.remaining_angular_distance
    }
}

impl ScalarActuation for SimSailTrimTabActuation {
    fn goal(target: Scalar) -> SailTrimTabGoal {
        SailTrimTabGoal {
            desired_angular_position: target,
        }
    }

    fn feedback_angle(feedback: &SailTrimTabFeedback) -> Scalar {
        feedback.current_angular_position
    }

    fn residual(result: &SailTrimTabResult) -> Scalar {
        result.remaining_angular_distance
    }
}

/// The external actuator as seen by the coordinator.
pub trait ActuatorService {
    /// Block until the service is reachable, at most `timeout`.
    fn wait_for_server(&self, timeout: Duration) -> bool;

    /// Dispatch a goal. Responses arrive later through the node executor.
    fn send_goal(&self, target: Scalar) -> Result<GoalId, ActionError>;
}

impl<A: ScalarActuation> ActuatorService for ActionClient<A> {
    fn wait_for_server(&self, timeout: Duration) -> bool {
        ActionClient::wait_for_server(self, timeout)
    }

    fn send_goal(&self, target: Scalar) -> Result<GoalId, ActionError> {
        ActionClient::send_goal(self, &A::goal(target))
    }
}
