// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Actuation actions served by the low level control nodes.

use super::interfaces::DesiredHeading;
use crate::action::Action;
use serde::{Deserialize, Serialize};

/// Rudder actuation: steer the rudder toward a desired heading.
#[derive(Debug, Clone, Copy)]
pub struct SimRudderActuation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RudderGoal {
    pub desired_heading: DesiredHeading,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RudderFeedback {
    /// Current rudder angle (radians)
    pub rudder_angle: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RudderResult {
    pub remaining_angular_distance: f64,
}

impl Action for SimRudderActuation {
    const TYPE_NAME: &'static str = "SimRudderActuation";
    type Goal = RudderGoal;
    type Feedback = RudderFeedback;
    type Result = RudderResult;
}

/// Sail trim tab actuation: move the trim tab to an angular position.
#[derive(Debug, Clone, Copy)]
pub struct SimSailTrimTabActuation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SailTrimTabGoal {
    pub desired_angular_position: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SailTrimTabFeedback {
    pub current_angular_position: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SailTrimTabResult {
    pub remaining_angular_distance: f64,
}

impl Action for SimSailTrimTabActuation {
    const TYPE_NAME: &'static str = "SimSailTrimTabActuation";
    type Goal = SailTrimTabGoal;
    type Feedback = SailTrimTabFeedback;
    type Result = SailTrimTabResult;
}
