// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Names, periods and timeouts shared by the simulator nodes.

/// Default history depth for simulator publishers and subscriptions.
pub const QOS_DEPTH: usize = 10;

/// Period between two rudder actuation goal requests.
pub const RUDDER_ACTUATION_REQUEST_PERIOD_SEC: f64 = 2.0;

/// Bounded wait for an action server before a goal is dispatched.
pub const ACTION_SEND_GOAL_TIMEOUT_SEC: f64 = 1.0;

/// Launcher flag that turns the data collection node on.
pub const DATA_COLLECTION_CLI_ARG_NAME: &str = "--enable-data-collection";

/// Node names (also the section keys in the globals file).
pub mod nodes {
    pub const PHYSICS_ENGINE: &str = "physics_engine_node";
    pub const DATA_COLLECTION: &str = "data_collection_node";
    pub const RUDDER_ACTUATOR: &str = "rudder_actuator_node";
}

/// Topics the physics engine subscribes to.
pub mod physics_engine_subscriptions {
    pub const DESIRED_HEADING: &str = "desired_heading";
}

/// Topics the physics engine publishes.
pub mod physics_engine_publishers {
    pub const GPS: &str = "gps";
    pub const WIND_SENSORS: &str = "wind_sensors";
    pub const KINEMATICS: &str = "mock_kinematics";
}

/// Action names.
pub mod action_clients {
    pub const RUDDER_ACTUATION: &str = "rudder_actuation";
}
