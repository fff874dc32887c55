// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Boat simulator interface messages.

use super::geometry::{Accel, Header, Pose, Twist, Wrench};
use super::Message;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HelperLatLon {
    pub latitude: f32,
    pub longitude: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HelperSpeed {
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HelperHeading {
    pub heading: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HelperKinematics {
    pub pose: Pose,
    pub velocity: Twist,
    pub acceleration: Accel,
    pub net_wrench: Wrench,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Gps {
    pub lat_lon: HelperLatLon,
    pub speed: HelperSpeed,
    pub heading: HelperHeading,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindSensor {
    pub speed: HelperSpeed,
    pub direction: i16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindSensors {
    pub wind_sensors: Vec<WindSensor>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredHeading {
    pub heading: HelperHeading,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimWorldState {
    pub header: Header,
    pub global_gps: Gps,
    pub global_reference_kinematics: HelperKinematics,
    pub relative_reference_kinematics: HelperKinematics,
}

macro_rules! register_messages {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Message for $ty {
                const TYPE_NAME: &'static str = $name;
            }
        )*

        /// Type names of every registered simulator message.
        pub const MESSAGE_TYPES: &[&str] = &[$($name),*];
    };
}

register_messages! {
    HelperLatLon => "HelperLatLon",
    HelperSpeed => "HelperSpeed",
    HelperHeading => "HelperHeading",
    HelperKinematics => "HelperKinematics",
    Gps => "GPS",
    WindSensor => "WindSensor",
    WindSensors => "WindSensors",
    DesiredHeading => "DesiredHeading",
    SimWorldState => "SimWorldState",
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msg::{decode, encode};

    #[test]
    fn test_type_names() {
        assert_eq!(Gps::TYPE_NAME, "GPS");
        assert_eq!(SimWorldState::TYPE_NAME, "SimWorldState");
        assert_eq!(MESSAGE_TYPES.len(), 9);
    }

    #[test]
    fn test_sim_world_state_codec() {
        let mut state = SimWorldState::default();
        state.header.frame_id = "7".into();
        state.global_gps.lat_lon.latitude = 49.26;

        let payload = encode(&state).expect("encode");
        let decoded: SimWorldState = decode(&payload).expect("decode");

        assert_eq!(decoded.header.frame_id, "7");
        assert_eq!(decoded.global_gps.lat_lon.latitude, 49.26);
        assert_eq!(decoded.global_reference_kinematics.pose.orientation.w, 1.0);
    }
}
