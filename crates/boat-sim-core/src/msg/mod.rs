// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Simulator message types and payload codec.
//!
//! Payloads travel on the bus as opaque bytes. The codec is JSON, which keeps
//! recorded payloads readable by the data collection node without a schema.

pub mod actions;
pub mod geometry;
pub mod interfaces;

pub use actions::{
    RudderFeedback, RudderGoal, RudderResult, SailTrimTabFeedback, SailTrimTabGoal,
    SailTrimTabResult, SimRudderActuation, SimSailTrimTabActuation,
};
pub use geometry::{Accel, Header, Point, Pose, Quaternion, Time, Twist, Vector3, Wrench};
pub use interfaces::{
    DesiredHeading, Gps, HelperHeading, HelperKinematics, HelperLatLon, HelperSpeed,
    SimWorldState, WindSensor, WindSensors, MESSAGE_TYPES,
};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serialization format tag stored alongside recorded payloads.
pub const SERIALIZATION_FORMAT: &str = "json";

/// A type that can be published on a topic.
pub trait Message: Serialize + DeserializeOwned + Send + 'static {
    /// Registered type name (e.g. `"GPS"`).
    const TYPE_NAME: &'static str;
}

/// Encode a message into a bus payload.
pub fn encode<M: Message>(msg: &M) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(msg)
}

/// Decode a bus payload into a message.
pub fn decode<M: Message>(payload: &[u8]) -> Result<M, serde_json::Error> {
    serde_json::from_slice(payload)
}

/// Decode a payload of any registered type into a generic JSON value.
pub fn decode_value(payload: &[u8]) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::from_slice(payload)
}

/// Check whether a type name is one of the registered simulator messages.
pub fn is_known_type(type_name: &str) -> bool {
    MESSAGE_TYPES.contains(&type_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_types() {
        assert!(is_known_type("GPS"));
        assert!(is_known_type("WindSensors"));
        assert!(is_known_type("SimWorldState"));
        assert!(!is_known_type("Temperature"));
        assert!(!is_known_type("Gps"));
    }

    #[test]
    fn test_decode_value_keeps_field_order() {
        let mut gps = Gps::default();
        gps.speed.speed = 3.5;

        let payload = encode(&gps).expect("encode");
        let value = decode_value(&payload).expect("decode");
        let keys: Vec<&String> = value.as_object().expect("object").keys().collect();

        assert_eq!(keys, ["lat_lon", "speed", "heading"]);
        assert_eq!(value["speed"]["speed"], 3.5);
    }
}
