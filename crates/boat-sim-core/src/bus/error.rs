// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for bus operations.

use thiserror::Error;

/// Bus errors.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("Invalid topic name: {0:?}")]
    InvalidTopic(String),

    #[error("Type mismatch on topic '{topic}': registered as {registered}, requested {requested}")]
    TypeMismatch {
        topic: String,
        registered: String,
        requested: String,
    },

    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),
}
