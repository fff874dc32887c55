// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Action protocol errors.

use super::GoalId;
use thiserror::Error;

/// Action errors.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("No action server registered for '{0}'")]
    ServerUnavailable(String),

    #[error("Action server '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("Action '{action}' has type {registered}, requested {requested}")]
    TypeMismatch {
        action: String,
        registered: String,
        requested: String,
    },

    #[error("Client of goal {0} is gone")]
    ClientGone(GoalId),

    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Result type for action operations.
pub type ActionResult<T> = Result<T, ActionError>;
