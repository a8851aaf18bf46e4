// SPDX-License-Identifier: Apache-2.0

//! Normalized error types for the gateway driver
//!
//! Server-reported failures, transport failures, and wire decode failures
//! are mapped to one unified error type so callers handle every outcome of
//! an execute call the same way.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error payload reported by the gateway, both inside 2xx responses
/// (query-level failures) and as the body of non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Body synthesized from an HTTP status line when the gateway response
    /// is not parseable as JSON.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal", message)
    }
}

/// Unified error type for all driver operations
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum DatabaseError {
    /// The gateway reported a failure: a non-2xx response, or a 2xx response
    /// carrying an `error` field (surfaced with status 400).
    #[error("{message}")]
    Server {
        message: String,
        status: u16,
        body: ErrorBody,
    },

    /// The injected transport failed before a response was produced.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The response body or packed row data could not be decoded.
    #[error("decode error: {message}")]
    Decode { message: String },
}

impl DatabaseError {
    pub fn server(message: impl Into<String>, status: u16, body: ErrorBody) -> Self {
        Self::Server {
            message: message.into(),
            status,
            body,
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport { message: msg.into() }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode { message: msg.into() }
    }

    /// HTTP status associated with a server-reported failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for driver operations
pub type DriverResult<T> = Result<T, DatabaseError>;
