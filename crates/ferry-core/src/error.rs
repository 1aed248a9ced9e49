// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Ferry export pipeline.
//!
//! Two layers exist: [`FerryError`] aborts a whole activation, while
//! [`DeliveryFailure`] describes a single record that could not be handed to
//! the collector and never escapes the dispatcher.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across Ferry traits and run-level operations.
#[derive(Debug, Error)]
pub enum FerryError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// The local message store could not be read. Aborts the activation.
    #[error("message store unavailable: {source}")]
    StoreUnavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Ferry's own state database failed (preferences, run history).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The alarm service refused or failed a registration.
    #[error("scheduler unavailable: {message}")]
    SchedulerUnavailable { message: String },

    /// Component health check failed.
    #[error("health check failed for {name}: {source}")]
    HealthCheckFailed {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Why a single record could not be delivered.
///
/// Failures are isolated per record: the dispatcher records them in the batch
/// report and keeps going with the siblings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryFailure {
    /// Connection refused, DNS failure, reset, TLS error.
    #[error("network failure: {0}")]
    Network(String),

    /// The attempt exceeded its connect or request deadline.
    #[error("delivery timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// The collector answered, but not with a success.
    #[error("server rejected record with status {status}: {body}")]
    ServerRejected { status: u16, body: String },

    /// The collector answered 2xx with a body that could not be read.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The delivery task ended without producing a result (panic or cancellation).
    #[error("delivery task aborted: {0}")]
    Aborted(String),
}

impl DeliveryFailure {
    /// Short machine-friendly label for logs and run history.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Timeout { .. } => "timeout",
            Self::ServerRejected { .. } => "server_rejected",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Aborted(_) => "aborted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_failure_kinds_are_stable() {
        assert_eq!(DeliveryFailure::Network("reset".into()).kind(), "network");
        assert_eq!(
            DeliveryFailure::Timeout {
                duration: Duration::from_secs(5)
            }
            .kind(),
            "timeout"
        );
        assert_eq!(
            DeliveryFailure::ServerRejected {
                status: 500,
                body: String::new()
            }
            .kind(),
            "server_rejected"
        );
        assert_eq!(
            DeliveryFailure::MalformedResponse("eof".into()).kind(),
            "malformed_response"
        );
        assert_eq!(DeliveryFailure::Aborted("panic".into()).kind(), "aborted");
    }

    #[test]
    fn store_unavailable_displays_source() {
        let err = FerryError::StoreUnavailable {
            source: Box::new(std::io::Error::other("database is locked")),
        };
        assert_eq!(
            err.to_string(),
            "message store unavailable: database is locked"
        );
    }
}
