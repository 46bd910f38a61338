//! Errors of the orchestration layer.
//!
//! Per-message failure conditions (malformed envelopes and payloads) live in
//! `muster_protocol` and are drop-and-log; domain operation failures are
//! `world::StoreError` and ride the worker supervision path. What remains
//! here is what can actually fail the server itself.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors that can occur during server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Network-related error (bind failures, socket errors).
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration problem (unparseable address, zero-size pool).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<TransportError> for ServerError {
    fn from(err: TransportError) -> Self {
        Self::Network(err.to_string())
    }
}
