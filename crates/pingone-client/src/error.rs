// crates/pingone-client/src/error.rs
// ============================================================================
// Module: PingOne Errors
// Description: Error type for identity API calls.
// Purpose: Classify transport, status, decode, and lookup failures.
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// Errors emitted by the PingOne client.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages never include passwords or bearer tokens.
#[derive(Debug, Error)]
pub enum PingOneError {
    /// The HTTP client could not be built.
    #[error("http client setup failed: {0}")]
    ClientSetup(String),
    /// The request never produced a response.
    #[error("{operation} request failed: {message}")]
    Transport {
        /// Operation label.
        operation: &'static str,
        /// Transport error message.
        message: String,
    },
    /// The API answered with a non-success status.
    #[error("{operation} returned http {status}: {body}")]
    Status {
        /// Operation label.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },
    /// The response body did not match the expected shape.
    #[error("{operation} response could not be decoded: {message}")]
    Decode {
        /// Operation label.
        operation: &'static str,
        /// Decode error message.
        message: String,
    },
    /// A named resource does not exist.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// Resource kind (user, population, role).
        kind: &'static str,
        /// Name that was looked up.
        name: String,
    },
    /// Credentials or metadata were rejected before any request was sent.
    #[error("invalid identity configuration: {0}")]
    InvalidConfig(String),
}

impl PingOneError {
    /// Returns true when the error is an HTTP 404 or a failed lookup.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Status {
                    status: 404,
                    ..
                }
        )
    }
}
