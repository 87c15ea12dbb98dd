// crates/console-sso/src/reachability.rs
// ============================================================================
// Module: URL Reachability
// Description: Polls a console URL until it answers with a success status.
// Purpose: Wait out console restarts before driving a browser at them.
// Dependencies: reqwest, thiserror
// ============================================================================

//! ## Overview
//! Consoles may be mid-restart when a suite starts. [`ReachabilityProbe`]
//! issues plain GETs (redirects followed, certificate verification disabled)
//! under a [`RetryPolicy`]. Non-success statuses and transport failures are
//! both retried; once the budget is spent the last failure is returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;

use crate::events::EventKind;
use crate::events::EventSink;
use crate::retry::RetryPolicy;
use crate::retry::Sleeper;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Timeout for a single probe request.
const PROBE_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Outcome of a single failed probe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    /// The server answered with a non-success status.
    #[error("http status {0}")]
    Status(u16),
    /// The request did not complete.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors returned by the reachability probe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReachabilityError {
    /// The HTTP client could not be built.
    #[error("probe client setup failed: {0}")]
    ClientSetup(String),
    /// The URL never answered with success.
    #[error("{url} unreachable after {attempts} attempts: {last}")]
    Unreachable {
        /// Probed URL.
        url: String,
        /// Attempts performed.
        attempts: u32,
        /// Last observed failure.
        last: ProbeFailure,
    },
}

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Blocking reachability probe.
#[derive(Clone)]
pub struct ReachabilityProbe {
    /// HTTP client with certificate verification disabled.
    client: Client,
    /// Retry budget.
    policy: RetryPolicy,
    /// Delay driver.
    sleeper: Arc<dyn Sleeper>,
    /// Event destination.
    events: Arc<dyn EventSink>,
}

impl ReachabilityProbe {
    /// Creates a probe.
    ///
    /// # Errors
    ///
    /// Returns [`ReachabilityError::ClientSetup`] when the HTTP client cannot
    /// be built.
    pub fn new(
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, ReachabilityError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(PROBE_REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ReachabilityError::ClientSetup(err.to_string()))?;
        Ok(Self {
            client,
            policy,
            sleeper,
            events,
        })
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Issues one GET and returns the final status code.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeFailure::Transport`] when no response arrives.
    pub fn status_of(&self, url: &str) -> Result<u16, ProbeFailure> {
        self.client
            .get(url)
            .send()
            .map(|response| response.status().as_u16())
            .map_err(|err| ProbeFailure::Transport(err.to_string()))
    }

    /// Issues one GET and requires a success status.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeFailure`] for transport errors and non-success statuses.
    pub fn check_once(&self, url: &str) -> Result<u16, ProbeFailure> {
        let status = self.status_of(url)?;
        if (200..300).contains(&status) { Ok(status) } else { Err(ProbeFailure::Status(status)) }
    }

    /// Polls `url` until it answers with a success status. Returns the number
    /// of attempts used.
    ///
    /// # Errors
    ///
    /// Returns [`ReachabilityError::Unreachable`] with the last failure once
    /// the retry budget is exhausted.
    pub fn wait_until_reachable(&self, url: &str) -> Result<u32, ReachabilityError> {
        let mut used = 0;
        let result = self.policy.execute(
            self.sleeper.as_ref(),
            |attempt| {
                used = attempt;
                self.check_once(url)
            },
            |_| true,
            |notice| {
                self.events.emit(EventKind::RetryScheduled {
                    operation: format!("reach {url}"),
                    attempt: notice.attempt,
                    max_attempts: notice.max_attempts,
                    delay_ms: u64::try_from(notice.delay.as_millis()).unwrap_or(u64::MAX),
                    error: notice.error.to_string(),
                });
            },
        );
        match result {
            Ok(_) => {
                self.events.emit(EventKind::UrlReachable {
                    url: url.to_string(),
                    attempts: used,
                });
                Ok(used)
            }
            Err(failure) => Err(ReachabilityError::Unreachable {
                url: url.to_string(),
                attempts: failure.attempts,
                last: failure.error,
            }),
        }
    }
}
