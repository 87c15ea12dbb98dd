// crates/console-sso/src/precheck.rs
// ============================================================================
// Module: Ingress Pre-Check
// Description: Single-shot health checks of the primary tenant ingress.
// Purpose: Confirm public endpoints answer before live suites start.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Each subdomain under the primary tenant domain gets exactly one GET with
//! certificate verification disabled; anything but HTTP 200 fails. There is
//! no retry: an ingress that is still converging should fail the pre-check.

use thiserror::Error;

use crate::events::EventKind;
use crate::events::EventSink;
use crate::reachability::ProbeFailure;
use crate::reachability::ReachabilityProbe;

/// Subdomains checked under the primary tenant domain.
pub const INGRESS_SUBDOMAINS: [&str; 2] = ["healthcheck", "metadata"];

/// A failed ingress check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ingress check of {url} failed: {failure}")]
pub struct IngressFailure {
    /// Checked URL.
    pub url: String,
    /// What went wrong.
    pub failure: ProbeFailure,
}

/// Builds the ingress URL for a subdomain.
#[must_use]
pub fn ingress_url(subdomain: &str, domain: &str) -> String {
    format!("https://{subdomain}.{domain}")
}

/// Checks one URL, requiring exactly HTTP 200.
///
/// # Errors
///
/// Returns [`IngressFailure`] for transport errors and any other status.
pub fn check_ingress_url(
    probe: &ReachabilityProbe,
    events: &dyn EventSink,
    url: &str,
) -> Result<(), IngressFailure> {
    let result = probe.status_of(url).and_then(|status| {
        if status == 200 { Ok(status) } else { Err(ProbeFailure::Status(status)) }
    });
    events.emit(EventKind::IngressChecked {
        url: url.to_string(),
        status: match &result {
            Ok(status) | Err(ProbeFailure::Status(status)) => Some(*status),
            Err(ProbeFailure::Transport(_)) => None,
        },
        passed: result.is_ok(),
    });
    result.map(|_| ()).map_err(|failure| IngressFailure {
        url: url.to_string(),
        failure,
    })
}

/// Checks every ingress subdomain under `domain`. Every URL is checked even
/// after a failure; all failures are returned.
///
/// # Errors
///
/// Returns the failed checks when any URL does not answer with HTTP 200.
pub fn check_ingress(
    probe: &ReachabilityProbe,
    events: &dyn EventSink,
    domain: &str,
) -> Result<(), Vec<IngressFailure>> {
    let failures: Vec<IngressFailure> = INGRESS_SUBDOMAINS
        .iter()
        .filter_map(|subdomain| {
            check_ingress_url(probe, events, &ingress_url(subdomain, domain)).err()
        })
        .collect();
    if failures.is_empty() { Ok(()) } else { Err(failures) }
}
