// crates/console-sso/src/access.rs
// ============================================================================
// Module: Access Verification
// Description: Granted/denied assertions over console page markers.
// Purpose: Turn marker outcomes into verdicts with diagnostic failures.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Access is granted when any granted marker is visible (and, for consoles
//! with an application list, at least one entry is present). Access is denied
//! when a denied marker is visible (or, for application-list consoles, the
//! granted title shows with zero entries) and no granted marker is visible.
//! Failures carry the page source, the marker misses, and the login trace.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

use crate::browser::Browser;
use crate::console::ResolvedConsole;
use crate::events::EventKind;
use crate::events::EventSink;
use crate::login::LoginDriver;
use crate::login::LoginError;
use crate::login::LoginState;
use crate::login::LoginTrace;
use crate::login::close_popup;
use crate::markers::MarkerMiss;
use crate::markers::MarkerOutcome;
use crate::markers::MarkerSearch;
use crate::markers::count_elements;
use crate::webdriver::Locator;
use crate::webdriver::WebDriverError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Iframe hosting the PingOne console content.
pub const PINGONE_CONTENT_FRAME: &str = "content-iframe";

/// Text the PingOne console home page shows once signed in.
pub const PINGONE_HOME_TEXT: &str = "Environments";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Expected access verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// Access should be granted.
    Granted,
    /// Access should be denied.
    Denied,
}

impl Expectation {
    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assertion failure with browser diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{console}: expected access {expected} at {url}: {reason} (misses: [{}]; login trace: {trace}; page source: {})",
    render_misses(.misses),
    render_page_source(.page_source.as_deref())
)]
pub struct AccessFailure {
    /// Console name.
    pub console: String,
    /// URL being verified.
    pub url: String,
    /// Expected verdict.
    pub expected: Expectation,
    /// What went wrong.
    pub reason: String,
    /// Marker misses observed.
    pub misses: Vec<MarkerMiss>,
    /// Login trace at the time of failure.
    pub trace: LoginTrace,
    /// Page source, when the browser could still produce it.
    pub page_source: Option<String>,
}

/// Joins misses for display.
fn render_misses(misses: &[MarkerMiss]) -> String {
    misses.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Characters of page source kept in a failure message.
pub const PAGE_SOURCE_EXCERPT_CHARS: usize = 2000;

/// Renders the page source truncated to [`PAGE_SOURCE_EXCERPT_CHARS`].
fn render_page_source(page_source: Option<&str>) -> String {
    let Some(source) = page_source else {
        return "unavailable".to_string();
    };
    match source.char_indices().nth(PAGE_SOURCE_EXCERPT_CHARS) {
        Some((cut, _)) => {
            format!("{}... ({} more bytes)", &source[..cut], source.len() - cut)
        }
        None => source.to_string(),
    }
}

// ============================================================================
// SECTION: Verifier
// ============================================================================

/// Evaluates access expectations against the current page.
pub struct AccessVerifier<'a> {
    /// Marker search settings.
    markers: MarkerSearch<'a>,
    /// Event destination.
    events: &'a dyn EventSink,
}

/// Failure context collected while verifying.
struct Context<'c> {
    /// Console name.
    console: &'c str,
    /// URL under test.
    url: &'c str,
    /// Expected verdict.
    expected: Expectation,
}

impl<'a> AccessVerifier<'a> {
    /// Creates a verifier.
    #[must_use]
    pub const fn new(markers: MarkerSearch<'a>, events: &'a dyn EventSink) -> Self {
        Self {
            markers,
            events,
        }
    }

    /// Requires a granted marker (plus application entries when listed).
    ///
    /// # Errors
    ///
    /// Returns [`AccessFailure`] when access is not observably granted.
    pub fn verify_granted(
        &self,
        browser: &mut dyn Browser,
        console: &ResolvedConsole,
        login: &mut LoginDriver<'_>,
    ) -> Result<(), AccessFailure> {
        let context = Context {
            console: &console.name,
            url: &console.console_url,
            expected: Expectation::Granted,
        };
        let outcome = self
            .markers
            .any_element_displayed(browser, &console.granted)
            .map_err(|err| self.driver_failure(browser, &context, login.trace(), &err))?;
        let MarkerOutcome::Displayed {
            misses,
            ..
        } = &outcome
        else {
            return Err(self.fail(
                browser,
                &context,
                login.trace(),
                "no access-granted marker was displayed; SSO may have failed",
                outcome.misses().to_vec(),
            ));
        };
        if let Some(entry) = &console.app_entry {
            let entries = count_elements(browser, entry)
                .map_err(|err| self.driver_failure(browser, &context, login.trace(), &err))?;
            if entries == 0 {
                return Err(self.fail(
                    browser,
                    &context,
                    login.trace(),
                    &format!("application page shown without any {entry} entries"),
                    misses.clone(),
                ));
            }
        }
        self.finish(browser, &context, login, LoginState::AccessGranted)
    }

    /// Requires a denial signal and the absence of any granted marker.
    ///
    /// # Errors
    ///
    /// Returns [`AccessFailure`] when access is not observably denied.
    pub fn verify_denied(
        &self,
        browser: &mut dyn Browser,
        console: &ResolvedConsole,
        login: &mut LoginDriver<'_>,
    ) -> Result<(), AccessFailure> {
        let context = Context {
            console: &console.name,
            url: &console.console_url,
            expected: Expectation::Denied,
        };
        let to_failure = |browser: &mut dyn Browser, err: WebDriverError, trace: &LoginTrace| {
            self.driver_failure(browser, &context, trace, &err)
        };
        let mut misses = Vec::new();
        let denied_shown = if console.denied.is_empty() {
            false
        } else {
            let outcome = self
                .markers
                .any_element_displayed(browser, &console.denied)
                .map_err(|err| to_failure(browser, err, login.trace()))?;
            misses.extend_from_slice(outcome.misses());
            outcome.is_displayed()
        };
        let granted = self
            .markers
            .any_element_displayed(browser, &console.granted)
            .map_err(|err| to_failure(browser, err, login.trace()))?;
        let granted_visible = match (&console.app_entry, granted.is_displayed()) {
            (Some(entry), true) => {
                let entries = count_elements(browser, entry)
                    .map_err(|err| to_failure(browser, err, login.trace()))?;
                entries > 0
            }
            (_, shown) => shown,
        };
        if granted_visible {
            return Err(self.fail(
                browser,
                &context,
                login.trace(),
                &format!(
                    "access-granted marker {} is visible; SSO may have succeeded",
                    granted.matched().map_or_else(String::new, ToString::to_string)
                ),
                misses,
            ));
        }
        let empty_app_page = console.app_entry.is_some() && granted.is_displayed();
        if !denied_shown && !empty_app_page {
            misses.extend_from_slice(granted.misses());
            return Err(self.fail(
                browser,
                &context,
                login.trace(),
                "no access-denied marker was displayed",
                misses,
            ));
        }
        self.finish(browser, &context, login, LoginState::AccessDenied)
    }

    /// Requires the PingOne console home page inside its content frame.
    ///
    /// # Errors
    ///
    /// Returns [`AccessFailure`] when the frame is missing or the home text
    /// is absent.
    pub fn verify_pingone_console(
        &self,
        browser: &mut dyn Browser,
        console_url: &str,
        login: &mut LoginDriver<'_>,
    ) -> Result<(), AccessFailure> {
        let context = Context {
            console: "pingone",
            url: console_url,
            expected: Expectation::Granted,
        };
        let step = |browser: &mut dyn Browser, login: &LoginDriver<'_>, err: WebDriverError| {
            self.driver_failure(browser, &context, login.trace(), &err)
        };
        login.advance(LoginState::OnTargetConsole).map_err(|err| {
            self.login_failure(browser, &context, login.trace(), &err)
        })?;
        let frame_locator = Locator::id(PINGONE_CONTENT_FRAME);
        let frame = browser.find_element(&frame_locator).map_err(|err| step(browser, login, err))?;
        browser.switch_to_frame(Some(&frame)).map_err(|err| step(browser, login, err))?;
        close_popup(browser).map_err(|err| step(browser, login, err))?;
        let source = browser.page_source().map_err(|err| step(browser, login, err))?;
        if !source.contains(PINGONE_HOME_TEXT) {
            return Err(AccessFailure {
                console: context.console.to_string(),
                url: context.url.to_string(),
                expected: context.expected,
                reason: format!("expected '{PINGONE_HOME_TEXT}' in the console page"),
                misses: Vec::new(),
                trace: login.trace().clone(),
                page_source: Some(source),
            });
        }
        self.finish(browser, &context, login, LoginState::AccessGranted)
    }

    /// Records the verdict and advances the trace.
    fn finish(
        &self,
        browser: &mut dyn Browser,
        context: &Context<'_>,
        login: &mut LoginDriver<'_>,
        verdict: LoginState,
    ) -> Result<(), AccessFailure> {
        login.advance(verdict).map_err(|err| self.login_failure(browser, context, login.trace(), &err))?;
        self.events.emit(EventKind::AccessChecked {
            console: context.console.to_string(),
            expected: context.expected.as_str().to_string(),
            passed: true,
        });
        Ok(())
    }

    /// Builds a failure and captures the page source.
    fn fail(
        &self,
        browser: &mut dyn Browser,
        context: &Context<'_>,
        trace: &LoginTrace,
        reason: &str,
        misses: Vec<MarkerMiss>,
    ) -> AccessFailure {
        self.events.emit(EventKind::AccessChecked {
            console: context.console.to_string(),
            expected: context.expected.as_str().to_string(),
            passed: false,
        });
        AccessFailure {
            console: context.console.to_string(),
            url: context.url.to_string(),
            expected: context.expected,
            reason: reason.to_string(),
            misses,
            trace: trace.clone(),
            page_source: browser.page_source().ok(),
        }
    }

    /// Converts a driver error into a failure.
    fn driver_failure(
        &self,
        browser: &mut dyn Browser,
        context: &Context<'_>,
        trace: &LoginTrace,
        err: &WebDriverError,
    ) -> AccessFailure {
        self.fail(browser, context, trace, &format!("browser error: {err}"), Vec::new())
    }

    /// Converts a login error into a failure.
    fn login_failure(
        &self,
        browser: &mut dyn Browser,
        context: &Context<'_>,
        trace: &LoginTrace,
        err: &LoginError,
    ) -> AccessFailure {
        self.fail(browser, context, trace, &err.to_string(), Vec::new())
    }
}
