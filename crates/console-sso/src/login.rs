// crates/console-sso/src/login.rs
// ============================================================================
// Module: SSO Login
// Description: Hosted login form flows and the explicit login state machine.
// Purpose: Drive a browser from a console URL to an authenticated console.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Three flows reach a console:
//! - [`LoginDriver::pingone_login`] signs in at the PingOne console, dismisses
//!   the optional "verify your email" interstitial, and leaves the browser
//!   with an identity provider session.
//! - [`LoginDriver::login_as_pingone_user`] starts at the target console and
//!   completes the provider-hosted form the console redirects to.
//! - [`LoginDriver::login_from_external_idp`] starts at the target console and
//!   federates to the external identity environment first.
//!
//! Every flow advances a [`LoginTrace`]:
//! `not_logged_in -> login_submitted -> (popup_dismissed) -> on_target_console
//! -> {access_granted | access_denied}`. Logout returns to `not_logged_in`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::browser::Browser;
use crate::events::EventKind;
use crate::events::EventSink;
use crate::webdriver::Locator;
use crate::webdriver::WebDriverError;

// ============================================================================
// SECTION: Form Locators
// ============================================================================

/// Username input of the hosted login form.
#[must_use]
pub fn username_field() -> Locator {
    Locator::id("username")
}

/// Password input of the hosted login form.
#[must_use]
pub fn password_field() -> Locator {
    Locator::id("password")
}

/// Submit button of the hosted login form.
#[must_use]
pub fn submit_button() -> Locator {
    Locator::css("button[data-id=\"submit-button\"]")
}

/// Close button of the post-login interstitial.
#[must_use]
pub fn popup_close_button() -> Locator {
    Locator::css("[aria-label=\"Close modal window\"]")
}

/// Button that starts federation to the external identity environment.
#[must_use]
pub fn external_provider_button() -> Locator {
    Locator::class_name("custom-provider-button")
}

// ============================================================================
// SECTION: State Machine
// ============================================================================

/// Login progress for one browser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginState {
    /// No credentials submitted yet.
    NotLoggedIn,
    /// The hosted form was submitted.
    LoginSubmitted,
    /// The post-login interstitial was closed.
    PopupDismissed,
    /// The browser is on the target console.
    OnTargetConsole,
    /// A granted marker was observed.
    AccessGranted,
    /// A denied marker was observed.
    AccessDenied,
}

impl LoginState {
    /// Returns the stable snake_case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotLoggedIn => "not_logged_in",
            Self::LoginSubmitted => "login_submitted",
            Self::PopupDismissed => "popup_dismissed",
            Self::OnTargetConsole => "on_target_console",
            Self::AccessGranted => "access_granted",
            Self::AccessDenied => "access_denied",
        }
    }

    /// Returns true when `self -> next` is a legal transition.
    #[must_use]
    pub const fn can_transition(self, next: Self) -> bool {
        matches!(
            (self, next),
            (_, Self::NotLoggedIn)
                | (Self::NotLoggedIn, Self::LoginSubmitted)
                | (Self::LoginSubmitted, Self::PopupDismissed | Self::OnTargetConsole)
                | (Self::PopupDismissed, Self::OnTargetConsole)
                | (Self::OnTargetConsole, Self::AccessGranted | Self::AccessDenied)
        )
    }
}

impl fmt::Display for LoginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered record of login states.
///
/// # Invariants
/// - Starts at [`LoginState::NotLoggedIn`].
/// - Every consecutive pair satisfies [`LoginState::can_transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTrace {
    /// Visited states in order.
    states: Vec<LoginState>,
}

impl Default for LoginTrace {
    fn default() -> Self {
        Self {
            states: vec![LoginState::NotLoggedIn],
        }
    }
}

impl LoginTrace {
    /// Returns the current state.
    #[must_use]
    pub fn current(&self) -> LoginState {
        self.states.last().copied().unwrap_or(LoginState::NotLoggedIn)
    }

    /// Returns every visited state.
    #[must_use]
    pub fn states(&self) -> &[LoginState] {
        &self.states
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::IllegalTransition`] when the move is not allowed.
    pub fn advance(&mut self, next: LoginState) -> Result<(), LoginError> {
        let from = self.current();
        if !from.can_transition(next) {
            return Err(LoginError::IllegalTransition {
                from,
                to: next,
            });
        }
        self.states.push(next);
        Ok(())
    }
}

impl fmt::Display for LoginTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, state) in self.states.iter().enumerate() {
            if index > 0 {
                f.write_str(" -> ")?;
            }
            f.write_str(state.as_str())?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while logging in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    /// The state machine rejected a transition.
    #[error("illegal login transition {from} -> {to}")]
    IllegalTransition {
        /// Current state.
        from: LoginState,
        /// Requested state.
        to: LoginState,
    },
    /// A browser command failed during a login step.
    #[error("login step '{step}' failed: {source}")]
    Step {
        /// Step label.
        step: &'static str,
        /// Driver error.
        source: WebDriverError,
    },
}

/// Wraps a driver error with the step that produced it.
fn step(step: &'static str) -> impl FnOnce(WebDriverError) -> LoginError {
    move |source| LoginError::Step {
        step,
        source,
    }
}

// ============================================================================
// SECTION: Driver
// ============================================================================

/// Runs login flows and records the state trace.
pub struct LoginDriver<'a> {
    /// Visited states.
    trace: LoginTrace,
    /// Event destination.
    events: &'a dyn EventSink,
}

impl<'a> LoginDriver<'a> {
    /// Creates a driver in [`LoginState::NotLoggedIn`].
    #[must_use]
    pub fn new(events: &'a dyn EventSink) -> Self {
        Self {
            trace: LoginTrace::default(),
            events,
        }
    }

    /// Returns the trace so far.
    #[must_use]
    pub const fn trace(&self) -> &LoginTrace {
        &self.trace
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> LoginState {
        self.trace.current()
    }

    /// Advances the trace and emits a transition event.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::IllegalTransition`] for disallowed moves.
    pub fn advance(&mut self, next: LoginState) -> Result<(), LoginError> {
        let from = self.trace.current();
        self.trace.advance(next)?;
        self.events.emit(EventKind::LoginTransition {
            from,
            to: next,
        });
        Ok(())
    }

    /// Signs in at the PingOne console and closes the interstitial.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError`] when a form step fails.
    pub fn pingone_login(
        &mut self,
        browser: &mut dyn Browser,
        pingone_console_url: &str,
        username: &str,
        password: &str,
    ) -> Result<(), LoginError> {
        browser.navigate(pingone_console_url).map_err(step("open pingone console"))?;
        self.submit_form(browser, username, password)?;
        if close_popup(browser).map_err(step("close popup"))? {
            self.advance(LoginState::PopupDismissed)?;
        }
        Ok(())
    }

    /// Opens the console and completes the provider-hosted form it redirects to.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError`] when a form step fails.
    pub fn login_as_pingone_user(
        &mut self,
        browser: &mut dyn Browser,
        console_url: &str,
        username: &str,
        password: &str,
    ) -> Result<(), LoginError> {
        browser.navigate(console_url).map_err(step("open console"))?;
        self.submit_form(browser, username, password)?;
        self.advance(LoginState::OnTargetConsole)
    }

    /// Opens the console, federates to the external identity environment, and
    /// completes its login form.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError`] when a form step fails.
    pub fn login_from_external_idp(
        &mut self,
        browser: &mut dyn Browser,
        console_url: &str,
        username: &str,
        password: &str,
    ) -> Result<(), LoginError> {
        browser.navigate(console_url).map_err(step("open console"))?;
        let button = browser
            .find_element(&external_provider_button())
            .map_err(step("find external provider button"))?;
        browser.click(&button).map_err(step("click external provider button"))?;
        self.submit_form(browser, username, password)?;
        self.advance(LoginState::OnTargetConsole)
    }

    /// Navigates to the console after an identity provider session exists.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError`] when navigation fails or no login happened.
    pub fn open_console(
        &mut self,
        browser: &mut dyn Browser,
        console_url: &str,
    ) -> Result<(), LoginError> {
        browser.navigate(console_url).map_err(step("open console"))?;
        self.advance(LoginState::OnTargetConsole)
    }

    /// Ends the identity provider session and clears cookies.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError`] when navigation or cookie deletion fails.
    pub fn logout(&mut self, browser: &mut dyn Browser, signoff_url: &str) -> Result<(), LoginError> {
        browser.navigate(signoff_url).map_err(step("sign off"))?;
        browser.delete_all_cookies().map_err(step("delete cookies"))?;
        self.advance(LoginState::NotLoggedIn)
    }

    /// Fills and submits the hosted login form.
    fn submit_form(
        &mut self,
        browser: &mut dyn Browser,
        username: &str,
        password: &str,
    ) -> Result<(), LoginError> {
        let field = browser.find_element(&username_field()).map_err(step("find username"))?;
        browser.send_keys(&field, username).map_err(step("enter username"))?;
        let field = browser.find_element(&password_field()).map_err(step("find password"))?;
        browser.send_keys(&field, password).map_err(step("enter password"))?;
        let submit = browser.find_element(&submit_button()).map_err(step("find submit"))?;
        browser.click(&submit).map_err(step("submit"))?;
        self.advance(LoginState::LoginSubmitted)
    }
}

/// Closes the post-login interstitial when present. Returns whether it was
/// closed; absence or a non-interactable button is not an error.
///
/// # Errors
///
/// Returns [`WebDriverError`] for other driver failures.
pub fn close_popup(browser: &mut dyn Browser) -> Result<bool, WebDriverError> {
    let button = match browser.find_element(&popup_close_button()) {
        Ok(button) => button,
        Err(err) if err.is_no_such_element() => return Ok(false),
        Err(err) => return Err(err),
    };
    match browser.click(&button) {
        Ok(()) => Ok(true),
        Err(WebDriverError::NotInteractable {
            ..
        }) => Ok(false),
        Err(err) => Err(err),
    }
}
