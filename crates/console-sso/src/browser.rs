// crates/console-sso/src/browser.rs
// ============================================================================
// Module: Browser Seam
// Description: Browser trait, session launcher, and quit-on-drop guard.
// Purpose: Let login and marker logic run against WebDriver or test fakes.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`Browser`] is the command surface the harness uses. Each battery case gets
//! its own session from a [`BrowserLauncher`], wrapped in a [`BrowserGuard`]
//! that quits the session when the case ends, pass or fail.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ops::Deref;
use std::ops::DerefMut;
use std::sync::Arc;
use std::time::Duration;

use crate::events::EventKind;
use crate::events::EventSink;
use crate::webdriver::BrowserOptions;
use crate::webdriver::ElementRef;
use crate::webdriver::Locator;
use crate::webdriver::WebDriverClient;
use crate::webdriver::WebDriverError;

// ============================================================================
// SECTION: Traits
// ============================================================================

/// Browser commands used by the harness.
pub trait Browser: Send {
    /// Returns the session identifier.
    fn session_id(&self) -> &str;

    /// Navigates the top-level context to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] when the command fails.
    fn navigate(&mut self, url: &str) -> Result<(), WebDriverError>;

    /// Returns the current top-level URL.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] when the command fails.
    fn current_url(&mut self) -> Result<String, WebDriverError>;

    /// Finds the first element matching `locator`, honoring the implicit wait.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError::NoSuchElement`] when nothing matches.
    fn find_element(&mut self, locator: &Locator) -> Result<ElementRef, WebDriverError>;

    /// Finds every element matching `locator`; an empty list is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] when the command fails.
    fn find_elements(&mut self, locator: &Locator) -> Result<Vec<ElementRef>, WebDriverError>;

    /// Clicks an element.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] when the element cannot be clicked.
    fn click(&mut self, element: &ElementRef) -> Result<(), WebDriverError>;

    /// Types text into an element.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] when the element rejects input.
    fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<(), WebDriverError>;

    /// Returns whether an element is rendered visibly.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] when the command fails.
    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool, WebDriverError>;

    /// Returns the serialized DOM of the current context.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] when the command fails.
    fn page_source(&mut self) -> Result<String, WebDriverError>;

    /// Switches into an iframe, or back to the top-level context with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] when the frame cannot be entered.
    fn switch_to_frame(&mut self, frame: Option<&ElementRef>) -> Result<(), WebDriverError>;

    /// Deletes every cookie visible to the current document.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] when the command fails.
    fn delete_all_cookies(&mut self) -> Result<(), WebDriverError>;

    /// Sets the implicit wait used by element lookups.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] when the command fails.
    fn set_implicit_wait(&mut self, wait: Duration) -> Result<(), WebDriverError>;

    /// Ends the session.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] when the driver rejects the request.
    fn quit(&mut self) -> Result<(), WebDriverError>;
}

/// Opens isolated browser sessions.
pub trait BrowserLauncher: Send + Sync {
    /// Launches a new session.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] when the session cannot be created.
    fn launch(&self) -> Result<Box<dyn Browser>, WebDriverError>;
}

// ============================================================================
// SECTION: WebDriver Launcher
// ============================================================================

/// Launcher backed by a WebDriver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    /// Endpoint client.
    client: WebDriverClient,
    /// Session capabilities.
    options: BrowserOptions,
}

impl WebDriverLauncher {
    /// Creates a launcher.
    #[must_use]
    pub const fn new(client: WebDriverClient, options: BrowserOptions) -> Self {
        Self {
            client,
            options,
        }
    }

    /// Returns the session capabilities.
    #[must_use]
    pub const fn options(&self) -> &BrowserOptions {
        &self.options
    }
}

impl BrowserLauncher for WebDriverLauncher {
    fn launch(&self) -> Result<Box<dyn Browser>, WebDriverError> {
        let mut session = self.client.new_session(&self.options)?;
        if let Err(err) = session.set_implicit_wait(self.options.implicit_wait) {
            let _ = session.quit();
            return Err(err);
        }
        Ok(Box::new(session))
    }
}

// ============================================================================
// SECTION: Guard
// ============================================================================

/// Owns a browser session and quits it when dropped.
pub struct BrowserGuard {
    /// Live session.
    browser: Box<dyn Browser>,
    /// Event destination.
    events: Arc<dyn EventSink>,
    /// Set once the session has been quit.
    closed: bool,
}

impl BrowserGuard {
    /// Launches a session and wraps it in a guard.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] when the session cannot be created.
    pub fn launch(
        launcher: &dyn BrowserLauncher,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, WebDriverError> {
        let browser = launcher.launch()?;
        events.emit(EventKind::BrowserLaunched {
            session_id: browser.session_id().to_string(),
        });
        Ok(Self {
            browser,
            events,
            closed: false,
        })
    }

    /// Quits the session and reports the result.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] when the driver rejects the quit.
    pub fn close(mut self) -> Result<(), WebDriverError> {
        self.quit_once()
    }

    /// Quits the session at most once.
    fn quit_once(&mut self) -> Result<(), WebDriverError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let result = self.browser.quit();
        self.events.emit(EventKind::BrowserClosed {
            session_id: self.browser.session_id().to_string(),
            error: result.as_ref().err().map(ToString::to_string),
        });
        result
    }
}

impl Deref for BrowserGuard {
    type Target = dyn Browser;

    fn deref(&self) -> &Self::Target {
        self.browser.as_ref()
    }
}

impl DerefMut for BrowserGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.browser.as_mut()
    }
}

impl Drop for BrowserGuard {
    fn drop(&mut self) {
        let _ = self.quit_once();
    }
}
