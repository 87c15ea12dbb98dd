// crates/console-sso/src/webdriver/error.rs
// ============================================================================
// Module: WebDriver Errors
// Description: Error classification for W3C WebDriver commands.
// Purpose: Separate "no such element" from other command failures.
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// W3C error code for a locator that matched nothing.
pub const NO_SUCH_ELEMENT: &str = "no such element";

/// W3C error code for an element that cannot receive input.
pub const ELEMENT_NOT_INTERACTABLE: &str = "element not interactable";

/// W3C error code for an element detached from the document.
pub const STALE_ELEMENT_REFERENCE: &str = "stale element reference";

/// Errors emitted by WebDriver commands.
///
/// # Invariants
/// - `NoSuchElement` is reserved for the W3C `no such element` code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebDriverError {
    /// The HTTP client could not be built.
    #[error("webdriver client setup failed: {0}")]
    ClientSetup(String),
    /// The command never produced a response.
    #[error("webdriver {command} request failed: {message}")]
    Transport {
        /// Command label.
        command: &'static str,
        /// Transport error message.
        message: String,
    },
    /// No element matched the locator.
    #[error("no such element: {message}")]
    NoSuchElement {
        /// Driver message.
        message: String,
    },
    /// The element exists but cannot be interacted with.
    #[error("element not interactable: {message}")]
    NotInteractable {
        /// Driver message.
        message: String,
    },
    /// The element is no longer attached to the page.
    #[error("stale element reference: {message}")]
    StaleElement {
        /// Driver message.
        message: String,
    },
    /// Any other W3C error code.
    #[error("webdriver {command} failed with {code}: {message}")]
    Command {
        /// Command label.
        command: &'static str,
        /// W3C error code.
        code: String,
        /// Driver message.
        message: String,
    },
    /// The response did not match the protocol shape.
    #[error("webdriver {command} response could not be decoded: {message}")]
    Decode {
        /// Command label.
        command: &'static str,
        /// Decode error message.
        message: String,
    },
}

impl WebDriverError {
    /// Maps a W3C error code to a typed error.
    #[must_use]
    pub fn from_code(command: &'static str, code: &str, message: String) -> Self {
        match code {
            NO_SUCH_ELEMENT => Self::NoSuchElement {
                message,
            },
            ELEMENT_NOT_INTERACTABLE => Self::NotInteractable {
                message,
            },
            STALE_ELEMENT_REFERENCE => Self::StaleElement {
                message,
            },
            _ => Self::Command {
                command,
                code: code.to_string(),
                message,
            },
        }
    }

    /// Returns true for the W3C `no such element` error.
    #[must_use]
    pub const fn is_no_such_element(&self) -> bool {
        matches!(self, Self::NoSuchElement { .. })
    }
}
