// crates/console-sso/src/webdriver/mod.rs
// ============================================================================
// Module: WebDriver
// Description: Minimal W3C WebDriver client for console browsing.
// Purpose: Drive a headless browser through login forms and console pages.
// Dependencies: reqwest, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Only the commands the harness needs are implemented: sessions, navigation,
//! element lookup and interaction, page source, frames, cookies, and timeouts.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod client;
mod error;
mod locator;
mod options;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::DEFAULT_COMMAND_TIMEOUT;
pub use client::ELEMENT_KEY;
pub use client::ElementRef;
pub use client::WebDriverClient;
pub use client::WebDriverSession;
pub use error::ELEMENT_NOT_INTERACTABLE;
pub use error::NO_SUCH_ELEMENT;
pub use error::STALE_ELEMENT_REFERENCE;
pub use error::WebDriverError;
pub use locator::Locator;
pub use options::BrowserOptions;
pub use options::DEFAULT_CHROME_ARGS;
pub use options::DEFAULT_IMPLICIT_WAIT;
