// crates/console-sso/src/webdriver/options.rs
// ============================================================================
// Module: Browser Options
// Description: Capabilities for headless console browsing sessions.
// Purpose: Build the W3C new-session payload for Chrome.
// Dependencies: serde_json
// ============================================================================

use std::time::Duration;

use serde_json::Value;
use serde_json::json;

/// Implicit wait applied to element lookups.
pub const DEFAULT_IMPLICIT_WAIT: Duration = Duration::from_secs(10);

/// Chrome arguments for containerised headless runs against consoles with
/// internally issued certificates.
pub const DEFAULT_CHROME_ARGS: [&str; 5] = [
    "--ignore-ssl-errors=yes",
    "--ignore-certificate-errors",
    "--headless=new",
    "--no-sandbox",
    "--disable-dev-shm-usage",
];

/// Session capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    /// W3C `browserName`.
    pub browser_name: String,
    /// Accept self-signed and otherwise invalid certificates.
    pub accept_insecure_certs: bool,
    /// Browser command-line arguments.
    pub args: Vec<String>,
    /// Implicit wait for element lookups.
    pub implicit_wait: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            browser_name: "chrome".to_string(),
            accept_insecure_certs: true,
            args: DEFAULT_CHROME_ARGS.iter().map(|arg| (*arg).to_string()).collect(),
            implicit_wait: DEFAULT_IMPLICIT_WAIT,
        }
    }
}

impl BrowserOptions {
    /// Builds the `POST /session` body.
    #[must_use]
    pub fn capabilities(&self) -> Value {
        let implicit_ms = u64::try_from(self.implicit_wait.as_millis()).unwrap_or(u64::MAX);
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": self.browser_name,
                    "acceptInsecureCerts": self.accept_insecure_certs,
                    "goog:chromeOptions": { "args": self.args },
                    "timeouts": { "implicit": implicit_ms },
                }
            }
        })
    }
}
