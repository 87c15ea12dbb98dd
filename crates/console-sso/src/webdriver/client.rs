// crates/console-sso/src/webdriver/client.rs
// ============================================================================
// Module: WebDriver Client
// Description: Blocking W3C WebDriver HTTP client.
// Purpose: Open browser sessions and issue navigation and element commands.
// Dependencies: reqwest, serde_json
// ============================================================================

//! ## Overview
//! Speaks the W3C WebDriver wire protocol to chromedriver or a Selenium grid.
//! Every response is a JSON object with a `value` member; failures carry
//! `value.error` (a W3C error code) and `value.message`.
//! Invariants:
//! - Non-success responses are classified through [`WebDriverError::from_code`].
//! - `POST` commands always send a JSON body (empty object when unused).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use serde_json::json;

use super::error::WebDriverError;
use super::locator::Locator;
use super::options::BrowserOptions;
use crate::browser::Browser;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// JSON key identifying a web element reference.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Default timeout for a single WebDriver command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

// ============================================================================
// SECTION: Types
// ============================================================================

/// Opaque reference to an element in the current browsing context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

impl ElementRef {
    /// Returns the W3C JSON representation.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({ ELEMENT_KEY: self.0 })
    }

    /// Decodes an element reference from a W3C JSON value.
    fn from_json(command: &'static str, value: &Value) -> Result<Self, WebDriverError> {
        value
            .get(ELEMENT_KEY)
            .or_else(|| value.get("ELEMENT"))
            .and_then(Value::as_str)
            .map(|id| Self(id.to_string()))
            .ok_or_else(|| WebDriverError::Decode {
                command,
                message: "missing element reference".to_string(),
            })
    }
}

/// Shared HTTP plumbing for a WebDriver endpoint.
#[derive(Debug, Clone)]
struct Transport {
    /// HTTP client.
    http: Client,
    /// Endpoint root without a trailing slash.
    base_url: String,
}

impl Transport {
    /// Sends a command and returns the `value` member of the response.
    fn command(
        &self,
        command: &'static str,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, WebDriverError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.http.request(method.clone(), url);
        if method == Method::POST {
            let payload = body.unwrap_or_else(|| json!({}));
            let bytes = serde_json::to_vec(&payload).map_err(|err| WebDriverError::Decode {
                command,
                message: err.to_string(),
            })?;
            request = request.header(CONTENT_TYPE, "application/json").body(bytes);
        }
        let response = request.send().map_err(|err| WebDriverError::Transport {
            command,
            message: err.to_string(),
        })?;
        let status = response.status();
        let text = response.text().map_err(|err| WebDriverError::Transport {
            command,
            message: err.to_string(),
        })?;
        let parsed: Value = if text.trim().is_empty() {
            json!({ "value": null })
        } else {
            serde_json::from_str(&text).map_err(|err| WebDriverError::Decode {
                command,
                message: err.to_string(),
            })?
        };
        let value = parsed.get("value").cloned().unwrap_or(Value::Null);
        if let Some(code) = value.get("error").and_then(Value::as_str) {
            let message =
                value.get("message").and_then(Value::as_str).unwrap_or_default().to_string();
            return Err(WebDriverError::from_code(command, code, message));
        }
        if !status.is_success() {
            return Err(WebDriverError::Command {
                command,
                code: format!("http {}", status.as_u16()),
                message: text,
            });
        }
        Ok(value)
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Entry point to a WebDriver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverClient {
    /// Shared HTTP plumbing.
    transport: Transport,
}

impl WebDriverClient {
    /// Creates a client for `base_url` (for example `http://127.0.0.1:9515`).
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError::ClientSetup`] when the HTTP client cannot be built.
    pub fn new(base_url: &str, command_timeout: Duration) -> Result<Self, WebDriverError> {
        let http = Client::builder()
            .timeout(command_timeout)
            .build()
            .map_err(|err| WebDriverError::ClientSetup(err.to_string()))?;
        Ok(Self {
            transport: Transport {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
            },
        })
    }

    /// Returns the endpoint root.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.transport.base_url
    }

    /// Opens a new browser session.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] when the driver rejects the capabilities.
    pub fn new_session(&self, options: &BrowserOptions) -> Result<WebDriverSession, WebDriverError> {
        let value = self.transport.command(
            "new session",
            Method::POST,
            "/session",
            Some(options.capabilities()),
        )?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| WebDriverError::Decode {
                command: "new session",
                message: "missing sessionId".to_string(),
            })?
            .to_string();
        Ok(WebDriverSession {
            transport: self.transport.clone(),
            session_id,
        })
    }
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Live browser session.
#[derive(Debug)]
pub struct WebDriverSession {
    /// Shared HTTP plumbing.
    transport: Transport,
    /// W3C session id.
    session_id: String,
}

impl WebDriverSession {
    /// Sends a command scoped to this session.
    fn session_command(
        &self,
        command: &'static str,
        method: Method,
        suffix: &str,
        body: Option<Value>,
    ) -> Result<Value, WebDriverError> {
        let path = format!("/session/{}{suffix}", self.session_id);
        self.transport.command(command, method, &path, body)
    }

    /// Builds a locator request body.
    fn locator_body(locator: &Locator) -> Value {
        let (using, value) = locator.strategy();
        json!({ "using": using, "value": value })
    }
}

impl Browser for WebDriverSession {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn navigate(&mut self, url: &str) -> Result<(), WebDriverError> {
        self.session_command("navigate", Method::POST, "/url", Some(json!({ "url": url })))?;
        Ok(())
    }

    fn current_url(&mut self) -> Result<String, WebDriverError> {
        let value = self.session_command("current url", Method::GET, "/url", None)?;
        value.as_str().map(str::to_string).ok_or_else(|| WebDriverError::Decode {
            command: "current url",
            message: "url is not a string".to_string(),
        })
    }

    fn find_element(&mut self, locator: &Locator) -> Result<ElementRef, WebDriverError> {
        let value = self.session_command(
            "find element",
            Method::POST,
            "/element",
            Some(Self::locator_body(locator)),
        )?;
        ElementRef::from_json("find element", &value)
    }

    fn find_elements(&mut self, locator: &Locator) -> Result<Vec<ElementRef>, WebDriverError> {
        let value = self.session_command(
            "find elements",
            Method::POST,
            "/elements",
            Some(Self::locator_body(locator)),
        )?;
        let Some(entries) = value.as_array() else {
            return Err(WebDriverError::Decode {
                command: "find elements",
                message: "elements is not an array".to_string(),
            });
        };
        entries.iter().map(|entry| ElementRef::from_json("find elements", entry)).collect()
    }

    fn click(&mut self, element: &ElementRef) -> Result<(), WebDriverError> {
        let suffix = format!("/element/{}/click", element.0);
        self.session_command("click", Method::POST, &suffix, None)?;
        Ok(())
    }

    fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<(), WebDriverError> {
        let suffix = format!("/element/{}/value", element.0);
        self.session_command("send keys", Method::POST, &suffix, Some(json!({ "text": text })))?;
        Ok(())
    }

    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool, WebDriverError> {
        let suffix = format!("/element/{}/displayed", element.0);
        let value = self.session_command("is displayed", Method::GET, &suffix, None)?;
        value.as_bool().ok_or_else(|| WebDriverError::Decode {
            command: "is displayed",
            message: "displayed is not a boolean".to_string(),
        })
    }

    fn page_source(&mut self) -> Result<String, WebDriverError> {
        let value = self.session_command("page source", Method::GET, "/source", None)?;
        value.as_str().map(str::to_string).ok_or_else(|| WebDriverError::Decode {
            command: "page source",
            message: "source is not a string".to_string(),
        })
    }

    fn switch_to_frame(&mut self, frame: Option<&ElementRef>) -> Result<(), WebDriverError> {
        let id = frame.map_or(Value::Null, ElementRef::to_json);
        self.session_command("switch frame", Method::POST, "/frame", Some(json!({ "id": id })))?;
        Ok(())
    }

    fn delete_all_cookies(&mut self) -> Result<(), WebDriverError> {
        self.session_command("delete cookies", Method::DELETE, "/cookie", None)?;
        Ok(())
    }

    fn set_implicit_wait(&mut self, wait: Duration) -> Result<(), WebDriverError> {
        let implicit = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
        self.session_command(
            "set timeouts",
            Method::POST,
            "/timeouts",
            Some(json!({ "implicit": implicit })),
        )?;
        Ok(())
    }

    fn quit(&mut self) -> Result<(), WebDriverError> {
        self.session_command("delete session", Method::DELETE, "", None)?;
        Ok(())
    }
}
