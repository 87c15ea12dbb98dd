// crates/pingone-client/src/auth.rs
// ============================================================================
// Module: Client Credentials
// Description: OAuth client-credentials token acquisition for PingOne.
// Purpose: Obtain the bearer token used by management API sessions.
// Dependencies: reqwest, serde, url
// ============================================================================

//! ## Overview
//! A worker application authenticates with HTTP basic client authentication
//! against `{auth_location}/{environment_id}/as/token` and receives a bearer
//! token. Secrets are redacted from `Debug` output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::error::PingOneError;
use crate::session::read_json;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Bearer token issued by the PingOne authorization server.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Raw token value.
    value: String,
    /// Lifetime in seconds as reported by the server.
    expires_in: Option<u64>,
}

impl AccessToken {
    /// Wraps an existing token value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_in: None,
        }
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.value
    }

    /// Returns the advertised lifetime in seconds.
    #[must_use]
    pub const fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Worker application credentials.
#[derive(Clone)]
pub struct ClientCredentials {
    /// Authentication root, for example `https://auth.pingone.com`.
    pub auth_location: String,
    /// Environment hosting the worker application.
    pub environment_id: String,
    /// OAuth client identifier.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("auth_location", &self.auth_location)
            .field("environment_id", &self.environment_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    /// Issued bearer token.
    access_token: String,
    /// Lifetime in seconds.
    #[serde(default)]
    expires_in: Option<u64>,
}

impl ClientCredentials {
    /// Returns the token endpoint URL.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/as/token",
            self.auth_location.trim_end_matches('/'),
            self.environment_id
        )
    }

    /// Exchanges the credentials for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`PingOneError`] when the credentials are incomplete, the request
    /// fails, or the token response cannot be decoded.
    pub fn fetch_token(&self, client: &Client) -> Result<AccessToken, PingOneError> {
        if self.client_id.trim().is_empty() || self.client_secret.trim().is_empty() {
            return Err(PingOneError::InvalidConfig(
                "client id and client secret are required".to_string(),
            ));
        }
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .finish();
        let response = client
            .post(self.token_url())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .map_err(|err| PingOneError::Transport {
                operation: "token",
                message: err.to_string(),
            })?;
        let token: TokenResponse = read_json("token", response)?;
        if token.access_token.is_empty() {
            return Err(PingOneError::Decode {
                operation: "token",
                message: "empty access_token".to_string(),
            });
        }
        Ok(AccessToken {
            value: token.access_token,
            expires_in: token.expires_in,
        })
    }
}
