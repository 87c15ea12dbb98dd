// crates/pingone-client/src/session.rs
// ============================================================================
// Module: Identity API Session
// Description: Authenticated PingOne management API session.
// Purpose: Provide user, population, and role operations for fixtures.
// Dependencies: reqwest, serde, serde_json, url
// ============================================================================

//! ## Overview
//! [`IdentityApi`] is the contract fixtures consume; [`PingOneSession`] is the
//! blocking HTTP implementation. Lookups by name match exactly on the returned
//! listing. Deletion resolves the user first and treats a missing user (or a
//! 404 on delete) as already deleted.
//! Invariants:
//! - Every call carries the session bearer token.
//! - Non-success statuses fail closed with the truncated response body.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::json;
use url::Url;

use crate::auth::AccessToken;
use crate::auth::ClientCredentials;
use crate::endpoints::EnvironmentEndpoints;
use crate::error::PingOneError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Media type required when a user is created with an initial password.
pub const USER_IMPORT_MEDIA_TYPE: &str = "application/vnd.pingidentity.user.import+json";

/// Maximum response body characters kept in error messages.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// User agent for outbound identity calls.
const USER_AGENT: &str = "console-sso/0.1";

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Identity operations consumed by test fixtures.
pub trait IdentityApi: Send + Sync {
    /// Looks up a user id by exact username.
    ///
    /// # Errors
    ///
    /// Returns [`PingOneError`] when the lookup request fails.
    fn find_user_id(
        &self,
        endpoints: &EnvironmentEndpoints,
        username: &str,
    ) -> Result<Option<String>, PingOneError>;

    /// Creates a user from a full payload and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`PingOneError`] when the API rejects the user.
    fn create_user(
        &self,
        endpoints: &EnvironmentEndpoints,
        payload: &Value,
    ) -> Result<String, PingOneError>;

    /// Applies a partial update to an existing user.
    ///
    /// # Errors
    ///
    /// Returns [`PingOneError::NotFound`] when the user does not exist.
    fn update_user(
        &self,
        endpoints: &EnvironmentEndpoints,
        username: &str,
        payload: &Value,
    ) -> Result<(), PingOneError>;

    /// Deletes a user by username; returns whether a user was removed.
    ///
    /// # Errors
    ///
    /// Returns [`PingOneError`] for failures other than "not found".
    fn delete_user(
        &self,
        endpoints: &EnvironmentEndpoints,
        username: &str,
    ) -> Result<bool, PingOneError>;

    /// Resolves a population id by exact name.
    ///
    /// # Errors
    ///
    /// Returns [`PingOneError::NotFound`] when no population has the name.
    fn find_population_id(
        &self,
        endpoints: &EnvironmentEndpoints,
        name: &str,
    ) -> Result<String, PingOneError>;

    /// Assigns a named platform role to a user, scoped to an environment.
    ///
    /// # Errors
    ///
    /// Returns [`PingOneError`] when the user or role is missing or the
    /// assignment is rejected.
    fn add_role_to_user(
        &self,
        endpoints: &EnvironmentEndpoints,
        username: &str,
        role_name: &str,
        scope_environment_id: &str,
    ) -> Result<(), PingOneError>;
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// HAL collection envelope.
#[derive(Debug, Deserialize)]
struct Listing<T> {
    /// Embedded page, absent when the collection is empty.
    #[serde(rename = "_embedded", default = "Option::default")]
    embedded: Option<T>,
}

/// Embedded users.
#[derive(Debug, Default, Deserialize)]
struct UsersPage {
    /// Matching users.
    #[serde(default)]
    users: Vec<Resource>,
}

/// Embedded populations.
#[derive(Debug, Default, Deserialize)]
struct PopulationsPage {
    /// Matching populations.
    #[serde(default)]
    populations: Vec<Resource>,
}

/// Embedded roles.
#[derive(Debug, Default, Deserialize)]
struct RolesPage {
    /// Matching roles.
    #[serde(default)]
    roles: Vec<Resource>,
}

/// Any identified resource; only the fields lookups need.
#[derive(Debug, Deserialize)]
struct Resource {
    /// Resource id.
    id: String,
    /// Display name (populations, roles).
    #[serde(default)]
    name: Option<String>,
    /// Username (users).
    #[serde(default)]
    username: Option<String>,
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Authenticated blocking session against the PingOne management API.
#[derive(Debug, Clone)]
pub struct PingOneSession {
    /// HTTP client shared by all calls.
    client: Client,
    /// Bearer token attached to each request.
    token: AccessToken,
}

impl PingOneSession {
    /// Creates a session from an existing token.
    ///
    /// # Errors
    ///
    /// Returns [`PingOneError::ClientSetup`] when the HTTP client cannot be built.
    pub fn new(token: AccessToken, timeout: Duration) -> Result<Self, PingOneError> {
        Ok(Self::with_client(build_client(timeout)?, token))
    }

    /// Authenticates with client credentials and opens a session.
    ///
    /// # Errors
    ///
    /// Returns [`PingOneError`] when the client cannot be built or the token
    /// request fails.
    pub fn connect(
        credentials: &ClientCredentials,
        timeout: Duration,
    ) -> Result<Self, PingOneError> {
        let client = build_client(timeout)?;
        let token = credentials.fetch_token(&client)?;
        Ok(Self::with_client(client, token))
    }

    /// Creates a session from a prebuilt client.
    #[must_use]
    pub const fn with_client(client: Client, token: AccessToken) -> Self {
        Self {
            client,
            token,
        }
    }

    /// Issues an authenticated GET and decodes the JSON response.
    fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: &str,
    ) -> Result<T, PingOneError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(self.token.secret())
            .send()
            .map_err(|err| transport(operation, &err))?;
        read_json(operation, response)
    }

    /// Issues an authenticated request with a JSON body.
    fn send_json(
        &self,
        operation: &'static str,
        builder: reqwest::blocking::RequestBuilder,
        media_type: &str,
        payload: &Value,
    ) -> Result<Response, PingOneError> {
        let body = serde_json::to_vec(payload).map_err(|err| PingOneError::Decode {
            operation,
            message: err.to_string(),
        })?;
        let response = builder
            .bearer_auth(self.token.secret())
            .header(CONTENT_TYPE, media_type)
            .body(body)
            .send()
            .map_err(|err| transport(operation, &err))?;
        ensure_success(operation, response)
    }

    /// Returns the user id or a not-found error.
    fn require_user_id(
        &self,
        endpoints: &EnvironmentEndpoints,
        username: &str,
    ) -> Result<String, PingOneError> {
        self.find_user_id(endpoints, username)?.ok_or_else(|| PingOneError::NotFound {
            kind: "user",
            name: username.to_string(),
        })
    }

    /// Resolves a platform role id by exact name.
    fn find_role_id(
        &self,
        endpoints: &EnvironmentEndpoints,
        role_name: &str,
    ) -> Result<String, PingOneError> {
        let listing: Listing<RolesPage> = self.get_json("list roles", &endpoints.roles())?;
        listing
            .embedded
            .unwrap_or_default()
            .roles
            .into_iter()
            .find(|role| role.name.as_deref() == Some(role_name))
            .map(|role| role.id)
            .ok_or_else(|| PingOneError::NotFound {
                kind: "role",
                name: role_name.to_string(),
            })
    }
}

impl IdentityApi for PingOneSession {
    fn find_user_id(
        &self,
        endpoints: &EnvironmentEndpoints,
        username: &str,
    ) -> Result<Option<String>, PingOneError> {
        let mut url = Url::parse(&endpoints.users()).map_err(|err| {
            PingOneError::InvalidConfig(format!("invalid users endpoint: {err}"))
        })?;
        url.query_pairs_mut().append_pair("filter", &format!("username eq \"{username}\""));
        let listing: Listing<UsersPage> = self.get_json("find user", url.as_str())?;
        Ok(listing
            .embedded
            .unwrap_or_default()
            .users
            .into_iter()
            .find(|user| user.username.as_deref() == Some(username))
            .map(|user| user.id))
    }

    fn create_user(
        &self,
        endpoints: &EnvironmentEndpoints,
        payload: &Value,
    ) -> Result<String, PingOneError> {
        let builder = self.client.post(endpoints.users());
        let response = self.send_json("create user", builder, USER_IMPORT_MEDIA_TYPE, payload)?;
        let created: Resource = decode_body("create user", response)?;
        Ok(created.id)
    }

    fn update_user(
        &self,
        endpoints: &EnvironmentEndpoints,
        username: &str,
        payload: &Value,
    ) -> Result<(), PingOneError> {
        let user_id = self.require_user_id(endpoints, username)?;
        let builder = self.client.patch(endpoints.user(&user_id));
        self.send_json("update user", builder, "application/json", payload)?;
        Ok(())
    }

    fn delete_user(
        &self,
        endpoints: &EnvironmentEndpoints,
        username: &str,
    ) -> Result<bool, PingOneError> {
        let Some(user_id) = self.find_user_id(endpoints, username)? else {
            return Ok(false);
        };
        let response = self
            .client
            .delete(endpoints.user(&user_id))
            .bearer_auth(self.token.secret())
            .send()
            .map_err(|err| transport("delete user", &err))?;
        match ensure_success("delete user", response) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn find_population_id(
        &self,
        endpoints: &EnvironmentEndpoints,
        name: &str,
    ) -> Result<String, PingOneError> {
        let listing: Listing<PopulationsPage> =
            self.get_json("list populations", &endpoints.populations())?;
        listing
            .embedded
            .unwrap_or_default()
            .populations
            .into_iter()
            .find(|population| population.name.as_deref() == Some(name))
            .map(|population| population.id)
            .ok_or_else(|| PingOneError::NotFound {
                kind: "population",
                name: name.to_string(),
            })
    }

    fn add_role_to_user(
        &self,
        endpoints: &EnvironmentEndpoints,
        username: &str,
        role_name: &str,
        scope_environment_id: &str,
    ) -> Result<(), PingOneError> {
        let user_id = self.require_user_id(endpoints, username)?;
        let role_id = self.find_role_id(endpoints, role_name)?;
        let payload = json!({
            "role": { "id": role_id },
            "scope": { "id": scope_environment_id, "type": "ENVIRONMENT" },
        });
        let builder = self.client.post(endpoints.user_role_assignments(&user_id));
        self.send_json("assign role", builder, "application/json", &payload)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the blocking HTTP client used for identity calls.
fn build_client(timeout: Duration) -> Result<Client, PingOneError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|err| PingOneError::ClientSetup(err.to_string()))
}

/// Maps a reqwest transport error.
fn transport(operation: &'static str, err: &reqwest::Error) -> PingOneError {
    PingOneError::Transport {
        operation,
        message: err.to_string(),
    }
}

/// Fails closed on non-success statuses, keeping a truncated body.
fn ensure_success(operation: &'static str, response: Response) -> Result<Response, PingOneError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(PingOneError::Status {
        operation,
        status: status.as_u16(),
        body: truncate(&body),
    })
}

/// Decodes a JSON response body.
fn decode_body<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, PingOneError> {
    let text = response.text().map_err(|err| transport(operation, &err))?;
    serde_json::from_str(&text).map_err(|err| PingOneError::Decode {
        operation,
        message: err.to_string(),
    })
}

/// Checks the status and decodes a JSON response body.
pub(crate) fn read_json<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, PingOneError> {
    decode_body(operation, ensure_success(operation, response)?)
}

/// Truncates a response body for error messages.
fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let mut out: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    out.push_str("...");
    out
}
