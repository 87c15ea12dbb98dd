// crates/pingone-client/src/endpoints.rs
// ============================================================================
// Module: Environment Endpoints
// Description: REST endpoint resolution for a PingOne environment.
// Purpose: Keep URL construction in one place for every identity call.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`EnvironmentEndpoints`] pairs a management API root with an environment id
//! and derives the collection URLs used by the session. It is immutable and
//! cheap to clone, so every user in a suite can hold its own copy.

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default PingOne management API root (North America region).
pub const DEFAULT_API_LOCATION: &str = "https://api.pingone.com/v1";

/// Default PingOne authentication root (North America region).
pub const DEFAULT_AUTH_LOCATION: &str = "https://auth.pingone.com";

// ============================================================================
// SECTION: Endpoints
// ============================================================================

/// REST endpoints for a single PingOne environment.
///
/// # Invariants
/// - `api_location` never carries a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentEndpoints {
    /// Management API root, for example `https://api.pingone.com/v1`.
    api_location: String,
    /// Environment identifier.
    environment_id: String,
}

impl EnvironmentEndpoints {
    /// Creates endpoints for the environment under the given API root.
    #[must_use]
    pub fn new(api_location: impl Into<String>, environment_id: impl Into<String>) -> Self {
        let api_location = api_location.into().trim_end_matches('/').to_string();
        Self {
            api_location,
            environment_id: environment_id.into(),
        }
    }

    /// Returns the management API root.
    #[must_use]
    pub fn api_location(&self) -> &str {
        &self.api_location
    }

    /// Returns the environment identifier.
    #[must_use]
    pub fn environment_id(&self) -> &str {
        &self.environment_id
    }

    /// Returns the environment resource URL.
    #[must_use]
    pub fn environment(&self) -> String {
        format!("{}/environments/{}", self.api_location, self.environment_id)
    }

    /// Returns the users collection URL.
    #[must_use]
    pub fn users(&self) -> String {
        format!("{}/users", self.environment())
    }

    /// Returns the URL of a single user.
    #[must_use]
    pub fn user(&self, user_id: &str) -> String {
        format!("{}/{user_id}", self.users())
    }

    /// Returns the role assignment collection URL of a user.
    #[must_use]
    pub fn user_role_assignments(&self, user_id: &str) -> String {
        format!("{}/roleAssignments", self.user(user_id))
    }

    /// Returns the populations collection URL.
    #[must_use]
    pub fn populations(&self) -> String {
        format!("{}/populations", self.environment())
    }

    /// Returns the platform roles collection URL (not environment scoped).
    #[must_use]
    pub fn roles(&self) -> String {
        format!("{}/roles", self.api_location)
    }
}
