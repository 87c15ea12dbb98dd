// crates/pingone-client/src/user.rs
// ============================================================================
// Module: PingOne Test User
// Description: Value object and lifecycle operations for a test identity.
// Purpose: Build user payloads and drive create/update/delete via IdentityApi.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! A [`PingOneUser`] is a provisioned test identity bound to one environment.
//! Role attributes are custom user attributes whose values are string arrays
//! (`p1asArgoCDRoles: ["argo-configteam"]`); they are emitted as top-level
//! payload fields.
//! Invariants:
//! - Role attributes are kept sorted so payloads are deterministic.
//! - The password never appears in `Debug` output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::endpoints::EnvironmentEndpoints;
use crate::error::PingOneError;
use crate::session::IdentityApi;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Password assigned to test users unless overridden.
pub const DEFAULT_PASSWORD: &str = "2FederateM0re!";

/// Email assigned to every test user.
pub const DEFAULT_EMAIL: &str = "do-not-reply@pingidentity.com";

/// Family name assigned to every test user.
const FAMILY_NAME: &str = "User";

/// Platform role granting read-only identity data access.
pub const PLATFORM_ROLE_NAME: &str = "Identity Data Read Only";

// ============================================================================
// SECTION: User
// ============================================================================

/// Test identity provisioned in a PingOne environment.
#[derive(Clone, PartialEq, Eq)]
pub struct PingOneUser {
    /// Unique username (suffixed with the tenant name by callers).
    username: String,
    /// Login password.
    password: String,
    /// Owning population, when not the environment default.
    population_id: Option<String>,
    /// Role attribute name to role values.
    roles: BTreeMap<String, Vec<String>>,
    /// Environment the user lives in.
    endpoints: EnvironmentEndpoints,
}

impl fmt::Debug for PingOneUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PingOneUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("population_id", &self.population_id)
            .field("roles", &self.roles)
            .field("environment_id", &self.endpoints.environment_id())
            .finish()
    }
}

impl PingOneUser {
    /// Creates a user with the default password, no population, and no roles.
    #[must_use]
    pub fn new(username: impl Into<String>, endpoints: EnvironmentEndpoints) -> Self {
        Self {
            username: username.into(),
            password: DEFAULT_PASSWORD.to_string(),
            population_id: None,
            roles: BTreeMap::new(),
            endpoints,
        }
    }

    /// Creates the shadow account a federated login produces for
    /// `external_username` in the tenant environment.
    #[must_use]
    pub fn shadow_of(
        external_username: &str,
        tenant: &str,
        endpoints: EnvironmentEndpoints,
    ) -> Self {
        Self::new(format!("{external_username}-{tenant}"), endpoints)
    }

    /// Overrides the password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Places the user in a population.
    #[must_use]
    pub fn with_population(mut self, population_id: impl Into<String>) -> Self {
        self.population_id = Some(population_id.into());
        self
    }

    /// Appends a value to a role attribute.
    #[must_use]
    pub fn with_role(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.roles.entry(attribute.into()).or_default().push(value.into());
        self
    }

    /// Replaces all role attributes.
    #[must_use]
    pub fn with_roles(mut self, roles: BTreeMap<String, Vec<String>>) -> Self {
        self.roles = roles;
        self
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns the population id, if any.
    #[must_use]
    pub fn population_id(&self) -> Option<&str> {
        self.population_id.as_deref()
    }

    /// Returns the role attributes.
    #[must_use]
    pub const fn roles(&self) -> &BTreeMap<String, Vec<String>> {
        &self.roles
    }

    /// Returns the environment endpoints.
    #[must_use]
    pub const fn endpoints(&self) -> &EnvironmentEndpoints {
        &self.endpoints
    }

    /// Builds the creation payload.
    #[must_use]
    pub fn payload(&self) -> Value {
        let mut body = Map::new();
        body.insert("email".to_string(), Value::String(DEFAULT_EMAIL.to_string()));
        body.insert(
            "name".to_string(),
            json!({ "given": self.username, "family": FAMILY_NAME }),
        );
        body.insert("username".to_string(), Value::String(self.username.clone()));
        body.insert(
            "password".to_string(),
            json!({ "value": self.password, "forceChange": false }),
        );
        self.extend_with_scoping(&mut body);
        Value::Object(body)
    }

    /// Builds the partial update payload (population and role attributes).
    ///
    /// The directory merges this payload into the stored user, so an update
    /// only adds or replaces the attributes this user carries. Role
    /// attributes absent here keep their stored values; clearing a role
    /// means deleting and recreating the user.
    #[must_use]
    pub fn update_payload(&self) -> Value {
        let mut body = Map::new();
        self.extend_with_scoping(&mut body);
        Value::Object(body)
    }

    /// Adds population and role attributes to a payload.
    fn extend_with_scoping(&self, body: &mut Map<String, Value>) {
        if let Some(population_id) = &self.population_id {
            body.insert("population".to_string(), json!({ "id": population_id }));
        }
        for (attribute, values) in &self.roles {
            body.insert(attribute.clone(), json!(values));
        }
    }

    /// Creates the user and optionally grants the platform read-only role
    /// scoped to the user's own environment. Returns the new user id.
    ///
    /// # Errors
    ///
    /// Returns [`PingOneError`] when creation or role assignment fails.
    pub fn create(
        &self,
        api: &dyn IdentityApi,
        add_platform_role: bool,
    ) -> Result<String, PingOneError> {
        let user_id = api.create_user(&self.endpoints, &self.payload())?;
        if add_platform_role {
            api.add_role_to_user(
                &self.endpoints,
                &self.username,
                PLATFORM_ROLE_NAME,
                self.endpoints.environment_id(),
            )?;
        }
        Ok(user_id)
    }

    /// Updates population and role attributes of the existing user. Roles
    /// are never removed; see [`PingOneUser::update_payload`].
    ///
    /// # Errors
    ///
    /// Returns [`PingOneError`] when the user is missing or the update fails.
    pub fn update(&self, api: &dyn IdentityApi) -> Result<(), PingOneError> {
        api.update_user(&self.endpoints, &self.username, &self.update_payload())
    }

    /// Deletes the user. Returns whether a user was removed.
    ///
    /// # Errors
    ///
    /// Returns [`PingOneError`] for failures other than a missing user.
    pub fn delete(&self, api: &dyn IdentityApi) -> Result<bool, PingOneError> {
        api.delete_user(&self.endpoints, &self.username)
    }
}
