// crates/console-sso/src/fixture.rs
// ============================================================================
// Module: Suite Fixture
// Description: Suite-scoped test identities with guaranteed teardown.
// Purpose: Provision users for a suite and delete every one of them afterward.
// Dependencies: pingone-client, thiserror
// ============================================================================

//! ## Overview
//! A [`SuiteFixture`] resolves the tenant and `Default` populations, creates
//! the shared no-role user, and keeps a registry of every identity it
//! provisions. Registered users are deleted by [`SuiteFixture::teardown`], or
//! by `Drop` when teardown was not called explicitly.
//! Invariants:
//! - Provisioning deletes leftovers from a previous run before creating.
//! - A user is registered before its creation is attempted, so a partial
//!   create is still cleaned up.
//! - Deletion failures are collected and reported, never dropped silently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use pingone_client::EnvironmentEndpoints;
use pingone_client::IdentityApi;
use pingone_client::PingOneError;
use pingone_client::PingOneUser;
use thiserror::Error;

use crate::config::HarnessConfig;
use crate::events::EventKind;
use crate::events::EventSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name of the environment's default population.
pub const DEFAULT_POPULATION_NAME: &str = "Default";

/// Username of the shared user without console roles.
#[must_use]
pub fn no_role_username(tenant: &str) -> String {
    format!("no-role-{tenant}")
}

/// Username of a console's local test user.
#[must_use]
pub fn local_username(console: &str, tenant: &str) -> String {
    format!("sso-{console}-test-user-{tenant}")
}

/// Username of a console's external identity test user.
#[must_use]
pub fn external_username(console: &str, tenant: &str) -> String {
    format!("{console}-external-idp-test-user-{tenant}")
}

/// Username of a console's external identity user without console roles.
#[must_use]
pub fn external_no_role_username(console: &str, tenant: &str) -> String {
    format!("{console}-external-idp-no-role-user-{tenant}")
}

/// Username of the external identity user shared by every console.
#[must_use]
pub fn shared_external_username(tenant: &str) -> String {
    format!("external-idp-test-user-{tenant}")
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while provisioning fixture identities.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// A population lookup failed.
    #[error("resolve population {name}: {source}")]
    Population {
        /// Population name.
        name: String,
        /// Identity API error.
        source: PingOneError,
    },
    /// A user could not be provisioned.
    #[error("provision user {username}: {source}")]
    Provision {
        /// Username.
        username: String,
        /// Identity API error.
        source: PingOneError,
    },
    /// A user could not be updated.
    #[error("update user {username}: {source}")]
    Update {
        /// Username.
        username: String,
        /// Identity API error.
        source: PingOneError,
    },
    /// A user could not be deleted.
    #[error("delete user {username}: {source}")]
    Delete {
        /// Username.
        username: String,
        /// Identity API error.
        source: PingOneError,
    },
}

// ============================================================================
// SECTION: Teardown Report
// ============================================================================

/// One failed deletion during teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    /// Username.
    pub username: String,
    /// Owning environment.
    pub environment_id: String,
    /// Error message.
    pub error: String,
}

/// Result of deleting every registered user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Users removed.
    pub deleted: Vec<String>,
    /// Users that were already gone.
    pub absent: Vec<String>,
    /// Users whose deletion failed.
    pub failures: Vec<DeleteFailure>,
}

impl TeardownReport {
    /// Returns true when every deletion succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for TeardownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "deleted {}, already absent {}, failed {}",
            self.deleted.len(),
            self.absent.len(),
            self.failures.len()
        )?;
        for failure in &self.failures {
            write!(
                f,
                "; {} in {}: {}",
                failure.username, failure.environment_id, failure.error
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Fixture
// ============================================================================

/// Suite-scoped identity state.
pub struct SuiteFixture {
    /// Identity API handle.
    identity: Arc<dyn IdentityApi>,
    /// Event destination.
    events: Arc<dyn EventSink>,
    /// Tenant name used as the username suffix.
    tenant: String,
    /// Primary environment.
    primary: EnvironmentEndpoints,
    /// External identity environment.
    external: EnvironmentEndpoints,
    /// Tenant population id.
    tenant_population_id: String,
    /// `Default` population id.
    default_population_id: String,
    /// Shared user without console roles.
    no_role_user: PingOneUser,
    /// Users to delete at teardown, in registration order.
    registered: Vec<PingOneUser>,
    /// Set once teardown has run.
    torn_down: bool,
}

impl fmt::Debug for SuiteFixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteFixture")
            .field("tenant", &self.tenant)
            .field("tenant_population_id", &self.tenant_population_id)
            .field("default_population_id", &self.default_population_id)
            .field("registered", &self.registered.len())
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}

impl SuiteFixture {
    /// Resolves populations and provisions the no-role user.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when a lookup or provisioning step fails; any
    /// user already provisioned is deleted before returning.
    pub fn set_up(
        config: &HarnessConfig,
        identity: Arc<dyn IdentityApi>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, FixtureError> {
        let primary = config.primary_endpoints();
        let resolve = |name: &str| {
            identity.find_population_id(&primary, name).map_err(|source| {
                FixtureError::Population {
                    name: name.to_string(),
                    source,
                }
            })
        };
        let tenant_population_id = resolve(&config.tenant_name)?;
        let default_population_id = resolve(DEFAULT_POPULATION_NAME)?;
        let no_role_user =
            PingOneUser::new(no_role_username(&config.tenant_name), primary.clone())
                .with_population(tenant_population_id.clone());
        let mut fixture = Self {
            identity,
            events,
            tenant: config.tenant_name.clone(),
            primary,
            external: config.external_endpoints(),
            tenant_population_id,
            default_population_id,
            no_role_user: no_role_user.clone(),
            registered: Vec::new(),
            torn_down: false,
        };
        fixture.provision(no_role_user, true)?;
        Ok(fixture)
    }

    /// Returns the tenant name.
    #[must_use]
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Returns the primary environment endpoints.
    #[must_use]
    pub const fn primary(&self) -> &EnvironmentEndpoints {
        &self.primary
    }

    /// Returns the external identity environment endpoints.
    #[must_use]
    pub const fn external(&self) -> &EnvironmentEndpoints {
        &self.external
    }

    /// Returns the tenant population id.
    #[must_use]
    pub fn tenant_population_id(&self) -> &str {
        &self.tenant_population_id
    }

    /// Returns the `Default` population id.
    #[must_use]
    pub fn default_population_id(&self) -> &str {
        &self.default_population_id
    }

    /// Returns the shared user without console roles.
    #[must_use]
    pub const fn no_role_user(&self) -> &PingOneUser {
        &self.no_role_user
    }

    /// Returns the usernames registered for teardown.
    #[must_use]
    pub fn registered(&self) -> Vec<&str> {
        self.registered.iter().map(PingOneUser::username).collect()
    }

    /// Deletes any leftover copy of `user`, creates it, and registers it for
    /// teardown.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when deletion or creation fails.
    pub fn provision(
        &mut self,
        user: PingOneUser,
        add_platform_role: bool,
    ) -> Result<(), FixtureError> {
        self.delete(&user)?;
        self.register(user.clone());
        user.create(self.identity.as_ref(), add_platform_role).map_err(|source| {
            FixtureError::Provision {
                username: user.username().to_string(),
                source,
            }
        })?;
        self.events.emit(EventKind::UserProvisioned {
            username: user.username().to_string(),
            environment_id: user.endpoints().environment_id().to_string(),
            platform_role: add_platform_role,
        });
        Ok(())
    }

    /// Updates population and role attributes of an existing user.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Update`] when the update fails.
    pub fn update(&mut self, user: &PingOneUser) -> Result<(), FixtureError> {
        user.update(self.identity.as_ref()).map_err(|source| FixtureError::Update {
            username: user.username().to_string(),
            source,
        })
    }

    /// Registers a user for teardown without creating it (shadow accounts
    /// created by federated logins).
    pub fn register(&mut self, user: PingOneUser) {
        let position = self.registered.iter().position(|existing| {
            existing.username() == user.username()
                && existing.endpoints().environment_id() == user.endpoints().environment_id()
        });
        match position {
            Some(index) => self.registered[index] = user,
            None => self.registered.push(user),
        }
    }

    /// Deletes a user if it exists. Returns whether one was removed.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Delete`] for failures other than a missing user.
    pub fn delete(&self, user: &PingOneUser) -> Result<bool, FixtureError> {
        let environment_id = user.endpoints().environment_id().to_string();
        match user.delete(self.identity.as_ref()) {
            Ok(removed) => {
                self.events.emit(EventKind::UserDeleted {
                    username: user.username().to_string(),
                    environment_id,
                    removed,
                });
                Ok(removed)
            }
            Err(source) => {
                self.events.emit(EventKind::UserDeleteFailed {
                    username: user.username().to_string(),
                    environment_id,
                    error: source.to_string(),
                });
                Err(FixtureError::Delete {
                    username: user.username().to_string(),
                    source,
                })
            }
        }
    }

    /// Deletes every registered user, newest first, and reports the results.
    /// Calling it again returns an empty report.
    pub fn teardown(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();
        if self.torn_down {
            return report;
        }
        self.torn_down = true;
        let users = std::mem::take(&mut self.registered);
        for user in users.iter().rev() {
            match self.delete(user) {
                Ok(true) => report.deleted.push(user.username().to_string()),
                Ok(false) => report.absent.push(user.username().to_string()),
                Err(err) => report.failures.push(DeleteFailure {
                    username: user.username().to_string(),
                    environment_id: user.endpoints().environment_id().to_string(),
                    error: err.to_string(),
                }),
            }
        }
        report
    }
}

impl Drop for SuiteFixture {
    fn drop(&mut self) {
        // Failures are already recorded as UserDeleteFailed events.
        let _ = self.teardown();
    }
}
