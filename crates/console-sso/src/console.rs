// crates/console-sso/src/console.rs
// ============================================================================
// Module: Console Catalog
// Description: Per-application console profiles and their resolution.
// Purpose: Describe each console's URL, granting roles, and page markers.
// Dependencies: serde, toml, thiserror
// ============================================================================

//! ## Overview
//! A [`ConsoleProfile`] is pure data: where the console lives, which role
//! attributes grant access, and which markers indicate granted or denied
//! access. Profiles resolve against a tenant into a [`ResolvedConsole`].
//! The built-in catalog covers the GitOps UI, log viewer, access gateway, and
//! federation server admin consoles; a TOML file can replace it.
//!
//! Role values may contain `{environment}`, substituted with the environment
//! name at resolution time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::webdriver::Locator;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Placeholder substituted with the environment name in role values.
pub const ENVIRONMENT_PLACEHOLDER: &str = "{environment}";

/// Environment type on which some consoles are not deployed.
pub const CUSTOMER_HUB_ENV_TYPE: &str = "customer-hub";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or querying a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("read catalog {path}: {message}")]
    Io {
        /// Catalog path.
        path: String,
        /// I/O error message.
        message: String,
    },
    /// The catalog is not valid TOML for the expected shape.
    #[error("parse catalog: {0}")]
    Parse(String),
    /// The catalog parsed but violates an invariant.
    #[error("invalid catalog: {0}")]
    Invalid(String),
    /// No console with the requested name exists.
    #[error("unknown console: {0}")]
    UnknownConsole(String),
}

// ============================================================================
// SECTION: Profile
// ============================================================================

/// Declarative description of one admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleProfile {
    /// Short console name (`argocd`, `opensearch`, ...).
    pub name: String,
    /// Environment variable overriding the public base URL.
    pub hostname_env: String,
    /// Subdomain under the tenant domain (`argocd`, `logs`, ...).
    pub subdomain: String,
    /// Path appended to the base URL to reach the login entry point.
    #[serde(default)]
    pub path: String,
    /// Role attributes that grant access.
    pub roles: BTreeMap<String, Vec<String>>,
    /// Role attributes that grant access from any population.
    #[serde(default)]
    pub any_population_roles: Option<BTreeMap<String, Vec<String>>>,
    /// Markers shown when access is granted (any one suffices).
    pub granted: Vec<Locator>,
    /// Markers shown when access is denied (any one suffices).
    pub denied: Vec<Locator>,
    /// Entries of the application list; access requires at least one.
    #[serde(default)]
    pub app_entry: Option<Locator>,
    /// Whether local users also receive the platform read-only role.
    #[serde(default = "default_true")]
    pub platform_role: bool,
    /// Whether the console is absent from customer-hub environments.
    #[serde(default)]
    pub skip_on_customer_hub: bool,
}

/// Serde default for boolean fields that default to true.
const fn default_true() -> bool {
    true
}

impl ConsoleProfile {
    /// Returns true when the console should be skipped for `env_type`.
    #[must_use]
    pub fn skipped_for(&self, env_type: Option<&str>) -> bool {
        self.skip_on_customer_hub && env_type == Some(CUSTOMER_HUB_ENV_TYPE)
    }

    /// Resolves the profile for a tenant.
    ///
    /// `hostname_override` is a full base URL (scheme included) and replaces
    /// `https://{subdomain}.{tenant_domain}`.
    #[must_use]
    pub fn resolve(
        &self,
        tenant_domain: &str,
        environment: &str,
        hostname_override: Option<&str>,
    ) -> ResolvedConsole {
        let base_url = hostname_override.map_or_else(
            || format!("https://{}.{tenant_domain}", self.subdomain),
            |value| value.trim_end_matches('/').to_string(),
        );
        ResolvedConsole {
            name: self.name.clone(),
            console_url: format!("{base_url}{}", self.path),
            base_url,
            roles: substitute_roles(&self.roles, environment),
            any_population_roles: self
                .any_population_roles
                .as_ref()
                .map(|roles| substitute_roles(roles, environment)),
            granted: self.granted.clone(),
            denied: self.denied.clone(),
            app_entry: self.app_entry.clone(),
            platform_role: self.platform_role,
        }
    }

    /// Checks structural invariants.
    fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |message: &str| CatalogError::Invalid(format!("{}: {message}", self.name));
        if self.name.trim().is_empty() {
            return Err(CatalogError::Invalid("console name must not be empty".to_string()));
        }
        if self.subdomain.trim().is_empty() {
            return Err(invalid("subdomain must not be empty"));
        }
        if self.hostname_env.trim().is_empty() {
            return Err(invalid("hostname_env must not be empty"));
        }
        if !self.path.is_empty() && !self.path.starts_with('/') {
            return Err(invalid("path must start with '/'"));
        }
        if self.roles.is_empty() || self.roles.values().any(Vec::is_empty) {
            return Err(invalid("roles must name at least one value per attribute"));
        }
        if self.granted.is_empty() {
            return Err(invalid("granted markers must not be empty"));
        }
        if self.denied.is_empty() && self.app_entry.is_none() {
            return Err(invalid("denied markers or an application list entry are required"));
        }
        Ok(())
    }
}

/// Replaces the environment placeholder in every role value.
fn substitute_roles(
    roles: &BTreeMap<String, Vec<String>>,
    environment: &str,
) -> BTreeMap<String, Vec<String>> {
    roles
        .iter()
        .map(|(attribute, values)| {
            let values = values
                .iter()
                .map(|value| value.replace(ENVIRONMENT_PLACEHOLDER, environment))
                .collect();
            (attribute.clone(), values)
        })
        .collect()
}

// ============================================================================
// SECTION: Resolved Console
// ============================================================================

/// Console profile bound to a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConsole {
    /// Console name.
    pub name: String,
    /// Public base URL.
    pub base_url: String,
    /// Login entry point.
    pub console_url: String,
    /// Granting role attributes with placeholders substituted.
    pub roles: BTreeMap<String, Vec<String>>,
    /// Roles granting access from any population, substituted.
    pub any_population_roles: Option<BTreeMap<String, Vec<String>>>,
    /// Granted markers.
    pub granted: Vec<Locator>,
    /// Denied markers.
    pub denied: Vec<Locator>,
    /// Application list entry locator.
    pub app_entry: Option<Locator>,
    /// Whether local users receive the platform role.
    pub platform_role: bool,
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Ordered set of console profiles.
///
/// # Invariants
/// - Console names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleCatalog {
    /// Profiles in declaration order.
    #[serde(rename = "console")]
    consoles: Vec<ConsoleProfile>,
}

impl ConsoleCatalog {
    /// Creates a validated catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Invalid`] for duplicate names or invalid profiles.
    pub fn new(consoles: Vec<ConsoleProfile>) -> Result<Self, CatalogError> {
        let catalog = Self {
            consoles,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Returns the built-in catalog.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            consoles: vec![argocd(), opensearch(), pingaccess(), pingfederate()],
        }
    }

    /// Parses a catalog from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Self =
            toml::from_str(raw).map_err(|err| CatalogError::Parse(err.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Reads a catalog from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the file cannot be read or is invalid.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|err| CatalogError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    /// Loads from `path` when given, otherwise returns the built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the file cannot be loaded.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        path.map_or_else(|| Ok(Self::builtin()), Self::from_file)
    }

    /// Renders the catalog as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] when serialization fails.
    pub fn to_toml_string(&self) -> Result<String, CatalogError> {
        toml::to_string(self).map_err(|err| CatalogError::Parse(err.to_string()))
    }

    /// Returns every profile in order.
    #[must_use]
    pub fn consoles(&self) -> &[ConsoleProfile] {
        &self.consoles
    }

    /// Returns console names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.consoles.iter().map(|console| console.name.as_str()).collect()
    }

    /// Looks up a profile by name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownConsole`] when no profile matches.
    pub fn get(&self, name: &str) -> Result<&ConsoleProfile, CatalogError> {
        self.consoles
            .iter()
            .find(|console| console.name == name)
            .ok_or_else(|| CatalogError::UnknownConsole(name.to_string()))
    }

    /// Checks catalog invariants.
    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = BTreeSet::new();
        for console in &self.consoles {
            console.validate()?;
            if !seen.insert(console.name.as_str()) {
                return Err(CatalogError::Invalid(format!("duplicate console {}", console.name)));
            }
        }
        Ok(())
    }
}

impl Default for ConsoleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// SECTION: Built-in Profiles
// ============================================================================

/// Builds a single-attribute role map.
fn role(attribute: &str, value: &str) -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([(attribute.to_string(), vec![value.to_string()])])
}

/// GitOps UI.
fn argocd() -> ConsoleProfile {
    ConsoleProfile {
        name: "argocd".to_string(),
        hostname_env: "ARGOCD_PUBLIC_HOSTNAME".to_string(),
        subdomain: "argocd".to_string(),
        path: "/auth/login".to_string(),
        roles: role("p1asArgoCDRoles", "argo-configteam"),
        any_population_roles: Some(role("p1asPingRoles", "argo-pingbeluga")),
        granted: vec![Locator::xpath("//span[contains(text(), 'Applications')]")],
        denied: vec![Locator::xpath("//h4[contains(text(), 'No applications available to you')]")],
        app_entry: Some(Locator::class_name("applications-list__entry")),
        platform_role: true,
        skip_on_customer_hub: false,
    }
}

/// Log viewer.
fn opensearch() -> ConsoleProfile {
    ConsoleProfile {
        name: "opensearch".to_string(),
        hostname_env: "OPENSEARCH_PUBLIC_HOSTNAME".to_string(),
        subdomain: "logs".to_string(),
        path: "/auth/openid/login".to_string(),
        roles: role("p1asOpensearchRoles", "os-configteam"),
        any_population_roles: None,
        granted: vec![Locator::xpath("//h4[contains(text(), 'Select your tenant')]")],
        denied: vec![Locator::xpath("//h3[contains(text(), 'Missing Role')]")],
        app_entry: None,
        platform_role: true,
        skip_on_customer_hub: false,
    }
}

/// Access gateway admin console.
fn pingaccess() -> ConsoleProfile {
    ConsoleProfile {
        name: "pingaccess".to_string(),
        hostname_env: "PA_ADMIN_PUBLIC_HOSTNAME".to_string(),
        subdomain: "pingaccess-admin".to_string(),
        path: String::new(),
        roles: role("p1asPingAccessRoles", "{environment}-pa-audit"),
        any_population_roles: None,
        granted: vec![Locator::xpath("//div[contains(text(), 'Applications')]")],
        denied: vec![Locator::xpath("//pre[contains(text(), 'Access Denied')]")],
        app_entry: None,
        platform_role: true,
        skip_on_customer_hub: true,
    }
}

/// Federation server admin console.
fn pingfederate() -> ConsoleProfile {
    ConsoleProfile {
        name: "pingfederate".to_string(),
        hostname_env: "PINGFEDERATE_ADMIN_PUBLIC_HOSTNAME".to_string(),
        subdomain: "pingfederate-admin".to_string(),
        path: String::new(),
        roles: role("p1asPingFederateRoles", "{environment}-pf-roleadmin"),
        any_population_roles: None,
        granted: vec![
            Locator::xpath("//div[contains(text(), 'Welcome to PingFederate')]"),
            Locator::xpath("//div[contains(text(), 'Cluster')]"),
        ],
        denied: vec![Locator::xpath(
            "//span[contains(text(), 'An error occurred while trying to login with OIDC')]",
        )],
        app_entry: None,
        platform_role: true,
        skip_on_customer_hub: true,
    }
}
