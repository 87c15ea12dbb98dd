// crates/console-sso/src/config/env.rs
// ============================================================================
// Module: Harness Environment
// Description: Environment-backed configuration for console SSO runs.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: pingone-client, thiserror
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8 and empty values fail closed. The primary
//! environment id comes from `PINGONE_ENVIRONMENT_ID` or, failing that, from
//! the tenant metadata document named by `PINGONE_ENV_METADATA_FILE`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use pingone_client::ClientCredentials;
use pingone_client::DEFAULT_API_LOCATION;
use pingone_client::DEFAULT_AUTH_LOCATION;
use pingone_client::EnvironmentEndpoints;
use pingone_client::EnvironmentMetadata;
use thiserror::Error;

use crate::console::CatalogError;
use crate::console::ConsoleCatalog;
use crate::console::ResolvedConsole;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment name used for role templating when `ENV` is unset.
pub const DEFAULT_ENVIRONMENT: &str = "dev";

/// WebDriver endpoint used when `WEBDRIVER_URL` is unset.
pub const DEFAULT_WEBDRIVER_URL: &str = "http://127.0.0.1:9515";

/// Domain checked by the ingress pre-check when unset.
pub const DEFAULT_PRIMARY_TENANT_DOMAIN: &str = "ping-demo.com";

/// PingOne console URL template; `{environment_id}` is substituted.
const DEFAULT_PINGONE_CONSOLE_URL: &str =
    "https://console-staging.pingone.com/?env={environment_id}#home?nav=home";

/// Environment keys for harness configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessEnv {
    /// Tenant DNS domain.
    TenantDomain,
    /// Tenant name (also the population name).
    TenantName,
    /// Environment name for role templating.
    Environment,
    /// Environment type (`customer-hub` skips some consoles).
    EnvType,
    /// Federated external identity environment id.
    ExternalIdpEnvironmentId,
    /// Primary PingOne environment id.
    PingOneEnvironmentId,
    /// Tenant environment metadata document.
    PingOneEnvMetadataFile,
    /// Management API root.
    PingOneApiLocation,
    /// Authentication root.
    PingOneAuthLocation,
    /// Worker application client id.
    PingOneClientId,
    /// Worker application client secret.
    PingOneClientSecret,
    /// Environment hosting the worker application.
    PingOneWorkerEnvironmentId,
    /// PingOne console login URL.
    PingOneConsoleUrl,
    /// WebDriver endpoint.
    WebDriverUrl,
    /// Domain checked by the ingress pre-check.
    PrimaryTenantDomain,
    /// Minimum element visibility timeout in seconds (positive integer).
    TimeoutSeconds,
    /// JSON-lines event log path.
    EventLog,
    /// TOML console catalog path.
    CatalogFile,
}

impl HarnessEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TenantDomain => "TENANT_DOMAIN",
            Self::TenantName => "TENANT_NAME",
            Self::Environment => "ENV",
            Self::EnvType => "ENV_TYPE",
            Self::ExternalIdpEnvironmentId => "EXTERNAL_IDP_ENVIRONMENT_ID",
            Self::PingOneEnvironmentId => "PINGONE_ENVIRONMENT_ID",
            Self::PingOneEnvMetadataFile => "PINGONE_ENV_METADATA_FILE",
            Self::PingOneApiLocation => "PINGONE_API_LOCATION",
            Self::PingOneAuthLocation => "PINGONE_AUTH_LOCATION",
            Self::PingOneClientId => "PINGONE_CLIENT_ID",
            Self::PingOneClientSecret => "PINGONE_CLIENT_SECRET",
            Self::PingOneWorkerEnvironmentId => "PINGONE_WORKER_ENVIRONMENT_ID",
            Self::PingOneConsoleUrl => "PINGONE_CONSOLE_URL",
            Self::WebDriverUrl => "WEBDRIVER_URL",
            Self::PrimaryTenantDomain => "PRIMARY_TENANT_DOMAIN",
            Self::TimeoutSeconds => "CONSOLE_SSO_TIMEOUT_SEC",
            Self::EventLog => "CONSOLE_SSO_EVENT_LOG",
            Self::CatalogFile => "CONSOLE_SSO_CATALOG_FILE",
        }
    }

    /// Returns every key in declaration order.
    #[must_use]
    pub const fn all() -> [Self; 18] {
        [
            Self::TenantDomain,
            Self::TenantName,
            Self::Environment,
            Self::EnvType,
            Self::ExternalIdpEnvironmentId,
            Self::PingOneEnvironmentId,
            Self::PingOneEnvMetadataFile,
            Self::PingOneApiLocation,
            Self::PingOneAuthLocation,
            Self::PingOneClientId,
            Self::PingOneClientSecret,
            Self::PingOneWorkerEnvironmentId,
            Self::PingOneConsoleUrl,
            Self::WebDriverUrl,
            Self::PrimaryTenantDomain,
            Self::TimeoutSeconds,
            Self::EventLog,
            Self::CatalogFile,
        ]
    }

    /// Reads the key, rejecting invalid UTF-8 and empty values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the value is malformed.
    pub fn read(self) -> Result<Option<String>, ConfigError> {
        read_env_nonempty(self.as_str())
    }

    /// Reads a required key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when the key is unset.
    pub fn require(self) -> Result<String, ConfigError> {
        self.read()?.ok_or(ConfigError::Missing(self.as_str()))
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is unset.
    #[error("{0} must be set")]
    Missing(&'static str),
    /// A variable is set to an unusable value.
    #[error("{name}: {message}")]
    Invalid {
        /// Variable name.
        name: String,
        /// Validation message.
        message: String,
    },
    /// The environment metadata document is unusable.
    #[error("environment metadata: {0}")]
    Metadata(String),
    /// The console catalog is unusable.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Builds an invalid-value error.
fn invalid(name: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name: name.to_string(),
        message: message.into(),
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Immutable harness configuration.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Tenant DNS domain.
    pub tenant_domain: String,
    /// Tenant name; also the tenant population name and username suffix.
    pub tenant_name: String,
    /// Environment name for role templating.
    pub environment: String,
    /// Environment type.
    pub env_type: Option<String>,
    /// Primary PingOne environment id.
    pub pingone_environment_id: String,
    /// External identity environment id.
    pub external_idp_environment_id: String,
    /// Management API root.
    pub api_location: String,
    /// Authentication root.
    pub auth_location: String,
    /// Worker credentials, when provided.
    pub credentials: Option<ClientCredentials>,
    /// PingOne console login URL.
    pub pingone_console_url: String,
    /// WebDriver endpoint.
    pub webdriver_url: String,
    /// Domain checked by the ingress pre-check.
    pub primary_tenant_domain: String,
    /// Minimum element visibility timeout.
    pub element_timeout: Option<Duration>,
    /// JSON-lines event log path.
    pub event_log: Option<PathBuf>,
    /// Console catalog in effect.
    pub catalog: ConsoleCatalog,
    /// Hostname overrides keyed by variable name.
    pub hostname_overrides: BTreeMap<String, String>,
}

impl HarnessConfig {
    /// Creates a configuration with defaults for everything but the tenant
    /// and environment identifiers.
    #[must_use]
    pub fn new(
        tenant_domain: impl Into<String>,
        tenant_name: impl Into<String>,
        pingone_environment_id: impl Into<String>,
        external_idp_environment_id: impl Into<String>,
    ) -> Self {
        let pingone_environment_id = pingone_environment_id.into();
        Self {
            tenant_domain: tenant_domain.into(),
            tenant_name: tenant_name.into(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            env_type: None,
            pingone_console_url: default_console_url(&pingone_environment_id),
            pingone_environment_id,
            external_idp_environment_id: external_idp_environment_id.into(),
            api_location: DEFAULT_API_LOCATION.to_string(),
            auth_location: DEFAULT_AUTH_LOCATION.to_string(),
            credentials: None,
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            primary_tenant_domain: DEFAULT_PRIMARY_TENANT_DOMAIN.to_string(),
            element_timeout: None,
            event_log: None,
            catalog: ConsoleCatalog::builtin(),
            hostname_overrides: BTreeMap::new(),
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required value is missing, a value is
    /// not valid UTF-8, is empty, or fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let tenant_domain = HarnessEnv::TenantDomain.require()?;
        let tenant_name = HarnessEnv::TenantName.require()?;
        let external_idp_environment_id = HarnessEnv::ExternalIdpEnvironmentId.require()?;
        let pingone_environment_id = load_environment_id()?;
        let mut config = Self::new(
            tenant_domain,
            tenant_name,
            pingone_environment_id,
            external_idp_environment_id,
        );
        if let Some(environment) = HarnessEnv::Environment.read()? {
            config.environment = environment;
        }
        config.env_type = HarnessEnv::EnvType.read()?;
        if let Some(api_location) = HarnessEnv::PingOneApiLocation.read()? {
            config.api_location = parse_http_url(HarnessEnv::PingOneApiLocation, &api_location)?;
        }
        if let Some(auth_location) = HarnessEnv::PingOneAuthLocation.read()? {
            config.auth_location =
                parse_http_url(HarnessEnv::PingOneAuthLocation, &auth_location)?;
        }
        config.credentials = load_credentials(&config)?;
        if let Some(console_url) = HarnessEnv::PingOneConsoleUrl.read()? {
            config.pingone_console_url =
                parse_http_url(HarnessEnv::PingOneConsoleUrl, &console_url)?;
        }
        if let Some(webdriver_url) = HarnessEnv::WebDriverUrl.read()? {
            config.webdriver_url = parse_http_url(HarnessEnv::WebDriverUrl, &webdriver_url)?;
        }
        config.primary_tenant_domain = load_primary_tenant_domain()?;
        config.element_timeout = HarnessEnv::TimeoutSeconds
            .read()?
            .map(|value| parse_timeout_seconds(HarnessEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        config.event_log = HarnessEnv::EventLog.read()?.map(PathBuf::from);
        config.catalog = load_catalog()?;
        config.hostname_overrides = load_hostname_overrides(&config.catalog)?;
        Ok(config)
    }

    /// Returns the primary environment endpoints.
    #[must_use]
    pub fn primary_endpoints(&self) -> EnvironmentEndpoints {
        EnvironmentEndpoints::new(self.api_location.clone(), self.pingone_environment_id.clone())
    }

    /// Returns the external identity environment endpoints.
    #[must_use]
    pub fn external_endpoints(&self) -> EnvironmentEndpoints {
        EnvironmentEndpoints::new(
            self.api_location.clone(),
            self.external_idp_environment_id.clone(),
        )
    }

    /// Returns the PingOne sign-off endpoint of the primary environment.
    #[must_use]
    pub fn signoff_url(&self) -> String {
        format!(
            "{}/{}/as/signoff",
            self.auth_location.trim_end_matches('/'),
            self.pingone_environment_id
        )
    }

    /// Resolves a catalog console for this tenant.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownConsole`] when the name is not in the catalog.
    pub fn console(&self, name: &str) -> Result<ResolvedConsole, CatalogError> {
        let profile = self.catalog.get(name)?;
        let hostname_override = self.hostname_overrides.get(&profile.hostname_env);
        Ok(profile.resolve(
            &self.tenant_domain,
            &self.environment,
            hostname_override.map(String::as_str),
        ))
    }

    /// Returns true when the named console is not deployed in this environment.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownConsole`] when the name is not in the catalog.
    pub fn console_skipped(&self, name: &str) -> Result<bool, CatalogError> {
        Ok(self.catalog.get(name)?.skipped_for(self.env_type.as_deref()))
    }
}

// ============================================================================
// SECTION: Loaders
// ============================================================================

/// Substitutes the environment id into the default console URL.
fn default_console_url(environment_id: &str) -> String {
    DEFAULT_PINGONE_CONSOLE_URL.replace("{environment_id}", environment_id)
}

/// Resolves the primary environment id from env or the metadata document.
fn load_environment_id() -> Result<String, ConfigError> {
    if let Some(environment_id) = HarnessEnv::PingOneEnvironmentId.read()? {
        return Ok(environment_id);
    }
    let Some(path) = HarnessEnv::PingOneEnvMetadataFile.read()? else {
        return Err(ConfigError::Missing(HarnessEnv::PingOneEnvironmentId.as_str()));
    };
    EnvironmentMetadata::from_file(Path::new(&path))
        .map(|metadata| metadata.environment_id().to_string())
        .map_err(|err| ConfigError::Metadata(err.to_string()))
}

/// Reads worker credentials; both id and secret must be set together.
fn load_credentials(config: &HarnessConfig) -> Result<Option<ClientCredentials>, ConfigError> {
    let client_id = HarnessEnv::PingOneClientId.read()?;
    let client_secret = HarnessEnv::PingOneClientSecret.read()?;
    match (client_id, client_secret) {
        (None, None) => Ok(None),
        (Some(client_id), Some(client_secret)) => {
            let environment_id = HarnessEnv::PingOneWorkerEnvironmentId
                .read()?
                .unwrap_or_else(|| config.pingone_environment_id.clone());
            Ok(Some(ClientCredentials {
                auth_location: config.auth_location.clone(),
                environment_id,
                client_id,
                client_secret,
            }))
        }
        (Some(_), None) => Err(ConfigError::Missing(HarnessEnv::PingOneClientSecret.as_str())),
        (None, Some(_)) => Err(ConfigError::Missing(HarnessEnv::PingOneClientId.as_str())),
    }
}

/// Reads the pre-check domain, falling back to the default.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the value is malformed.
pub fn load_primary_tenant_domain() -> Result<String, ConfigError> {
    Ok(HarnessEnv::PrimaryTenantDomain
        .read()?
        .unwrap_or_else(|| DEFAULT_PRIMARY_TENANT_DOMAIN.to_string()))
}

/// Reads the catalog file when configured.
///
/// # Errors
///
/// Returns [`ConfigError::Catalog`] when the file cannot be loaded.
pub fn load_catalog() -> Result<ConsoleCatalog, ConfigError> {
    let path = HarnessEnv::CatalogFile.read()?.map(PathBuf::from);
    Ok(ConsoleCatalog::load(path.as_deref())?)
}

/// Reads the hostname override declared by each catalog console.
fn load_hostname_overrides(
    catalog: &ConsoleCatalog,
) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut overrides = BTreeMap::new();
    for console in catalog.consoles() {
        if let Some(value) = read_env_nonempty(&console.hostname_env)? {
            let url = url::Url::parse(&value)
                .map_err(|err| invalid(&console.hostname_env, format!("invalid url: {err}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(invalid(&console.hostname_env, "must be an http or https url"));
            }
            overrides.insert(console.hostname_env.clone(), value);
        }
    }
    Ok(overrides)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates an http(s) URL value.
fn parse_http_url(key: HarnessEnv, raw: &str) -> Result<String, ConfigError> {
    let name = key.as_str();
    let url = url::Url::parse(raw.trim()).map_err(|err| invalid(name, format!("invalid url: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(name, "must be an http or https url"));
    }
    Ok(raw.trim().to_string())
}

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, ConfigError> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| invalid(name, "must be valid UTF-8"))
    })
}

/// Reads an environment variable and rejects empty values.
///
/// # Errors
///
/// Returns an error when the variable is set but empty or whitespace.
pub fn read_env_nonempty(name: &str) -> Result<Option<String>, ConfigError> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => Err(invalid(name, "must not be empty")),
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}

/// Parses a positive timeout value from an environment variable string.
///
/// # Errors
///
/// Returns an error when the value is missing, non-numeric, or zero.
pub fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid(name, "must be a positive integer number of seconds"));
    }
    let secs: u64 = trimmed
        .parse()
        .map_err(|_| invalid(name, "must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(invalid(name, "must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

/// Parses a boolean environment variable; unset means false.
///
/// # Errors
///
/// Returns an error when the value is not a recognized boolean literal.
pub fn parse_bool_env(name: &str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(false);
    };
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        return Ok(true);
    }
    if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
        return Ok(false);
    }
    Err(invalid(name, "must be 1, 0, true, or false"))
}
