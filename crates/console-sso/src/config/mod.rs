// crates/console-sso/src/config/mod.rs
// ============================================================================
// Module: Harness Configuration
// Description: Centralized configuration for console SSO runs.
// Purpose: Provide typed access to tenant, identity, and browser settings.
// Dependencies: pingone-client
// ============================================================================

//! ## Overview
//! Harness configuration is read once from environment variables into an
//! immutable [`HarnessConfig`] that is passed explicitly to every suite.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod env;

// ============================================================================
// SECTION: Tests
// ============================================================================


// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use env::ConfigError;
pub use env::DEFAULT_ENVIRONMENT;
pub use env::DEFAULT_PRIMARY_TENANT_DOMAIN;
pub use env::DEFAULT_WEBDRIVER_URL;
pub use env::HarnessConfig;
pub use env::HarnessEnv;
pub use env::load_catalog;
pub use env::load_primary_tenant_domain;
pub use env::parse_bool_env;
pub use env::parse_timeout_seconds;
pub use env::read_env_nonempty;
pub use env::read_env_strict;
