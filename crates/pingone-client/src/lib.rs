// crates/pingone-client/src/lib.rs
// ============================================================================
// Module: PingOne Client Library
// Description: Identity API client used by console SSO test fixtures.
// Purpose: Provision, update, and remove test identities in PingOne.
// Dependencies: reqwest, serde, serde_json, thiserror, url
// ============================================================================

//! ## Overview
//! `pingone-client` wraps the subset of the PingOne management API the SSO
//! harness relies on: user lifecycle, population and role lookup, and role
//! assignment. The [`IdentityApi`] trait is the seam between fixtures and the
//! network so fixtures can be exercised against in-memory fakes.
//! Invariants:
//! - [`IdentityApi::delete_user`] is idempotent; a missing user is not an error.
//! - Passwords and access tokens never appear in error messages.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod auth;
pub mod endpoints;
pub mod error;
pub mod metadata;
pub mod session;
pub mod user;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use auth::AccessToken;
pub use auth::ClientCredentials;
pub use endpoints::DEFAULT_API_LOCATION;
pub use endpoints::DEFAULT_AUTH_LOCATION;
pub use endpoints::EnvironmentEndpoints;
pub use error::PingOneError;
pub use metadata::EnvironmentMetadata;
pub use session::IdentityApi;
pub use session::PingOneSession;
pub use session::USER_IMPORT_MEDIA_TYPE;
pub use user::DEFAULT_EMAIL;
pub use user::DEFAULT_PASSWORD;
pub use user::PLATFORM_ROLE_NAME;
pub use user::PingOneUser;
