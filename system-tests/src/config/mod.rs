// system-tests/src/config/mod.rs
// ============================================================================
// Module: System Test Configuration
// Description: Environment-driven settings for system-test artifacts.
// Purpose: Provide typed access to run-root and overwrite policy.
// Dependencies: console-sso
// ============================================================================

//! ## Overview
//! System-test settings are read from environment variables so CI can pin
//! artifact locations without code changes.

mod env;


pub use env::SystemTestConfig;
pub use env::SystemTestEnv;
