// system-tests/src/lib.rs
// ============================================================================
// Module: System Tests Library
// Description: Shared configuration for live console SSO system-tests.
// Purpose: Expose artifact settings to the test binaries.
// Dependencies: console-sso
// ============================================================================

//! ## Overview
//! Live suites sign real identities into deployed consoles. This crate only
//! carries the settings that decide where their artifacts land; the suites
//! themselves live under `tests/` behind the `system-tests` feature.

pub mod config;
