// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for live console SSO system-tests.
// Purpose: Provide suite drivers and artifact utilities.
// Dependencies: system-tests, console-sso
// ============================================================================

//! ## Overview
//! Shared helpers for live console SSO system-tests.
//! Invariants:
//! - Every provisioned identity is torn down before a test returns.
//! - Every test writes a summary, including on panic.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test binaries.")]

pub mod artifacts;
pub mod live;
