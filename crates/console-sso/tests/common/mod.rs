// crates/console-sso/tests/common/mod.rs
// ============================================================================
// Module: Harness Test Doubles
// Description: Stub HTTP server, scripted browser, and in-memory identity API.
// Purpose: Exercise harness logic without a browser or a live tenant.
// ============================================================================

#![allow(dead_code, reason = "Not every test binary uses every helper.")]

pub mod browser;
pub mod identity;
pub mod server;

use console_sso::HarnessConfig;

/// Configuration for tenant `acme` with every console pointed at `base_url`.
pub fn config_with_consoles_at(base_url: &str) -> HarnessConfig {
    let mut config =
        HarnessConfig::new("acme.example.com", "acme", "env-primary", "env-external");
    for console in config.catalog.consoles().to_vec() {
        config.hostname_overrides.insert(console.hostname_env.clone(), base_url.to_string());
    }
    config
}
