// crates/console-sso-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and cleanup planning.
// Purpose: Ensure commands parse as documented and cleanup targets every user.
// Dependencies: console-sso-cli main helpers
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use console_sso::ConsoleCatalog;
use console_sso::HarnessConfig;
use pingone_client::EnvironmentEndpoints;
use pingone_client::IdentityApi;
use pingone_client::PingOneError;
use pingone_client::PingOneUser;
use serde_json::Value;

use super::Cli;
use super::Commands;
use super::ConsolesCommand;
use super::ListFormat;
use super::UsersCommand;
use super::cleanup_targets;
use super::delete_users;
use super::probe_policy;
use super::render_catalog;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn config() -> HarnessConfig {
    HarnessConfig::new("acme.example.com", "acme", "env-primary", "env-external")
}

fn described(targets: &[PingOneUser]) -> Vec<String> {
    targets
        .iter()
        .map(|user| format!("{}@{}", user.username(), user.endpoints().environment_id()))
        .collect()
}

/// Identity API that records deletions and fails for one username.
#[derive(Default)]
struct DeletingApi {
    deleted: Mutex<Vec<String>>,
    failing: Option<String>,
}

impl IdentityApi for DeletingApi {
    fn find_user_id(&self, _: &EnvironmentEndpoints, _: &str) -> Result<Option<String>, PingOneError> {
        Ok(None)
    }

    fn create_user(&self, _: &EnvironmentEndpoints, _: &Value) -> Result<String, PingOneError> {
        Ok(String::new())
    }

    fn update_user(&self, _: &EnvironmentEndpoints, _: &str, _: &Value) -> Result<(), PingOneError> {
        Ok(())
    }

    fn delete_user(&self, _: &EnvironmentEndpoints, username: &str) -> Result<bool, PingOneError> {
        if self.failing.as_deref() == Some(username) {
            return Err(PingOneError::Status { operation: "delete user", status: 500, body: String::new() });
        }
        self.deleted.lock().unwrap().push(username.to_string());
        Ok(username.starts_with("no-role"))
    }

    fn find_population_id(&self, _: &EnvironmentEndpoints, _: &str) -> Result<String, PingOneError> {
        Ok(String::new())
    }

    fn add_role_to_user(&self, _: &EnvironmentEndpoints, _: &str, _: &str, _: &str) -> Result<(), PingOneError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn probe_defaults_to_the_reachability_budget() {
    let cli = Cli::try_parse_from(["console-sso", "probe", "https://argocd.acme.example.com"]).unwrap();
    let Commands::Probe(command) = cli.command else { panic!("expected probe") };
    assert_eq!(command.attempts, 60);
    assert_eq!(command.delay_secs, 5);
}

#[test]
fn repeated_console_flags_accumulate() {
    let cli = Cli::try_parse_from([
        "console-sso", "users", "cleanup", "--console", "argocd", "--console", "pingone",
    ])
    .unwrap();
    let Commands::Users { command: UsersCommand::Cleanup(command) } = cli.command else {
        panic!("expected users cleanup")
    };
    assert_eq!(command.consoles, vec!["argocd", "pingone"]);
}

#[test]
fn consoles_list_accepts_a_format() {
    let cli = Cli::try_parse_from(["console-sso", "consoles", "list", "--format", "toml"]).unwrap();
    let Commands::Consoles { command: ConsolesCommand::List(command) } = cli.command else {
        panic!("expected consoles list")
    };
    assert_eq!(command.format, ListFormat::Toml);
    assert!(command.catalog.is_none());
}

#[test]
fn missing_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["console-sso"]).is_err());
}

#[test]
fn zero_attempts_are_rejected() {
    assert!(probe_policy(0, 5).is_err());
    let policy = probe_policy(3, 2).unwrap();
    assert_eq!(policy.max_attempts(), 3);
    assert_eq!(policy.delay(), Duration::from_secs(2));
}

// ============================================================================
// SECTION: Catalog Listing
// ============================================================================

#[test]
fn catalog_listing_shows_one_line_per_console() {
    let rendered = render_catalog(&ConsoleCatalog::builtin());
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "argocd\thttps://argocd.<tenant-domain>/auth/login\tp1asArgoCDRoles=argo-configteam"
    );
    assert!(lines[2].ends_with("skipped on customer-hub"));
}

#[test]
fn catalog_listing_reads_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("consoles.toml");
    fs::write(&path, ConsoleCatalog::builtin().to_toml_string().unwrap()).unwrap();

    let catalog = ConsoleCatalog::load(Some(&path)).unwrap();

    assert_eq!(render_catalog(&catalog), render_catalog(&ConsoleCatalog::builtin()));
}

// ============================================================================
// SECTION: Cleanup
// ============================================================================

#[test]
fn full_cleanup_covers_both_environments() {
    let targets = described(&cleanup_targets(&config(), &[]).unwrap());

    assert_eq!(targets.len(), 1 + 2 + 4 * 5 + 1);
    assert_eq!(targets[0], "no-role-acme@env-primary");
    assert!(targets.contains(&"external-idp-test-user-acme-acme@env-primary".to_string()));
    assert!(targets.contains(&"external-idp-test-user-acme@env-external".to_string()));
    assert!(targets.contains(&"sso-pingfederate-test-user-acme@env-primary".to_string()));
    assert!(targets.contains(&"opensearch-external-idp-test-user-acme@env-external".to_string()));
    assert!(targets.contains(&"opensearch-external-idp-test-user-acme-acme@env-primary".to_string()));
    assert!(targets.contains(&"pingaccess-external-idp-no-role-user-acme@env-external".to_string()));
    assert_eq!(targets.last().unwrap(), "sso-pingone-test-user-acme@env-primary");
}

#[test]
fn selected_consoles_limit_the_cleanup() {
    let targets = described(&cleanup_targets(&config(), &["argocd".to_string()]).unwrap());

    assert_eq!(
        targets,
        vec![
            "sso-argocd-test-user-acme@env-primary",
            "argocd-external-idp-test-user-acme-acme@env-primary",
            "argocd-external-idp-test-user-acme@env-external",
            "argocd-external-idp-no-role-user-acme-acme@env-primary",
            "argocd-external-idp-no-role-user-acme@env-external",
        ]
    );
}

#[test]
fn unknown_console_is_rejected() {
    let err = cleanup_targets(&config(), &["jenkins".to_string()]).unwrap_err();
    assert_eq!(err.to_string(), "unknown console: jenkins");
}

#[test]
fn failed_deletions_are_counted_and_the_rest_continue() {
    let targets = cleanup_targets(&config(), &[]).unwrap();
    let api = DeletingApi { failing: Some("no-role-acme".to_string()), ..DeletingApi::default() };

    let failed = delete_users(&api, &targets).unwrap();

    assert_eq!(failed, 1);
    assert_eq!(api.deleted.lock().unwrap().len(), targets.len() - 1);
}
