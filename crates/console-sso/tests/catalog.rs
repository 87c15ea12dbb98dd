// crates/console-sso/tests/catalog.rs
// ============================================================================
// Module: Console Catalog Tests
// Description: Built-in profiles, TOML catalogs, and tenant resolution.
// Purpose: Ensure console data resolves to the URLs and roles a tenant uses.
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

use std::collections::BTreeMap;
use std::fs;

use console_sso::CatalogError;
use console_sso::ConsoleCatalog;
use console_sso::Locator;

const GRAFANA: &str = r#"
[[console]]
name = "grafana"
hostname_env = "GRAFANA_PUBLIC_HOSTNAME"
subdomain = "monitoring"
path = "/login"
roles = { p1asGrafanaRoles = ["{environment}-grafana-viewer"] }
granted = [{ by = "xpath", value = "//h1[contains(text(), 'Home')]" }]
denied = [{ by = "css", value = "div.login-error" }]
"#;

#[test]
fn builtin_catalog_lists_the_four_admin_consoles() {
    let catalog = ConsoleCatalog::builtin();
    assert_eq!(catalog.names(), vec!["argocd", "opensearch", "pingaccess", "pingfederate"]);

    let argocd = catalog.get("argocd").unwrap();
    assert!(argocd.app_entry.is_some());
    assert!(argocd.any_population_roles.is_some());
    assert!(!argocd.skip_on_customer_hub);
    assert!(catalog.get("pingfederate").unwrap().skip_on_customer_hub);
    assert_eq!(catalog.get("pingfederate").unwrap().granted.len(), 2);
}

#[test]
fn resolution_builds_the_tenant_url_and_substitutes_roles() {
    let catalog = ConsoleCatalog::builtin();

    let pingaccess = catalog.get("pingaccess").unwrap().resolve("acme.example.com", "dev", None);
    assert_eq!(pingaccess.base_url, "https://pingaccess-admin.acme.example.com");
    assert_eq!(pingaccess.console_url, "https://pingaccess-admin.acme.example.com");
    assert_eq!(
        pingaccess.roles,
        BTreeMap::from([("p1asPingAccessRoles".to_string(), vec!["dev-pa-audit".to_string()])])
    );

    let opensearch = catalog.get("opensearch").unwrap().resolve("acme.example.com", "dev", None);
    assert_eq!(opensearch.console_url, "https://logs.acme.example.com/auth/openid/login");
}

#[test]
fn hostname_override_replaces_the_base_url() {
    let argocd = ConsoleCatalog::builtin()
        .get("argocd")
        .unwrap()
        .resolve("acme.example.com", "dev", Some("http://127.0.0.1:8080/"));

    assert_eq!(argocd.base_url, "http://127.0.0.1:8080");
    assert_eq!(argocd.console_url, "http://127.0.0.1:8080/auth/login");
}

#[test]
fn customer_hub_skips_only_flagged_consoles() {
    let catalog = ConsoleCatalog::builtin();
    assert!(catalog.get("pingaccess").unwrap().skipped_for(Some("customer-hub")));
    assert!(!catalog.get("pingaccess").unwrap().skipped_for(Some("ping-cloud")));
    assert!(!catalog.get("pingaccess").unwrap().skipped_for(None));
    assert!(!catalog.get("opensearch").unwrap().skipped_for(Some("customer-hub")));
}

#[test]
fn unknown_console_is_an_error() {
    let err = ConsoleCatalog::builtin().get("jenkins").unwrap_err();
    assert_eq!(err, CatalogError::UnknownConsole("jenkins".to_string()));
}

#[test]
fn toml_catalog_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("consoles.toml");
    fs::write(&path, GRAFANA).unwrap();

    let catalog = ConsoleCatalog::load(Some(&path)).unwrap();
    let grafana = catalog.get("grafana").unwrap();

    assert!(grafana.platform_role);
    assert_eq!(grafana.denied, vec![Locator::css("div.login-error")]);
    let resolved = grafana.resolve("acme.example.com", "stage", None);
    assert_eq!(resolved.console_url, "https://monitoring.acme.example.com/login");
    assert_eq!(resolved.roles["p1asGrafanaRoles"], vec!["stage-grafana-viewer".to_string()]);
}

#[test]
fn builtin_catalog_survives_a_toml_rewrite() {
    let rendered = ConsoleCatalog::builtin().to_toml_string().unwrap();
    assert_eq!(ConsoleCatalog::from_toml_str(&rendered).unwrap(), ConsoleCatalog::builtin());
}

#[test]
fn duplicate_names_are_rejected() {
    let raw = format!("{GRAFANA}\n{GRAFANA}");
    let err = ConsoleCatalog::from_toml_str(&raw).unwrap_err();
    assert_eq!(err, CatalogError::Invalid("duplicate console grafana".to_string()));
}

#[test]
fn invalid_profiles_are_rejected() {
    let no_denial = GRAFANA.replace(r#"denied = [{ by = "css", value = "div.login-error" }]"#, "denied = []");
    assert!(matches!(
        ConsoleCatalog::from_toml_str(&no_denial),
        Err(CatalogError::Invalid(message)) if message.contains("denied markers")
    ));

    let bad_path = GRAFANA.replace(r#"path = "/login""#, r#"path = "login""#);
    assert!(matches!(ConsoleCatalog::from_toml_str(&bad_path), Err(CatalogError::Invalid(_))));

    let unknown_field = format!("{GRAFANA}colour = \"blue\"\n");
    assert!(matches!(ConsoleCatalog::from_toml_str(&unknown_field), Err(CatalogError::Parse(_))));
}

#[test]
fn missing_catalog_file_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = ConsoleCatalog::load(Some(&path)).unwrap_err();
    assert!(matches!(err, CatalogError::Io { path: reported, .. } if reported.ends_with("absent.toml")));
    assert_eq!(ConsoleCatalog::load(None).unwrap(), ConsoleCatalog::builtin());
}
