// crates/console-sso/src/lib.rs
// ============================================================================
// Module: Console SSO Harness Library
// Description: Browser-driven single sign-on checks for tenant admin consoles.
// Purpose: Provision identities, drive federated logins, and assert access.
// Dependencies: pingone-client, reqwest, serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! `console-sso` verifies that each tenant admin console lets the right
//! PingOne identities in and keeps the wrong ones out. A run loads an
//! immutable [`HarnessConfig`], assembles a [`HarnessRuntime`], provisions
//! users through a [`SuiteFixture`], and runs the standard [`BatteryCase`]s
//! for each console in the [`ConsoleCatalog`].
//! Invariants:
//! - Every provisioned identity is deleted when its fixture is torn down.
//! - Every browser session is quit when its guard drops.
//! - Polling goes through [`Sleeper`] so tests never sleep.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod access;
pub mod battery;
pub mod browser;
pub mod config;
pub mod console;
pub mod events;
pub mod fixture;
pub mod login;
pub mod markers;
pub mod precheck;
pub mod reachability;
pub mod retry;
pub mod runtime;
pub mod webdriver;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use access::AccessFailure;
pub use access::AccessVerifier;
pub use access::Expectation;
pub use battery::BatteryCase;
pub use battery::BatteryReport;
pub use battery::CaseFailure;
pub use battery::CaseOutcome;
pub use battery::ConsoleSuite;
pub use battery::ExternalIdpSuite;
pub use battery::run_pingone_console_suite;
pub use browser::Browser;
pub use browser::BrowserGuard;
pub use browser::BrowserLauncher;
pub use browser::WebDriverLauncher;
pub use config::ConfigError;
pub use config::HarnessConfig;
pub use config::HarnessEnv;
pub use console::CatalogError;
pub use console::ConsoleCatalog;
pub use console::ConsoleProfile;
pub use console::ResolvedConsole;
pub use events::EventKind;
pub use events::EventSink;
pub use events::FileEventSink;
pub use events::HarnessEvent;
pub use events::MemoryEventSink;
pub use events::NoopEventSink;
pub use events::StderrEventSink;
pub use fixture::FixtureError;
pub use fixture::SuiteFixture;
pub use fixture::TeardownReport;
pub use login::LoginDriver;
pub use login::LoginError;
pub use login::LoginState;
pub use login::LoginTrace;
pub use markers::MarkerMiss;
pub use markers::MarkerOutcome;
pub use markers::MarkerSearch;
pub use markers::MissReason;
pub use markers::WaitPolicy;
pub use precheck::IngressFailure;
pub use precheck::check_ingress;
pub use reachability::ProbeFailure;
pub use reachability::ReachabilityError;
pub use reachability::ReachabilityProbe;
pub use retry::RecordingSleeper;
pub use retry::RetryPolicy;
pub use retry::Sleeper;
pub use retry::ThreadSleeper;
pub use runtime::HarnessRuntime;
pub use runtime::RuntimeError;
pub use webdriver::ElementRef;
pub use webdriver::Locator;
pub use webdriver::WebDriverClient;
pub use webdriver::WebDriverError;
