// crates/console-sso-cli/src/main.rs
// ============================================================================
// Module: Console SSO CLI Entry Point
// Description: Command dispatcher for harness maintenance tasks.
// Purpose: Probe consoles, pre-check ingress, list consoles, clean up users.
// Dependencies: clap, console-sso, pingone-client, thiserror
// ============================================================================

//! ## Overview
//! The `console-sso` binary exposes the harness building blocks that are
//! useful outside a test run: waiting for a console URL, the ingress
//! pre-check, the console catalog, and deletion of test users left behind by
//! an interrupted run. Every failure is reported on stderr with a non-zero
//! exit code.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use console_sso::ConsoleCatalog;
use console_sso::EventSink;
use console_sso::FileEventSink;
use console_sso::HarnessConfig;
use console_sso::HarnessEnv;
use console_sso::ReachabilityProbe;
use console_sso::RetryPolicy;
use console_sso::StderrEventSink;
use console_sso::ThreadSleeper;
use console_sso::battery::PINGONE_CONSOLE_NAME;
use console_sso::check_ingress;
use console_sso::config::load_primary_tenant_domain;
use console_sso::fixture::external_no_role_username;
use console_sso::fixture::external_username;
use console_sso::fixture::local_username;
use console_sso::fixture::no_role_username;
use console_sso::fixture::shared_external_username;
use console_sso::precheck::INGRESS_SUBDOMAINS;
use console_sso::precheck::ingress_url;
use console_sso::retry::REACHABILITY_ATTEMPTS;
use console_sso::retry::REACHABILITY_DELAY;
use console_sso::runtime::IDENTITY_REQUEST_TIMEOUT;
use pingone_client::IdentityApi;
use pingone_client::PingOneSession;
use pingone_client::PingOneUser;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "console-sso", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Wait until a URL answers with a success status.
    Probe(ProbeCommand),
    /// Check the primary tenant ingress endpoints once.
    Precheck(PrecheckCommand),
    /// Console catalog utilities.
    Consoles {
        /// Selected consoles subcommand.
        #[command(subcommand)]
        command: ConsolesCommand,
    },
    /// Test user maintenance.
    Users {
        /// Selected users subcommand.
        #[command(subcommand)]
        command: UsersCommand,
    },
}

/// Arguments for `probe`.
#[derive(Args, Debug)]
struct ProbeCommand {
    /// URL to poll.
    url: String,
    /// Maximum number of requests.
    #[arg(long, default_value_t = REACHABILITY_ATTEMPTS)]
    attempts: u32,
    /// Seconds between requests.
    #[arg(long, default_value_t = REACHABILITY_DELAY.as_secs())]
    delay_secs: u64,
}

/// Arguments for `precheck`.
#[derive(Args, Debug)]
struct PrecheckCommand {
    /// Primary tenant domain (defaults to `PRIMARY_TENANT_DOMAIN`).
    #[arg(long)]
    domain: Option<String>,
}

/// Consoles subcommands.
#[derive(Subcommand, Debug)]
enum ConsolesCommand {
    /// List catalog consoles.
    List(ConsolesListCommand),
}

/// Arguments for `consoles list`.
#[derive(Args, Debug)]
struct ConsolesListCommand {
    /// TOML catalog file (defaults to the built-in catalog).
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = ListFormat::Text)]
    format: ListFormat,
}

/// Output formats for `consoles list`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ListFormat {
    /// One line per console.
    Text,
    /// The catalog as TOML.
    Toml,
}

/// Users subcommands.
#[derive(Subcommand, Debug)]
enum UsersCommand {
    /// Delete harness users left behind for the configured tenant.
    Cleanup(UsersCleanupCommand),
}

/// Arguments for `users cleanup`.
#[derive(Args, Debug)]
struct UsersCleanupCommand {
    /// Limit cleanup to these consoles (repeatable; `pingone` included).
    #[arg(long = "console", value_name = "NAME")]
    consoles: Vec<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying the message printed on stderr.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Probe(command) => command_probe(&command),
        Commands::Precheck(command) => command_precheck(command),
        Commands::Consoles {
            command: ConsolesCommand::List(command),
        } => command_consoles_list(&command),
        Commands::Users {
            command: UsersCommand::Cleanup(command),
        } => command_users_cleanup(&command),
    }
}

// ============================================================================
// SECTION: Probe and Precheck
// ============================================================================

/// Executes `probe`.
fn command_probe(command: &ProbeCommand) -> CliResult<ExitCode> {
    let policy = probe_policy(command.attempts, command.delay_secs)?;
    let probe = ReachabilityProbe::new(policy, Arc::new(ThreadSleeper), cli_event_sink()?)
        .map_err(|err| CliError::new(err.to_string()))?;
    let attempts =
        probe.wait_until_reachable(&command.url).map_err(|err| CliError::new(err.to_string()))?;
    write_line(&format!("{} reachable after {attempts} attempt(s)", command.url))?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the probe retry policy, rejecting a zero attempt budget.
fn probe_policy(attempts: u32, delay_secs: u64) -> CliResult<RetryPolicy> {
    if attempts == 0 {
        return Err(CliError::new("--attempts must be greater than zero"));
    }
    Ok(RetryPolicy::new(attempts, Duration::from_secs(delay_secs)))
}

/// Executes `precheck`.
fn command_precheck(command: PrecheckCommand) -> CliResult<ExitCode> {
    let domain = match command.domain {
        Some(domain) => domain,
        None => load_primary_tenant_domain().map_err(|err| CliError::new(err.to_string()))?,
    };
    let events = cli_event_sink()?;
    let probe = ReachabilityProbe::new(
        RetryPolicy::new(1, Duration::ZERO),
        Arc::new(ThreadSleeper),
        Arc::clone(&events),
    )
    .map_err(|err| CliError::new(err.to_string()))?;
    match check_ingress(&probe, events.as_ref(), &domain) {
        Ok(()) => {
            for subdomain in INGRESS_SUBDOMAINS {
                write_line(&format!("ok {}", ingress_url(subdomain, &domain)))?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(failures) => {
            let lines: Vec<String> = failures.iter().map(ToString::to_string).collect();
            Err(CliError::new(lines.join("\n")))
        }
    }
}

/// Event sink honoring `CONSOLE_SSO_EVENT_LOG`, stderr otherwise.
fn cli_event_sink() -> CliResult<Arc<dyn EventSink>> {
    let path = HarnessEnv::EventLog.read().map_err(|err| CliError::new(err.to_string()))?;
    match path {
        Some(path) => {
            let sink = FileEventSink::new(Path::new(&path))
                .map_err(|err| CliError::new(format!("open event log {path}: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrEventSink)),
    }
}

// ============================================================================
// SECTION: Consoles
// ============================================================================

/// Executes `consoles list`.
fn command_consoles_list(command: &ConsolesListCommand) -> CliResult<ExitCode> {
    let catalog = ConsoleCatalog::load(command.catalog.as_deref())
        .map_err(|err| CliError::new(err.to_string()))?;
    let output = match command.format {
        ListFormat::Text => render_catalog(&catalog),
        ListFormat::Toml => {
            catalog.to_toml_string().map_err(|err| CliError::new(err.to_string()))?
        }
    };
    write_line(output.trim_end())?;
    Ok(ExitCode::SUCCESS)
}

/// Renders one line per console: name, host pattern, roles, and skip flag.
fn render_catalog(catalog: &ConsoleCatalog) -> String {
    let mut output = String::new();
    for console in catalog.consoles() {
        let roles: Vec<String> = console
            .roles
            .iter()
            .map(|(attribute, values)| format!("{attribute}={}", values.join(",")))
            .collect();
        output.push_str(&format!(
            "{}\thttps://{}.<tenant-domain>{}\t{}{}\n",
            console.name,
            console.subdomain,
            console.path,
            roles.join(" "),
            if console.skip_on_customer_hub { "\tskipped on customer-hub" } else { "" }
        ));
    }
    output
}

// ============================================================================
// SECTION: Users
// ============================================================================

/// Executes `users cleanup`.
fn command_users_cleanup(command: &UsersCleanupCommand) -> CliResult<ExitCode> {
    let config = HarnessConfig::load().map_err(|err| CliError::new(err.to_string()))?;
    let targets = cleanup_targets(&config, &command.consoles)?;
    let credentials = config.credentials.as_ref().ok_or_else(|| {
        CliError::new(format!(
            "{} and {} are required for cleanup",
            HarnessEnv::PingOneClientId.as_str(),
            HarnessEnv::PingOneClientSecret.as_str()
        ))
    })?;
    let session = PingOneSession::connect(credentials, IDENTITY_REQUEST_TIMEOUT)
        .map_err(|err| CliError::new(err.to_string()))?;
    let failed = delete_users(&session, &targets)?;
    if failed == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Err(CliError::new(format!("{failed} user(s) could not be deleted")))
    }
}

/// Lists every harness user for the tenant, in both environments.
///
/// `selected` limits the per-console users; the shared users are only
/// included when no console is selected.
fn cleanup_targets(config: &HarnessConfig, selected: &[String]) -> CliResult<Vec<PingOneUser>> {
    for name in selected {
        if name != PINGONE_CONSOLE_NAME && config.catalog.get(name).is_err() {
            return Err(CliError::new(format!("unknown console: {name}")));
        }
    }
    let tenant = config.tenant_name.as_str();
    let primary = config.primary_endpoints();
    let external = config.external_endpoints();
    let wanted = |name: &str| selected.is_empty() || selected.iter().any(|entry| entry == name);
    let mut targets = Vec::new();
    let add_external = |targets: &mut Vec<PingOneUser>, username: String| {
        targets.push(PingOneUser::shadow_of(&username, tenant, primary.clone()));
        targets.push(PingOneUser::new(username, external.clone()));
    };
    if selected.is_empty() {
        targets.push(PingOneUser::new(no_role_username(tenant), primary.clone()));
        add_external(&mut targets, shared_external_username(tenant));
    }
    for name in config.catalog.names() {
        if wanted(name) {
            targets.push(PingOneUser::new(local_username(name, tenant), primary.clone()));
            add_external(&mut targets, external_username(name, tenant));
            add_external(&mut targets, external_no_role_username(name, tenant));
        }
    }
    if wanted(PINGONE_CONSOLE_NAME) {
        targets.push(PingOneUser::new(local_username(PINGONE_CONSOLE_NAME, tenant), primary.clone()));
    }
    Ok(targets)
}

/// Deletes each target, printing one line per user. Returns the failure count.
fn delete_users(api: &dyn IdentityApi, targets: &[PingOneUser]) -> CliResult<usize> {
    let mut failed = 0;
    for user in targets {
        let environment_id = user.endpoints().environment_id();
        let line = match user.delete(api) {
            Ok(true) => format!("deleted {} in {environment_id}", user.username()),
            Ok(false) => format!("absent {} in {environment_id}", user.username()),
            Err(err) => {
                failed += 1;
                format!("failed {} in {environment_id}: {err}", user.username())
            }
        };
        write_line(&line)?;
    }
    Ok(failed)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_line(message: &str) -> CliResult<()> {
    write_stdout_line(message).map_err(|err| CliError::new(format!("write stdout: {err}")))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
