// crates/console-sso/src/battery.rs
// ============================================================================
// Module: Access Battery
// Description: Standard access-control cases run against each console.
// Purpose: Drive login flows per case and collect verdicts into a report.
// Dependencies: pingone-client, thiserror
// ============================================================================

//! ## Overview
//! Every console suite runs the same battery with a fresh browser per case:
//! a local user with the granting role is let in, a federated external user
//! with the role is let in while one without it is turned away, a user
//! without roles is turned away, and a user with the role in the wrong
//! population is turned away. Consoles that declare population-independent
//! roles also check that a `Default`-population user holding only such a
//! role is let in.
//!
//! Cases never abort the suite; each one produces a [`CaseOutcome`]. Only
//! suite-level provisioning failures abort with a [`FixtureError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use pingone_client::PingOneUser;
use thiserror::Error;

use crate::access::AccessFailure;
use crate::access::Expectation;
use crate::console::CatalogError;
use crate::console::ResolvedConsole;
use crate::events::EventKind;
use crate::fixture::FixtureError;
use crate::fixture::SuiteFixture;
use crate::fixture::external_no_role_username;
use crate::fixture::external_username;
use crate::fixture::local_username;
use crate::fixture::shared_external_username;
use crate::login::LoginError;
use crate::reachability::ReachabilityError;
use crate::runtime::HarnessRuntime;
use crate::webdriver::WebDriverError;

/// Console name reported by the PingOne console check.
pub const PINGONE_CONSOLE_NAME: &str = "pingone";

// ============================================================================
// SECTION: Cases
// ============================================================================

/// Standard access-control cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryCase {
    /// Local user with the granting role in the tenant population.
    LocalUserGranted,
    /// External identity user with the granting role.
    ExternalUserGranted,
    /// External identity user without console roles.
    ExternalUserDenied,
    /// User without console roles.
    NoRoleUserDenied,
    /// User with the granting role in the `Default` population.
    WrongPopulationDenied,
    /// User in the `Default` population holding only the population-independent role.
    AnyPopulationRoleGranted,
}

impl BatteryCase {
    /// Returns the case name used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LocalUserGranted => "local_user_granted",
            Self::ExternalUserGranted => "external_user_granted",
            Self::ExternalUserDenied => "external_user_denied",
            Self::NoRoleUserDenied => "no_role_user_denied",
            Self::WrongPopulationDenied => "wrong_population_denied",
            Self::AnyPopulationRoleGranted => "any_population_role_granted",
        }
    }

    /// Returns the cases that apply to `console`, in execution order.
    #[must_use]
    pub fn for_console(console: &ResolvedConsole) -> Vec<Self> {
        let mut cases = vec![
            Self::LocalUserGranted,
            Self::ExternalUserGranted,
            Self::ExternalUserDenied,
            Self::NoRoleUserDenied,
            Self::WrongPopulationDenied,
        ];
        if console.any_population_roles.is_some() {
            cases.push(Self::AnyPopulationRoleGranted);
        }
        cases
    }
}

impl fmt::Display for BatteryCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Failures and Reports
// ============================================================================

/// Why a case failed.
#[derive(Debug, Error)]
pub enum CaseFailure {
    /// The page did not show the expected access verdict.
    #[error(transparent)]
    Access(#[from] AccessFailure),
    /// A login step failed.
    #[error("login failed: {0}")]
    Login(#[from] LoginError),
    /// The console never became reachable.
    #[error("console unreachable: {0}")]
    Unreachable(#[from] ReachabilityError),
    /// The browser session failed outside a login step.
    #[error("browser failed: {0}")]
    Browser(#[from] WebDriverError),
    /// Case-level provisioning failed.
    #[error("fixture failed: {0}")]
    Fixture(#[from] FixtureError),
}

impl CaseFailure {
    /// Returns the page source captured with the failure, if any.
    #[must_use]
    pub fn page_source(&self) -> Option<&str> {
        match self {
            Self::Access(failure) => failure.page_source.as_deref(),
            _ => None,
        }
    }
}

/// Verdict of one case.
#[derive(Debug)]
pub struct CaseOutcome {
    /// Case name.
    pub case: String,
    /// Failure, when the case did not pass.
    pub failure: Option<CaseFailure>,
}

impl CaseOutcome {
    /// Returns true when the case passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Verdicts of one suite.
#[derive(Debug)]
pub struct BatteryReport {
    /// Console name.
    pub console: String,
    /// True when the console is not deployed in this environment.
    pub skipped: bool,
    /// Case verdicts in execution order.
    pub outcomes: Vec<CaseOutcome>,
}

impl BatteryReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new(console: impl Into<String>) -> Self {
        Self {
            console: console.into(),
            skipped: false,
            outcomes: Vec::new(),
        }
    }

    /// Creates a report for a skipped suite.
    #[must_use]
    pub fn skipped(console: impl Into<String>) -> Self {
        Self {
            skipped: true,
            ..Self::new(console)
        }
    }

    /// Returns true when no case failed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(CaseOutcome::passed)
    }

    /// Returns the failed cases.
    #[must_use]
    pub fn failures(&self) -> Vec<&CaseOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.passed()).collect()
    }

    /// Returns the verdict of a named case.
    #[must_use]
    pub fn outcome(&self, case: &str) -> Option<&CaseOutcome> {
        self.outcomes.iter().find(|outcome| outcome.case == case)
    }
}

impl fmt::Display for BatteryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skipped {
            return write!(f, "{}: skipped", self.console);
        }
        let failed = self.failures().len();
        write!(f, "{}: {} passed, {failed} failed", self.console, self.outcomes.len() - failed)?;
        for outcome in self.failures() {
            if let Some(failure) = &outcome.failure {
                write!(f, "\n  {}: {failure}", outcome.case)?;
            }
        }
        Ok(())
    }
}

/// Runs a case body and records the verdict.
fn record(
    runtime: &HarnessRuntime,
    report: &mut BatteryReport,
    case: &str,
    body: impl FnOnce() -> Result<(), CaseFailure>,
) {
    let failure = body().err();
    runtime.events().emit(EventKind::CaseFinished {
        console: report.console.clone(),
        case: case.to_string(),
        passed: failure.is_none(),
        detail: failure.as_ref().map(ToString::to_string),
    });
    report.outcomes.push(CaseOutcome {
        case: case.to_string(),
        failure,
    });
}

// ============================================================================
// SECTION: Console Suite
// ============================================================================

/// Standard battery bound to one console.
pub struct ConsoleSuite<'r> {
    /// Shared collaborators.
    runtime: &'r HarnessRuntime,
    /// Console under test.
    console: ResolvedConsole,
    /// Whether the console is absent from this environment.
    skipped: bool,
}

impl<'r> ConsoleSuite<'r> {
    /// Resolves the named console from the runtime's catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownConsole`] when the name is not in the catalog.
    pub fn new(runtime: &'r HarnessRuntime, name: &str) -> Result<Self, CatalogError> {
        let config = runtime.config();
        Ok(Self {
            runtime,
            console: config.console(name)?,
            skipped: config.console_skipped(name)?,
        })
    }

    /// Returns the resolved console.
    #[must_use]
    pub const fn console(&self) -> &ResolvedConsole {
        &self.console
    }

    /// Returns true when the console is not deployed in this environment.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// Builds the local user with the console roles in `population_id`.
    #[must_use]
    pub fn local_user(&self, fixture: &SuiteFixture, population_id: &str) -> PingOneUser {
        PingOneUser::new(
            local_username(&self.console.name, fixture.tenant()),
            fixture.primary().clone(),
        )
        .with_population(population_id)
        .with_roles(self.console.roles.clone())
    }

    /// Builds the external identity user with the console roles.
    #[must_use]
    pub fn external_user(&self, fixture: &SuiteFixture) -> PingOneUser {
        PingOneUser::new(
            external_username(&self.console.name, fixture.tenant()),
            fixture.external().clone(),
        )
        .with_roles(self.console.roles.clone())
    }

    /// Provisions suite users and runs every applicable case.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when suite-level provisioning fails.
    pub fn run(&self, fixture: &mut SuiteFixture) -> Result<BatteryReport, FixtureError> {
        if self.skipped {
            return Ok(BatteryReport::skipped(self.console.name.clone()));
        }
        let local = self.local_user(fixture, fixture.tenant_population_id());
        fixture.provision(local, self.console.platform_role)?;
        let external = self.external_user(fixture);
        fixture.provision(external.clone(), false)?;
        let shadow =
            PingOneUser::shadow_of(external.username(), fixture.tenant(), fixture.primary().clone());
        fixture.delete(&shadow)?;
        fixture.register(shadow);

        let mut report = BatteryReport::new(self.console.name.clone());
        for case in BatteryCase::for_console(&self.console) {
            record(self.runtime, &mut report, case.as_str(), || self.run_case(fixture, case));
        }
        Ok(report)
    }

    /// Runs one case with a fresh browser session.
    ///
    /// # Errors
    ///
    /// Returns [`CaseFailure`] when the case does not pass.
    pub fn run_case(&self, fixture: &mut SuiteFixture, case: BatteryCase) -> Result<(), CaseFailure> {
        match case {
            BatteryCase::LocalUserGranted => {
                let user = self.local_user(fixture, fixture.tenant_population_id());
                fixture.provision(user.clone(), self.console.platform_role)?;
                self.local_login_granted(&user)
            }
            BatteryCase::ExternalUserGranted => {
                let external = self.external_user(fixture);
                external_login_checked(
                    self.runtime,
                    fixture,
                    &self.console,
                    &external,
                    Expectation::Granted,
                )
            }
            BatteryCase::ExternalUserDenied => {
                let external = PingOneUser::new(
                    external_no_role_username(&self.console.name, fixture.tenant()),
                    fixture.external().clone(),
                );
                fixture.provision(external.clone(), false)?;
                external_login_checked(
                    self.runtime,
                    fixture,
                    &self.console,
                    &external,
                    Expectation::Denied,
                )
            }
            BatteryCase::NoRoleUserDenied => self.no_role_denied(fixture.no_role_user()),
            BatteryCase::WrongPopulationDenied => {
                let user = self.local_user(fixture, fixture.default_population_id());
                fixture.provision(user.clone(), self.console.platform_role)?;
                self.local_login_denied(&user)
            }
            BatteryCase::AnyPopulationRoleGranted => self.any_population_granted(fixture),
        }
    }

    /// Signs in at PingOne, opens the console, and requires access.
    fn local_login_granted(&self, user: &PingOneUser) -> Result<(), CaseFailure> {
        let runtime = self.runtime;
        runtime.probe().wait_until_reachable(&self.console.console_url)?;
        let mut browser = runtime.launch_browser()?;
        let mut login = runtime.login_driver();
        login.pingone_login(
            &mut *browser,
            &runtime.config().pingone_console_url,
            user.username(),
            user.password(),
        )?;
        login.open_console(&mut *browser, &self.console.console_url)?;
        runtime.verifier().verify_granted(&mut *browser, &self.console, &mut login)?;
        Ok(())
    }

    /// Signs in at PingOne, opens the console, and requires denial.
    fn local_login_denied(&self, user: &PingOneUser) -> Result<(), CaseFailure> {
        let runtime = self.runtime;
        runtime.probe().wait_until_reachable(&self.console.console_url)?;
        let mut browser = runtime.launch_browser()?;
        let mut login = runtime.login_driver();
        login.pingone_login(
            &mut *browser,
            &runtime.config().pingone_console_url,
            user.username(),
            user.password(),
        )?;
        login.open_console(&mut *browser, &self.console.console_url)?;
        runtime.verifier().verify_denied(&mut *browser, &self.console, &mut login)?;
        Ok(())
    }

    /// Signs in through the console's redirect and requires denial.
    fn no_role_denied(&self, user: &PingOneUser) -> Result<(), CaseFailure> {
        let runtime = self.runtime;
        runtime.probe().wait_until_reachable(&self.console.console_url)?;
        let mut browser = runtime.launch_browser()?;
        let mut login = runtime.login_driver();
        login.login_as_pingone_user(
            &mut *browser,
            &self.console.console_url,
            user.username(),
            user.password(),
        )?;
        runtime.verifier().verify_denied(&mut *browser, &self.console, &mut login)?;
        Ok(())
    }

    /// Provisions a `Default`-population user holding only the
    /// population-independent role and requires access.
    fn any_population_granted(&self, fixture: &mut SuiteFixture) -> Result<(), CaseFailure> {
        let Some(any_population_roles) = self.console.any_population_roles.clone() else {
            return Ok(());
        };
        let user = self
            .local_user(fixture, fixture.default_population_id())
            .with_roles(any_population_roles);
        fixture.provision(user.clone(), self.console.platform_role)?;
        self.local_login_granted(&user)
    }
}

/// Federates from the external environment and requires the `expected`
/// verdict; the shadow account is deleted before and after the login.
fn external_login_checked(
    runtime: &HarnessRuntime,
    fixture: &mut SuiteFixture,
    console: &ResolvedConsole,
    external: &PingOneUser,
    expected: Expectation,
) -> Result<(), CaseFailure> {
    let shadow =
        PingOneUser::shadow_of(external.username(), fixture.tenant(), fixture.primary().clone());
    fixture.delete(&shadow)?;
    fixture.register(shadow.clone());
    let verdict = external_login(runtime, console, external, expected);
    let cleanup = fixture.delete(&shadow);
    verdict?;
    cleanup?;
    Ok(())
}

/// Opens the console, federates, and verifies the verdict.
fn external_login(
    runtime: &HarnessRuntime,
    console: &ResolvedConsole,
    external: &PingOneUser,
    expected: Expectation,
) -> Result<(), CaseFailure> {
    runtime.probe().wait_until_reachable(&console.console_url)?;
    let mut browser = runtime.launch_browser()?;
    let mut login = runtime.login_driver();
    login.login_from_external_idp(
        &mut *browser,
        &console.console_url,
        external.username(),
        external.password(),
    )?;
    let verifier = runtime.verifier();
    match expected {
        Expectation::Granted => verifier.verify_granted(&mut *browser, console, &mut login)?,
        Expectation::Denied => verifier.verify_denied(&mut *browser, console, &mut login)?,
    }
    Ok(())
}

/// Unions role attributes, keeping values unique and in first-seen order.
#[must_use]
pub fn merge_roles<'m>(
    maps: impl IntoIterator<Item = &'m BTreeMap<String, Vec<String>>>,
) -> BTreeMap<String, Vec<String>> {
    let mut merged: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for map in maps {
        for (attribute, values) in map {
            let entry = merged.entry(attribute.clone()).or_default();
            for value in values {
                if !entry.contains(value) {
                    entry.push(value.clone());
                }
            }
        }
    }
    merged
}

// ============================================================================
// SECTION: External Identity Suite
// ============================================================================

/// Federated login into every deployed console with one external user that
/// holds every console role.
pub struct ExternalIdpSuite<'r> {
    /// Shared collaborators.
    runtime: &'r HarnessRuntime,
    /// Deployed consoles.
    consoles: Vec<ResolvedConsole>,
}

impl<'r> ExternalIdpSuite<'r> {
    /// Resolves every console not skipped in this environment.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when a catalog console cannot be resolved.
    pub fn new(runtime: &'r HarnessRuntime) -> Result<Self, CatalogError> {
        let config = runtime.config();
        let mut consoles = Vec::new();
        for name in config.catalog.names() {
            if !config.console_skipped(name)? {
                consoles.push(config.console(name)?);
            }
        }
        Ok(Self {
            runtime,
            consoles,
        })
    }

    /// Returns the consoles under test.
    #[must_use]
    pub fn consoles(&self) -> &[ResolvedConsole] {
        &self.consoles
    }

    /// Builds the external user holding every console role.
    #[must_use]
    pub fn external_user(&self, fixture: &SuiteFixture) -> PingOneUser {
        let roles = merge_roles(self.consoles.iter().map(|console| &console.roles));
        PingOneUser::new(shared_external_username(fixture.tenant()), fixture.external().clone())
            .with_roles(roles)
    }

    /// Provisions the external user and checks access to each console.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when provisioning the external user fails.
    pub fn run(&self, fixture: &mut SuiteFixture) -> Result<BatteryReport, FixtureError> {
        let external = self.external_user(fixture);
        fixture.provision(external.clone(), false)?;
        let mut report = BatteryReport::new("external-idp");
        for console in &self.consoles {
            record(self.runtime, &mut report, &console.name, || {
                external_login_checked(
                    self.runtime,
                    fixture,
                    console,
                    &external,
                    Expectation::Granted,
                )
            });
        }
        Ok(report)
    }
}

// ============================================================================
// SECTION: PingOne Console Suite
// ============================================================================

/// Case name of the PingOne console check.
pub const PINGONE_CONSOLE_CASE: &str = "local_user_reaches_environments";

/// Signs a local user into the PingOne console and requires the environment
/// list inside the content frame.
///
/// # Errors
///
/// Returns [`FixtureError`] when provisioning the local user fails.
pub fn run_pingone_console_suite(
    runtime: &HarnessRuntime,
    fixture: &mut SuiteFixture,
) -> Result<BatteryReport, FixtureError> {
    let user = PingOneUser::new(
        local_username(PINGONE_CONSOLE_NAME, fixture.tenant()),
        fixture.primary().clone(),
    )
    .with_population(fixture.tenant_population_id());
    fixture.provision(user.clone(), true)?;
    let mut report = BatteryReport::new(PINGONE_CONSOLE_NAME);
    record(runtime, &mut report, PINGONE_CONSOLE_CASE, || {
        let console_url = &runtime.config().pingone_console_url;
        let mut browser = runtime.launch_browser()?;
        let mut login = runtime.login_driver();
        login.pingone_login(&mut *browser, console_url, user.username(), user.password())?;
        runtime.verifier().verify_pingone_console(&mut *browser, console_url, &mut login)?;
        Ok(())
    });
    Ok(report)
}
