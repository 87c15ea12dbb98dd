// system-tests/tests/helpers/live.rs
// ============================================================================
// Module: Live Suite Driver
// Description: Runs console suites against the configured tenant.
// Purpose: Share setup, teardown, and reporting across live test binaries.
// Dependencies: console-sso
// ============================================================================

use std::error::Error;

use console_sso::BatteryReport;
use console_sso::ConsoleSuite;
use console_sso::HarnessConfig;
use console_sso::HarnessRuntime;
use console_sso::SuiteFixture;

use super::artifacts::TestReporter;

/// Result type of every live test.
pub type TestResult = Result<(), Box<dyn Error>>;

/// Loads the harness configuration and connects to the identity API.
pub fn connect() -> Result<HarnessRuntime, Box<dyn Error>> {
    let config = HarnessConfig::load()?;
    Ok(HarnessRuntime::connect(config)?)
}

/// Sets up the suite fixture, runs `suite`, tears the fixture down, and
/// records the outcome. Fails when any case failed or teardown left users
/// behind.
pub fn run_suite<F>(test_name: &str, suite: F) -> TestResult
where
    F: FnOnce(&HarnessRuntime, &mut SuiteFixture) -> Result<BatteryReport, Box<dyn Error>>,
{
    let mut reporter = TestReporter::new(test_name)?;
    let runtime = connect()?;
    let mut fixture = SuiteFixture::set_up(
        runtime.config(),
        runtime.identity_handle(),
        runtime.events_handle(),
    )?;
    let report = suite(&runtime, &mut fixture);
    let teardown = fixture.teardown();
    let report = report?;
    let artifacts = reporter.record_suite(&report, &teardown)?;
    let clean = report.passed() && teardown.is_clean();
    let status = match (report.skipped, clean) {
        (true, _) => "skipped",
        (false, true) => "pass",
        (false, false) => "fail",
    };
    let notes = vec![report.to_string(), format!("teardown: {teardown}")];
    reporter.finish(status, notes, artifacts)?;
    if !clean {
        return Err(format!("{report}\nteardown: {teardown}").into());
    }
    Ok(())
}

/// Runs the standard battery for one catalog console. Consoles not deployed
/// in this environment are recorded as skipped without provisioning.
pub fn run_console(test_name: &str, console: &str) -> TestResult {
    let config = HarnessConfig::load()?;
    if config.console_skipped(console)? {
        let mut reporter = TestReporter::new(test_name)?;
        reporter.finish(
            "skipped",
            vec![format!(
                "{console} is not deployed in {} environments",
                config.env_type.as_deref().unwrap_or("this")
            )],
            Vec::new(),
        )?;
        return Ok(());
    }
    run_suite(test_name, |runtime, fixture| {
        let suite = ConsoleSuite::new(runtime, console)?;
        Ok(suite.run(fixture)?)
    })
}
