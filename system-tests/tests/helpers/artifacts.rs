// system-tests/tests/helpers/artifacts.rs
// ============================================================================
// Module: Test Artifacts
// Description: Artifact helpers for live console SSO suites.
// Purpose: Create per-test run roots and write deterministic summaries.
// Dependencies: system-tests, console-sso, serde, serde_jcs
// ============================================================================

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use console_sso::BatteryReport;
use console_sso::TeardownReport;
use serde::Serialize;
use system_tests::config::SystemTestConfig;

/// Summary written at the end of every test.
#[derive(Debug, Serialize)]
struct TestSummary {
    /// Test name.
    test_name: String,
    /// `pass`, `fail`, `skipped`, `panic`, or `unknown`.
    status: String,
    /// Start time in Unix milliseconds.
    started_at_ms: u128,
    /// End time in Unix milliseconds.
    ended_at_ms: u128,
    /// Wall-clock duration.
    duration_ms: u128,
    /// Free-form notes.
    notes: Vec<String>,
    /// Artifact file names relative to the run root.
    artifacts: Vec<String>,
}

/// Serialized verdict of one case.
#[derive(Debug, Serialize)]
struct CaseRecord {
    /// Case name.
    case: String,
    /// Whether the case passed.
    passed: bool,
    /// Failure message.
    failure: Option<String>,
    /// Page source dump, relative to the run root.
    page_source: Option<String>,
}

/// Serialized suite verdicts plus teardown outcome.
#[derive(Debug, Serialize)]
struct SuiteRecord {
    /// Console name.
    console: String,
    /// True when the console is not deployed here.
    skipped: bool,
    /// Case verdicts.
    cases: Vec<CaseRecord>,
    /// Users deleted at teardown.
    deleted: Vec<String>,
    /// Users already gone at teardown.
    absent: Vec<String>,
    /// Failed deletions, rendered.
    teardown_failures: Vec<String>,
}

/// Current time in Unix milliseconds.
fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

/// Timestamped run root used when none is configured.
fn default_run_root(test_name: &str) -> PathBuf {
    let stamp = now_millis();
    PathBuf::from("target/system-tests").join(format!("run_{stamp}")).join(test_name)
}

/// Artifact manager for a single system-test.
#[derive(Debug, Clone)]
pub struct TestArtifacts {
    /// Directory receiving every artifact.
    root: PathBuf,
}

impl TestArtifacts {
    /// Creates the artifact root for a test. An existing summary is only
    /// replaced when overwrite is allowed.
    pub fn new(test_name: &str) -> io::Result<Self> {
        let config = SystemTestConfig::load().map_err(io::Error::other)?;
        let root = config.run_root.unwrap_or_else(|| default_run_root(test_name));
        if root.join("summary.json").exists() && !config.allow_overwrite {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already holds a summary", root.display()),
            ));
        }
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
        })
    }

    /// Returns the root directory for the test artifacts.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a JSON artifact using canonical JCS serialization.
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> io::Result<PathBuf> {
        let path = self.root.join(name);
        let bytes = serde_jcs::to_vec(value).map_err(|err| io::Error::other(err.to_string()))?;
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Writes a text artifact with UTF-8 encoding.
    pub fn write_text(&self, name: &str, value: &str) -> io::Result<PathBuf> {
        let path = self.root.join(name);
        fs::write(&path, value.as_bytes())?;
        Ok(path)
    }
}

/// Helper that writes summaries even when a test panics.
pub struct TestReporter {
    /// Artifact destination.
    artifacts: TestArtifacts,
    /// Test name.
    test_name: String,
    /// Start time in Unix milliseconds.
    started_at_ms: u128,
    /// Set once a summary has been written.
    finalized: bool,
}

impl TestReporter {
    /// Creates a reporter for the named test.
    pub fn new(test_name: &str) -> io::Result<Self> {
        Ok(Self {
            artifacts: TestArtifacts::new(test_name)?,
            test_name: test_name.to_string(),
            started_at_ms: now_millis(),
            finalized: false,
        })
    }

    /// Returns the artifact manager.
    pub const fn artifacts(&self) -> &TestArtifacts {
        &self.artifacts
    }

    /// Writes the suite verdicts and a page dump per failed case that
    /// captured one. Returns the artifact names written.
    pub fn record_suite(
        &self,
        report: &BatteryReport,
        teardown: &TeardownReport,
    ) -> io::Result<Vec<String>> {
        let mut written = Vec::new();
        let mut cases = Vec::new();
        for outcome in &report.outcomes {
            let mut page_source = None;
            if let Some(source) = outcome.failure.as_ref().and_then(|failure| failure.page_source())
            {
                let name = format!("{}-{}.html", report.console, outcome.case);
                self.artifacts.write_text(&name, source)?;
                written.push(name.clone());
                page_source = Some(name);
            }
            cases.push(CaseRecord {
                case: outcome.case.clone(),
                passed: outcome.passed(),
                failure: outcome.failure.as_ref().map(ToString::to_string),
                page_source,
            });
        }
        let record = SuiteRecord {
            console: report.console.clone(),
            skipped: report.skipped,
            cases,
            deleted: teardown.deleted.clone(),
            absent: teardown.absent.clone(),
            teardown_failures: teardown
                .failures
                .iter()
                .map(|failure| {
                    format!("{} in {}: {}", failure.username, failure.environment_id, failure.error)
                })
                .collect(),
        };
        let name = format!("{}.json", report.console);
        self.artifacts.write_json(&name, &record)?;
        written.push(name);
        Ok(written)
    }

    /// Writes the final summary for the test.
    pub fn finish(
        &mut self,
        status: &str,
        notes: Vec<String>,
        artifacts: Vec<String>,
    ) -> io::Result<()> {
        let ended_at_ms = now_millis();
        let summary = TestSummary {
            test_name: self.test_name.clone(),
            status: status.to_string(),
            started_at_ms: self.started_at_ms,
            ended_at_ms,
            duration_ms: ended_at_ms.saturating_sub(self.started_at_ms),
            notes,
            artifacts,
        };
        self.artifacts.write_json("summary.json", &summary)?;
        self.artifacts.write_text("summary.md", &summary_markdown(&summary))?;
        self.finalized = true;
        Ok(())
    }
}

impl Drop for TestReporter {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        let status = if std::thread::panicking() { "panic" } else { "unknown" };
        let _ = self.finish(
            status,
            vec!["test terminated without explicit summary".to_string()],
            Vec::new(),
        );
    }
}

/// Renders the human-readable summary.
fn summary_markdown(summary: &TestSummary) -> String {
    let mut out = String::new();
    out.push_str("# Console SSO System-Test Summary\n\n");
    out.push_str("## Status\n\n");
    let _ = writeln!(out, "- Test: {}", summary.test_name);
    let _ = writeln!(out, "- Status: {}", summary.status);
    let _ = writeln!(out, "- Duration (ms): {}", summary.duration_ms);
    push_list(&mut out, "Notes", &summary.notes);
    push_list(&mut out, "Artifacts", &summary.artifacts);
    out
}

/// Appends a titled bullet list, or `None` when empty.
fn push_list(out: &mut String, title: &str, items: &[String]) {
    let _ = write!(out, "\n## {title}\n\n");
    if items.is_empty() {
        out.push_str("- None\n");
    }
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
}
