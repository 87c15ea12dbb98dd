// crates/console-sso/src/runtime.rs
// ============================================================================
// Module: Harness Runtime
// Description: Collaborators shared by every suite in a run.
// Purpose: Build the identity session, browser launcher, probe, and event sink.
// Dependencies: pingone-client, thiserror
// ============================================================================

//! ## Overview
//! [`HarnessRuntime`] bundles the immutable [`HarnessConfig`] with the
//! collaborators built from it. Suites borrow the runtime; nothing in it is
//! mutated after construction. Tests substitute fakes through
//! [`HarnessRuntime::new`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pingone_client::IdentityApi;
use pingone_client::PingOneError;
use pingone_client::PingOneSession;
use thiserror::Error;

use crate::access::AccessVerifier;
use crate::browser::BrowserGuard;
use crate::browser::BrowserLauncher;
use crate::browser::WebDriverLauncher;
use crate::config::ConfigError;
use crate::config::HarnessConfig;
use crate::config::HarnessEnv;
use crate::events::EventSink;
use crate::events::FileEventSink;
use crate::events::StderrEventSink;
use crate::login::LoginDriver;
use crate::markers::MarkerSearch;
use crate::markers::WaitPolicy;
use crate::reachability::ReachabilityError;
use crate::reachability::ReachabilityProbe;
use crate::retry::RetryPolicy;
use crate::retry::Sleeper;
use crate::retry::ThreadSleeper;
use crate::webdriver::BrowserOptions;
use crate::webdriver::DEFAULT_COMMAND_TIMEOUT;
use crate::webdriver::WebDriverClient;
use crate::webdriver::WebDriverError;

/// Timeout applied to identity API requests.
pub const IDENTITY_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while assembling a runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration is incomplete for a live run.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The identity session could not be opened.
    #[error("identity session: {0}")]
    Identity(#[from] PingOneError),
    /// The WebDriver client could not be built.
    #[error("webdriver client: {0}")]
    WebDriver(#[from] WebDriverError),
    /// The reachability probe could not be built.
    #[error("reachability probe: {0}")]
    Probe(#[from] ReachabilityError),
    /// The event log could not be opened.
    #[error("open event log {path}: {message}")]
    EventLog {
        /// Log path.
        path: PathBuf,
        /// I/O error message.
        message: String,
    },
}

// ============================================================================
// SECTION: Runtime
// ============================================================================

/// Shared collaborators for a harness run.
#[derive(Clone)]
pub struct HarnessRuntime {
    /// Immutable configuration.
    config: HarnessConfig,
    /// Identity API session.
    identity: Arc<dyn IdentityApi>,
    /// Browser session factory.
    launcher: Arc<dyn BrowserLauncher>,
    /// Console reachability probe.
    probe: ReachabilityProbe,
    /// Delay driver for polling.
    sleeper: Arc<dyn Sleeper>,
    /// Event destination.
    events: Arc<dyn EventSink>,
    /// Element visibility budget.
    wait: WaitPolicy,
}

impl HarnessRuntime {
    /// Assembles a runtime from explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Probe`] when the probe client cannot be built.
    pub fn new(
        config: HarnessConfig,
        identity: Arc<dyn IdentityApi>,
        launcher: Arc<dyn BrowserLauncher>,
        sleeper: Arc<dyn Sleeper>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, RuntimeError> {
        let probe = ReachabilityProbe::new(
            RetryPolicy::reachability(),
            Arc::clone(&sleeper),
            Arc::clone(&events),
        )?;
        let wait = WaitPolicy::default().with_minimum_timeout(config.element_timeout);
        Ok(Self {
            config,
            identity,
            launcher,
            probe,
            sleeper,
            events,
            wait,
        })
    }

    /// Connects the live collaborators described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when credentials are missing, the token
    /// request fails, or a client cannot be built.
    pub fn connect(config: HarnessConfig) -> Result<Self, RuntimeError> {
        let credentials = config
            .credentials
            .as_ref()
            .ok_or(ConfigError::Missing(HarnessEnv::PingOneClientId.as_str()))?;
        let identity = PingOneSession::connect(credentials, IDENTITY_REQUEST_TIMEOUT)?;
        let client = WebDriverClient::new(&config.webdriver_url, DEFAULT_COMMAND_TIMEOUT)?;
        let launcher = WebDriverLauncher::new(client, BrowserOptions::default());
        let events = event_sink(&config)?;
        Self::new(config, Arc::new(identity), Arc::new(launcher), Arc::new(ThreadSleeper), events)
    }

    /// Replaces the reachability budget.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Probe`] when the probe client cannot be built.
    pub fn with_reachability_policy(mut self, policy: RetryPolicy) -> Result<Self, RuntimeError> {
        self.probe =
            ReachabilityProbe::new(policy, Arc::clone(&self.sleeper), Arc::clone(&self.events))?;
        Ok(self)
    }

    /// Replaces the element visibility budget.
    #[must_use]
    pub const fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Returns the identity API.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityApi {
        self.identity.as_ref()
    }

    /// Returns a shared handle to the identity API.
    #[must_use]
    pub fn identity_handle(&self) -> Arc<dyn IdentityApi> {
        Arc::clone(&self.identity)
    }

    /// Returns the reachability probe.
    #[must_use]
    pub const fn probe(&self) -> &ReachabilityProbe {
        &self.probe
    }

    /// Returns the event sink.
    #[must_use]
    pub fn events(&self) -> &dyn EventSink {
        self.events.as_ref()
    }

    /// Returns a shared handle to the event sink.
    #[must_use]
    pub fn events_handle(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.events)
    }

    /// Returns the element visibility budget.
    #[must_use]
    pub const fn wait_policy(&self) -> WaitPolicy {
        self.wait
    }

    /// Opens a fresh browser session that quits when dropped.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] when the session cannot be created.
    pub fn launch_browser(&self) -> Result<BrowserGuard, WebDriverError> {
        BrowserGuard::launch(self.launcher.as_ref(), Arc::clone(&self.events))
    }

    /// Returns a marker search bound to this runtime.
    #[must_use]
    pub fn markers(&self) -> MarkerSearch<'_> {
        MarkerSearch::new(self.wait, self.sleeper.as_ref(), self.events.as_ref())
    }

    /// Returns an access verifier bound to this runtime.
    #[must_use]
    pub fn verifier(&self) -> AccessVerifier<'_> {
        AccessVerifier::new(self.markers(), self.events.as_ref())
    }

    /// Returns a login driver starting at `NotLoggedIn`.
    #[must_use]
    pub fn login_driver(&self) -> LoginDriver<'_> {
        LoginDriver::new(self.events.as_ref())
    }
}

/// Builds the configured event sink: a JSON-lines file or stderr.
///
/// # Errors
///
/// Returns [`RuntimeError::EventLog`] when the log file cannot be opened.
pub fn event_sink(config: &HarnessConfig) -> Result<Arc<dyn EventSink>, RuntimeError> {
    match &config.event_log {
        Some(path) => {
            let sink = FileEventSink::new(path).map_err(|err| RuntimeError::EventLog {
                path: path.clone(),
                message: err.to_string(),
            })?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrEventSink)),
    }
}
