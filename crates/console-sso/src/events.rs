// crates/console-sso/src/events.rs
// ============================================================================
// Module: Harness Events
// Description: Structured JSON-line events for harness activity.
// Purpose: Record retries, user lifecycle, login progress, and verdicts.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every observable step of a run is emitted as a [`HarnessEvent`] to an
//! [`EventSink`]. Sinks serialize one JSON object per line so runs can be
//! replayed or grepped after the fact.
//! Invariants:
//! - Events never carry passwords or bearer tokens.
//! - Sink failures never fail the run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::login::LoginState;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    /// A failed attempt will be retried.
    RetryScheduled {
        /// Operation label.
        operation: String,
        /// Attempt that failed (1-based).
        attempt: u32,
        /// Attempt budget.
        max_attempts: u32,
        /// Delay before the next attempt in milliseconds.
        delay_ms: u64,
        /// Error observed.
        error: String,
    },
    /// A URL answered with a success status.
    UrlReachable {
        /// Probed URL.
        url: String,
        /// Attempts used.
        attempts: u32,
    },
    /// A test user was created.
    UserProvisioned {
        /// Username.
        username: String,
        /// Owning environment.
        environment_id: String,
        /// Whether the platform role was attached.
        platform_role: bool,
    },
    /// A test user delete completed.
    UserDeleted {
        /// Username.
        username: String,
        /// Owning environment.
        environment_id: String,
        /// False when the user did not exist.
        removed: bool,
    },
    /// A test user delete failed.
    UserDeleteFailed {
        /// Username.
        username: String,
        /// Owning environment.
        environment_id: String,
        /// Error message.
        error: String,
    },
    /// A browser session was opened.
    BrowserLaunched {
        /// WebDriver session id.
        session_id: String,
    },
    /// A browser session was closed.
    BrowserClosed {
        /// WebDriver session id.
        session_id: String,
        /// Quit error, if any.
        error: Option<String>,
    },
    /// A marker search finished.
    MarkerSearch {
        /// Locator that matched, if any.
        matched: Option<String>,
        /// Per-locator misses rendered as text.
        misses: Vec<String>,
    },
    /// The login state machine advanced.
    LoginTransition {
        /// Previous state.
        from: LoginState,
        /// New state.
        to: LoginState,
    },
    /// An access expectation was evaluated.
    AccessChecked {
        /// Console name.
        console: String,
        /// Expected verdict (`granted` or `denied`).
        expected: String,
        /// Whether the expectation held.
        passed: bool,
    },
    /// A battery case finished.
    CaseFinished {
        /// Console name.
        console: String,
        /// Case name.
        case: String,
        /// Whether the case passed.
        passed: bool,
        /// Failure detail.
        detail: Option<String>,
    },
    /// An ingress endpoint was checked.
    IngressChecked {
        /// Checked URL.
        url: String,
        /// Status code, when a response arrived.
        status: Option<u16>,
        /// Whether the check passed.
        passed: bool,
    },
}

/// Timestamped harness event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarnessEvent {
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event payload.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl HarnessEvent {
    /// Stamps an event with the current time.
    #[must_use]
    pub fn now(kind: EventKind) -> Self {
        Self {
            timestamp_ms: now_millis(),
            kind,
        }
    }
}

/// Returns the current time in milliseconds since the epoch.
#[must_use]
pub fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Destination for harness events.
pub trait EventSink: Send + Sync {
    /// Records an event.
    fn record(&self, event: &HarnessEvent);

    /// Stamps and records an event payload.
    fn emit(&self, kind: EventKind) {
        self.record(&HarnessEvent::now(kind));
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Event sink that logs JSON lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrEventSink;

impl EventSink for StderrEventSink {
    fn record(&self, event: &HarnessEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Event sink that appends JSON lines to a file.
#[derive(Debug)]
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl EventSink for FileEventSink {
    fn record(&self, event: &HarnessEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Event sink that keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    /// Recorded events in order.
    events: Mutex<Vec<HarnessEvent>>,
}

impl MemoryEventSink {
    /// Returns a snapshot of recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HarnessEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Returns recorded payloads without timestamps.
    #[must_use]
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().into_iter().map(|event| event.kind).collect()
    }
}

impl EventSink for MemoryEventSink {
    fn record(&self, event: &HarnessEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// No-op event sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn record(&self, _event: &HarnessEvent) {}
}
