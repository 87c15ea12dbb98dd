// crates/console-sso/src/markers.rs
// ============================================================================
// Module: Page Markers
// Description: Ordered marker search with explicit per-locator outcomes.
// Purpose: Decide which of several acceptable page states is showing.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A console page may render one of several acceptable markers. Locators are
//! tried in order; each is looked up once (the driver's implicit wait applies)
//! and, if found, polled for visibility under a [`WaitPolicy`]. The result is a
//! [`MarkerOutcome`] naming the matching marker, or every miss with its reason.
//! Invariants:
//! - "Not found" and "found but not displayed" are always distinguished.
//! - Driver failures other than "no such element" propagate as errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use crate::browser::Browser;
use crate::events::EventKind;
use crate::events::EventSink;
use crate::retry::RetryPolicy;
use crate::retry::Sleeper;
use crate::webdriver::ElementRef;
use crate::webdriver::Locator;
use crate::webdriver::WebDriverError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Visibility timeout per locator.
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between visibility polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

// ============================================================================
// SECTION: Wait Policy
// ============================================================================

/// Visibility polling budget for one locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Total time allowed for the element to become visible.
    pub timeout: Duration,
    /// Interval between checks.
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_VISIBILITY_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitPolicy {
    /// Raises the timeout to at least `minimum`.
    #[must_use]
    pub fn with_minimum_timeout(self, minimum: Option<Duration>) -> Self {
        match minimum {
            Some(minimum) if minimum > self.timeout => Self {
                timeout: minimum,
                ..self
            },
            _ => self,
        }
    }

    /// Number of visibility checks that fit in the timeout (at least one).
    #[must_use]
    pub fn polls(&self) -> u32 {
        let interval = self.poll_interval.as_millis().max(1);
        let polls = self.timeout.as_millis().div_ceil(interval).max(1);
        u32::try_from(polls).unwrap_or(u32::MAX)
    }

    /// Converts the budget into a retry policy (one extra check at t=0).
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.polls().saturating_add(1), self.poll_interval)
    }
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Why a locator did not produce a visible marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    /// The driver reported `no such element`.
    NotFound,
    /// The element exists but stayed hidden for every check.
    NotDisplayed {
        /// Visibility checks performed.
        checks: u32,
    },
    /// The element detached from the page while being checked.
    Detached,
}

/// One locator that did not match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerMiss {
    /// Locator tried.
    pub locator: Locator,
    /// Reason for the miss.
    pub reason: MissReason,
}

impl fmt::Display for MarkerMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            MissReason::NotFound => write!(f, "{}: not found", self.locator),
            MissReason::NotDisplayed {
                checks,
            } => write!(f, "{}: found but not displayed after {checks} checks", self.locator),
            MissReason::Detached => write!(f, "{}: detached while waiting", self.locator),
        }
    }
}

/// Result of an ordered marker search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerOutcome {
    /// A marker became visible.
    Displayed {
        /// Locator that matched.
        locator: Locator,
        /// Misses for locators tried before the match.
        misses: Vec<MarkerMiss>,
    },
    /// No marker became visible.
    NoneDisplayed {
        /// One miss per locator, in order.
        misses: Vec<MarkerMiss>,
    },
}

impl MarkerOutcome {
    /// Returns true when a marker matched.
    #[must_use]
    pub const fn is_displayed(&self) -> bool {
        matches!(self, Self::Displayed { .. })
    }

    /// Returns the matching locator.
    #[must_use]
    pub const fn matched(&self) -> Option<&Locator> {
        match self {
            Self::Displayed {
                locator,
                ..
            } => Some(locator),
            Self::NoneDisplayed {
                ..
            } => None,
        }
    }

    /// Returns the recorded misses.
    #[must_use]
    pub fn misses(&self) -> &[MarkerMiss] {
        match self {
            Self::Displayed {
                misses,
                ..
            }
            | Self::NoneDisplayed {
                misses,
            } => misses,
        }
    }
}

// ============================================================================
// SECTION: Search
// ============================================================================

/// Marker search bound to a wait policy and delay driver.
#[derive(Clone, Copy)]
pub struct MarkerSearch<'a> {
    /// Visibility budget per locator.
    policy: WaitPolicy,
    /// Delay driver.
    sleeper: &'a dyn Sleeper,
    /// Event destination.
    events: &'a dyn EventSink,
}

impl<'a> MarkerSearch<'a> {
    /// Creates a marker search.
    #[must_use]
    pub const fn new(policy: WaitPolicy, sleeper: &'a dyn Sleeper, events: &'a dyn EventSink) -> Self {
        Self {
            policy,
            sleeper,
            events,
        }
    }

    /// Returns the visibility budget.
    #[must_use]
    pub const fn policy(&self) -> WaitPolicy {
        self.policy
    }

    /// Waits for one locator to be displayed.
    ///
    /// Returns the element when visible, or the reason it is not.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] for driver failures other than a missing
    /// or detached element.
    pub fn wait_until_element_displayed(
        &self,
        browser: &mut dyn Browser,
        locator: &Locator,
    ) -> Result<Result<ElementRef, MissReason>, WebDriverError> {
        let element = match browser.find_element(locator) {
            Ok(element) => element,
            Err(err) if err.is_no_such_element() => return Ok(Err(MissReason::NotFound)),
            Err(err) => return Err(err),
        };
        let retry = self.policy.retry_policy();
        let checked = retry.execute(
            self.sleeper,
            |_| match browser.is_displayed(&element) {
                Ok(true) => Ok(()),
                Ok(false) => Err(VisibilityCheck::Hidden),
                Err(WebDriverError::StaleElement {
                    ..
                }) => Err(VisibilityCheck::Detached),
                Err(err) => Err(VisibilityCheck::Failed(err)),
            },
            |check| matches!(check, VisibilityCheck::Hidden),
            |_| {},
        );
        match checked {
            Ok(()) => Ok(Ok(element)),
            Err(failure) => match failure.error {
                VisibilityCheck::Hidden => Ok(Err(MissReason::NotDisplayed {
                    checks: failure.attempts,
                })),
                VisibilityCheck::Detached => Ok(Err(MissReason::Detached)),
                VisibilityCheck::Failed(err) => Err(err),
            },
        }
    }

    /// Tries each locator in order and reports the first visible marker.
    ///
    /// # Errors
    ///
    /// Returns [`WebDriverError`] for driver failures other than a missing
    /// or detached element.
    pub fn any_element_displayed(
        &self,
        browser: &mut dyn Browser,
        locators: &[Locator],
    ) -> Result<MarkerOutcome, WebDriverError> {
        let mut misses = Vec::new();
        for locator in locators {
            match self.wait_until_element_displayed(browser, locator)? {
                Ok(_) => {
                    self.events.emit(EventKind::MarkerSearch {
                        matched: Some(locator.to_string()),
                        misses: misses.iter().map(ToString::to_string).collect(),
                    });
                    return Ok(MarkerOutcome::Displayed {
                        locator: locator.clone(),
                        misses,
                    });
                }
                Err(reason) => misses.push(MarkerMiss {
                    locator: locator.clone(),
                    reason,
                }),
            }
        }
        self.events.emit(EventKind::MarkerSearch {
            matched: None,
            misses: misses.iter().map(ToString::to_string).collect(),
        });
        Ok(MarkerOutcome::NoneDisplayed {
            misses,
        })
    }
}

/// Result of one visibility check.
enum VisibilityCheck {
    /// Element reported hidden.
    Hidden,
    /// Element detached from the document.
    Detached,
    /// Driver failure.
    Failed(WebDriverError),
}

/// Counts elements matching `locator` without failing on zero matches.
///
/// # Errors
///
/// Returns [`WebDriverError`] when the lookup fails.
pub fn count_elements(browser: &mut dyn Browser, locator: &Locator) -> Result<usize, WebDriverError> {
    Ok(browser.find_elements(locator)?.len())
}
