// system-tests/src/config/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Environment-backed configuration for system-test artifacts.
// Purpose: Decide where summaries and page dumps are written.
// Dependencies: console-sso
// ============================================================================

//! ## Overview
//! Values are read with the same strict UTF-8 rules as the harness
//! configuration. Empty values fail closed instead of falling back.

use std::path::PathBuf;

use console_sso::ConfigError;
use console_sso::config::parse_bool_env;
use console_sso::config::read_env_nonempty;
use console_sso::config::read_env_strict;

/// Environment keys for system-test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTestEnv {
    /// Directory receiving artifacts for one test.
    RunRoot,
    /// Allows reusing a run root that already holds a summary.
    AllowOverwrite,
}

impl SystemTestEnv {
    /// Returns the environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RunRoot => "CONSOLE_SSO_RUN_ROOT",
            Self::AllowOverwrite => "CONSOLE_SSO_ALLOW_OVERWRITE",
        }
    }
}

/// System-test settings resolved from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemTestConfig {
    /// Explicit artifact directory; a timestamped one is used when unset.
    pub run_root: Option<PathBuf>,
    /// Whether an existing summary in the run root may be replaced.
    pub allow_overwrite: bool,
}

impl SystemTestConfig {
    /// Loads settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is empty, not UTF-8, or not a
    /// boolean literal where one is expected.
    pub fn load() -> Result<Self, ConfigError> {
        let run_root = read_env_nonempty(SystemTestEnv::RunRoot.as_str())?.map(PathBuf::from);
        let allow_overwrite = parse_bool_env(
            SystemTestEnv::AllowOverwrite.as_str(),
            read_env_strict(SystemTestEnv::AllowOverwrite.as_str())?,
        )?;
        Ok(Self {
            run_root,
            allow_overwrite,
        })
    }
}
