// crates/pingone-client/src/metadata.rs
// ============================================================================
// Module: Environment Metadata
// Description: Parser for the tenant environment metadata document.
// Purpose: Resolve the primary PingOne environment id from deployment metadata.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Tenant deployments publish an `information.json` document describing the
//! PingOne environment they are bound to. Only the fields the harness needs
//! are decoded; everything else is ignored.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::PingOneError;

/// PingOne section of the metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PingOneInformation {
    /// Primary environment id.
    environment_id: String,
}

/// Decoded environment metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentMetadata {
    /// PingOne binding for the tenant.
    ping_one_information: PingOneInformation,
}

impl EnvironmentMetadata {
    /// Parses metadata from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`PingOneError::InvalidConfig`] when the document is malformed or
    /// the environment id is empty.
    pub fn from_json(raw: &str) -> Result<Self, PingOneError> {
        let metadata: Self = serde_json::from_str(raw)
            .map_err(|err| PingOneError::InvalidConfig(format!("environment metadata: {err}")))?;
        if metadata.ping_one_information.environment_id.trim().is_empty() {
            return Err(PingOneError::InvalidConfig(
                "environment metadata has an empty environmentId".to_string(),
            ));
        }
        Ok(metadata)
    }

    /// Reads and parses a metadata file.
    ///
    /// # Errors
    ///
    /// Returns [`PingOneError::InvalidConfig`] when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, PingOneError> {
        let raw = fs::read_to_string(path).map_err(|err| {
            PingOneError::InvalidConfig(format!("read {}: {err}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    /// Returns the primary environment id.
    #[must_use]
    pub fn environment_id(&self) -> &str {
        &self.ping_one_information.environment_id
    }
}
