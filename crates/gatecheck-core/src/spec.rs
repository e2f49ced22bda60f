//! Golden specification model and loader.
//!
//! The golden spec is the canonical set of target values every bundle is
//! checked against: process id, release date, signoff stage, legal PDK
//! version, and the required signoff tool set. It is loaded once per run and
//! shared read-only across all bundle audits.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::CoreError;

// ---------------------------------------------------------------------------
// SpecModel
// ---------------------------------------------------------------------------

/// The golden specification all bundles are audited against.
///
/// Immutable after load; audits hold a shared reference only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecModel {
    /// Target process identifier (e.g. `"N7"`).
    pub process: String,
    /// Spec release date as an ISO date string. Compared by exact string
    /// equality, never by temporal parsing.
    pub release_date: String,
    /// The signoff stage every bundle must have reached (e.g. `"layout_done"`).
    pub signoff_target: String,
    /// The only legal PDK version for this release (e.g. `"v3.0"`).
    pub legal_pdk_version: String,
    /// Tools that must appear in every bundle's tool registry.
    pub required_tools: Vec<String>,
}

impl SpecModel {
    /// Returns the required tools as a sorted set for membership checks.
    #[must_use]
    pub fn required_tool_set(&self) -> BTreeSet<&str> {
        self.required_tools.iter().map(String::as_str).collect()
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Loads the golden spec from a YAML document.
///
/// # Errors
///
/// Returns [`CoreError::Config`] if the file cannot be read or does not
/// deserialize into a [`SpecModel`]. Spec-load failure is configuration-fatal:
/// the caller must abort the run before any bundle is dispatched.
pub fn load_spec(path: &Path) -> Result<SpecModel, CoreError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        CoreError::Config(format!("cannot read golden spec '{}': {e}", path.display()))
    })?;
    let spec: SpecModel = serde_yml::from_str(&contents).map_err(|e| {
        CoreError::Config(format!(
            "failed to parse golden spec '{}': {e}",
            path.display()
        ))
    })?;
    info!(
        process = %spec.process,
        release_date = %spec.release_date,
        signoff_target = %spec.signoff_target,
        pdk = %spec.legal_pdk_version,
        required_tools = spec.required_tools.len(),
        "golden spec loaded"
    );
    Ok(spec)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
