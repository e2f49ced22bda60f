//! Gatecheck Core -- shared types, artifact parsing, rule evaluation, and
//! audit dispatch for the pre-signoff design-bundle audit tool.
//!
//! This crate defines the shared enum types used throughout Gatecheck
//! (verdicts, check families, violations), the top-level error type, and the
//! tracing initialization used by the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub mod actions;
pub mod auditor;
pub mod checks;
pub mod discovery;
pub mod dispatch;
pub mod parsers;
pub mod patterns;
pub mod spec;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Top-level error type for the gatecheck-core crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An I/O error occurred during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error (bad golden spec, missing input root).
    #[error("configuration error: {0}")]
    Config(String),

    /// Worker pool construction failed.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// Tracing/logging initialization failed.
    #[error("tracing initialization error: {0}")]
    TracingInit(String),
}

/// Convenience alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

// ---------------------------------------------------------------------------
// Tracing / Logging
// ---------------------------------------------------------------------------

/// Initialize structured tracing with the given verbosity level.
///
/// # Behaviour
///
/// | `verbose` | `quiet` | Effect                     |
/// |-----------|---------|----------------------------|
/// | `true`    | _       | TRACE level (most verbose) |
/// | _         | `true`  | ERROR level only           |
/// | `false`   | `false` | INFO level (default)       |
///
/// When `trace_log` is given, log lines are written both to stdout and,
/// append-only, to that file (the run trace log). The `RUST_LOG` environment
/// variable, when set, takes precedence over the programmatic level selection
/// so that operators can fine-tune per-module verbosity without recompiling.
///
/// # Errors
///
/// Returns [`CoreError::Io`] if the trace log file cannot be opened, or
/// [`CoreError::TracingInit`] if the global subscriber has already been set
/// (i.e. this function was called more than once in the same process).
pub fn init_tracing(verbose: bool, quiet: bool, trace_log: Option<&Path>) -> Result<(), CoreError> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::fmt::writer::MakeWriterExt;
    use tracing_subscriber::EnvFilter;

    // Determine the base log level from CLI flags.
    let default_level = if verbose {
        "trace"
    } else if quiet {
        "error"
    } else {
        "info"
    };

    // Allow RUST_LOG to override the programmatic default.
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match trace_log {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            fmt()
                .compact()
                .with_ansi(false)
                .with_env_filter(env_filter)
                .with_target(true)
                .with_writer(std::io::stdout.and(std::sync::Arc::new(file)))
                .try_init()
                .map_err(|e| CoreError::TracingInit(e.to_string()))
        }
        None => fmt()
            .compact()
            .with_env_filter(env_filter)
            .with_target(true)
            .try_init()
            .map_err(|e| CoreError::TracingInit(e.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Outcome of auditing one bundle after all rule evaluators have run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// Every check family found the bundle consistent with the golden spec.
    #[serde(rename = "PASS")]
    Pass,
    /// One or more violations were recorded -- the bundle fails the gate.
    #[serde(rename = "FAIL")]
    Fail,
    /// The audit task itself failed unexpectedly; no verdict on the bundle
    /// content could be reached.
    #[serde(rename = "SYSTEM_ERR")]
    SystemError,
}

impl Verdict {
    /// Returns `true` if the verdict indicates a passing bundle.
    #[must_use]
    pub const fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Returns `true` if the verdict indicates a failing bundle.
    #[must_use]
    pub const fn is_fail(self) -> bool {
        matches!(self, Self::Fail)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::SystemError => "SYSTEM_ERR",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// CheckFamily
// ---------------------------------------------------------------------------

/// The four independent check families an audit runs for every bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckFamily {
    /// Required-file presence and status-document content checks.
    Environment,
    /// Netlist header and verification-script consistency checks.
    FormalConsistency,
    /// Tool registry completeness and per-row resource policy checks.
    Resources,
    /// Environment-script PDK version and release date checks.
    PlatformConsistency,
}

impl fmt::Display for CheckFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Environment => "environment",
            Self::FormalConsistency => "formal_consistency",
            Self::Resources => "resources",
            Self::PlatformConsistency => "platform_consistency",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Violation
// ---------------------------------------------------------------------------

/// A single spec deviation recorded by one check family.
///
/// The human-readable message is the behavioral contract (it is what reaches
/// the notification log and the violation export); the family tag records
/// which evaluator produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Which evaluator produced this violation.
    pub family: CheckFamily,
    /// Human-readable description of the deviation.
    pub message: String,
}

impl Violation {
    /// Creates a new violation for the given check family.
    pub fn new(family: CheckFamily, message: impl Into<String>) -> Self {
        Self {
            family,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
