//! Gatecheck CLI -- command-line interface for the pre-signoff bundle audit
//! tool.
//!
//! This crate provides the CLI entry point, argument parsing, exit code
//! definitions, and the orchestration that ties together the audit engine
//! and the report formatters.

use std::fmt;

pub mod commands;

// ---------------------------------------------------------------------------
// Exit Codes
// ---------------------------------------------------------------------------

/// Gatecheck process exit codes.
///
/// These exit codes allow CI/CD pipelines and shell scripts to distinguish
/// between different termination reasons without parsing output.
///
/// | Code | Meaning                                          |
/// |------|--------------------------------------------------|
/// | 0    | Audit completed, every bundle passed             |
/// | 1    | Audit completed, one or more bundles failed      |
/// | 2    | Engine error (dispatch or report-write failure)  |
/// | 3    | Configuration error (bad spec, missing input)    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExitCode {
    /// Audit completed, every bundle passed.
    Pass = 0,
    /// Audit completed, at least one bundle failed or hit a system error.
    AuditFail = 1,
    /// Engine error (worker pool or report-write failure).
    EngineError = 2,
    /// Configuration error (missing/unparseable spec, missing input root).
    ConfigError = 3,
}

impl ExitCode {
    /// Returns the numeric exit code as a `u8`.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns all exit code variants.
    #[must_use]
    pub const fn all() -> &'static [ExitCode] {
        &[
            Self::Pass,
            Self::AuditFail,
            Self::EngineError,
            Self::ConfigError,
        ]
    }

    /// Returns a human-readable description of this exit code.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Pass => "audit completed, every bundle passed",
            Self::AuditFail => "audit completed, one or more bundles failed",
            Self::EngineError => "engine error (dispatch or report-write failure)",
            Self::ConfigError => "configuration error (bad spec, missing input root)",
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exit code {} ({})", self.as_u8(), self.description())
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_u8())
    }
}

/// Terminate the process with the given [`ExitCode`].
///
/// Logs the exit reason at the appropriate tracing level (info for
/// [`ExitCode::Pass`], error for everything else) and returns the
/// corresponding [`std::process::ExitCode`] suitable for use as a `main`
/// return value.
pub fn terminate(code: ExitCode) -> std::process::ExitCode {
    match code {
        ExitCode::Pass => {
            tracing::info!(%code, "gatecheck exiting");
        }
        _ => {
            tracing::error!(%code, "gatecheck exiting with error");
        }
    }
    code.into()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_numeric_values() {
        assert_eq!(ExitCode::Pass.as_u8(), 0);
        assert_eq!(ExitCode::AuditFail.as_u8(), 1);
        assert_eq!(ExitCode::EngineError.as_u8(), 2);
        assert_eq!(ExitCode::ConfigError.as_u8(), 3);
    }

    #[test]
    fn exit_code_display() {
        let display = ExitCode::Pass.to_string();
        assert!(display.contains("0"));
        assert!(display.contains("every bundle passed"));

        let display = ExitCode::AuditFail.to_string();
        assert!(display.contains("1"));
        assert!(display.contains("one or more bundles failed"));

        let display = ExitCode::ConfigError.to_string();
        assert!(display.contains("3"));
        assert!(display.contains("configuration error"));
    }

    #[test]
    fn exit_code_all_variants() {
        let all = ExitCode::all();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], ExitCode::Pass);
        assert_eq!(all[3], ExitCode::ConfigError);
    }

    #[test]
    fn exit_code_descriptions_non_empty() {
        for code in ExitCode::all() {
            assert!(!code.description().is_empty());
        }
    }

    #[test]
    fn terminate_returns_process_exit_code() {
        let _ = terminate(ExitCode::Pass);
        let _ = terminate(ExitCode::EngineError);
    }
}
