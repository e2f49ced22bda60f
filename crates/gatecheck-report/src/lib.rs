//! Gatecheck Report -- result aggregation and output formatters.
//!
//! This crate consumes the audit engine's per-bundle results and renders the
//! run outputs: summary statistics, the HTML dashboard, the CSV violation
//! export, and the machine-readable JSON report.

use serde::{Deserialize, Serialize};

use gatecheck_core::auditor::AuditResult;

pub mod csv_export;
pub mod html;
pub mod json;

pub use csv_export::{export_violation_csv, render_violation_csv, write_violation_csv};
pub use html::render_dashboard;
pub use json::{build_report, format_report, AuditReport, ReportOptions};
pub use json::{ENGINE_VERSION, SCHEMA_VERSION};

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Aggregate statistics over one audit run.
///
/// `failed` counts every bundle that did not pass, including SYSTEM_ERR
/// results; `system_errors` breaks those out separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total number of audited bundles.
    pub total: usize,
    /// Bundles with a PASS verdict.
    pub passed: usize,
    /// Bundles that did not pass (FAIL plus SYSTEM_ERR).
    pub failed: usize,
    /// Bundles whose audit task itself failed.
    pub system_errors: usize,
}

impl RunSummary {
    /// Computes the summary for a result set.
    #[must_use]
    pub fn from_results(results: &[AuditResult]) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.verdict.is_pass()).count();
        let system_errors = results
            .iter()
            .filter(|r| r.verdict == gatecheck_core::Verdict::SystemError)
            .count();
        Self {
            total,
            passed,
            failed: total - passed,
            system_errors,
        }
    }

    /// Pass rate in percent; 0.0 for an empty run.
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64 * 100.0
        }
    }

    /// Fail rate in percent; 0.0 for an empty run.
    #[must_use]
    pub fn fail_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.failed as f64 / self.total as f64 * 100.0
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use gatecheck_core::{CheckFamily, Violation};

    fn pass(id: &str) -> AuditResult {
        AuditResult::from_violations(id.to_string(), "engineer_1".to_string(), Vec::new())
    }

    fn fail(id: &str) -> AuditResult {
        AuditResult::from_violations(
            id.to_string(),
            "engineer_1".to_string(),
            vec![Violation::new(CheckFamily::Environment, "process mismatch: found N12")],
        )
    }

    #[test]
    fn summary_counts_and_rates() {
        let results = vec![
            pass("mod_001"),
            fail("mod_002"),
            pass("mod_003"),
            AuditResult::system_error("mod_004".to_string(), "worker panicked".to_string()),
        ];
        let summary = RunSummary::from_results(&results);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.system_errors, 1);
        assert!((summary.pass_rate() - 50.0).abs() < f64::EPSILON);
        assert!((summary.fail_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_run_rates_are_zero() {
        let summary = RunSummary::from_results(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.pass_rate().abs() < f64::EPSILON);
        assert!(summary.fail_rate().abs() < f64::EPSILON);
    }
}
