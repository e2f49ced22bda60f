//! Gatecheck Audit JSON v1.0.0 report formatter.
//!
//! Produces a deterministic JSON report containing the golden spec, the run
//! summary, and every per-bundle result in ascending module-id order. The
//! schema is versioned and designed for machine consumption by dashboards
//! and downstream tooling.
//!
//! Timestamps are opt-in: the default output is byte-identical across runs
//! over an unchanged bundle set.

use serde::{Deserialize, Serialize};

use gatecheck_core::auditor::AuditResult;
use gatecheck_core::spec::SpecModel;

use crate::RunSummary;

/// Current schema version for the Gatecheck Audit JSON format.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Engine version extracted from this crate's Cargo.toml.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// Report structs
// ---------------------------------------------------------------------------

/// Top-level Gatecheck Audit JSON report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    /// Schema version identifier (always `"1.0.0"`).
    pub schema_version: String,

    /// Version of the Gatecheck engine that produced this report.
    pub engine_version: String,

    /// ISO 8601 generation timestamp. Omitted by default for deterministic
    /// output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,

    /// The golden spec the batch was audited against.
    pub spec: SpecModel,

    /// Aggregate counts and rates.
    pub summary: RunSummary,

    /// Per-bundle results, ascending by module id.
    pub results: Vec<AuditResult>,
}

/// Options controlling report generation.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Generation timestamp to embed, or `None` for deterministic output.
    pub generated_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Assembles the report structure from a run's results.
#[must_use]
pub fn build_report(
    spec: &SpecModel,
    results: &[AuditResult],
    options: &ReportOptions,
) -> AuditReport {
    AuditReport {
        schema_version: SCHEMA_VERSION.to_string(),
        engine_version: ENGINE_VERSION.to_string(),
        generated_at: options.generated_at.clone(),
        spec: spec.clone(),
        summary: RunSummary::from_results(results),
        results: results.to_vec(),
    }
}

/// Renders the report as pretty-printed JSON.
#[must_use]
pub fn format_report(spec: &SpecModel, results: &[AuditResult], options: &ReportOptions) -> String {
    let report = build_report(spec, results, options);
    serde_json::to_string_pretty(&report).expect("audit report serializes")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use gatecheck_core::{CheckFamily, Verdict, Violation};

    fn spec() -> SpecModel {
        SpecModel {
            process: "N7".into(),
            release_date: "2025-05-13".into(),
            signoff_target: "layout_done".into(),
            legal_pdk_version: "v3.0".into(),
            required_tools: vec!["VCS".into(), "PrimeTime".into()],
        }
    }

    fn results() -> Vec<AuditResult> {
        vec![
            AuditResult::from_violations("mod_001".into(), "engineer_1".into(), Vec::new()),
            AuditResult::from_violations(
                "mod_002".into(),
                "engineer_2".into(),
                vec![Violation::new(
                    CheckFamily::PlatformConsistency,
                    "illegal PDK version: v2.0",
                )],
            ),
        ]
    }

    #[test]
    fn report_structure_and_counts() {
        let report = build_report(&spec(), &results(), &ReportOptions::default());
        assert_eq!(report.schema_version, "1.0.0");
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.passed, 1);
        assert_eq!(report.results[0].verdict, Verdict::Pass);
        assert_eq!(report.results[1].verdict, Verdict::Fail);
    }

    #[test]
    fn default_output_is_deterministic() {
        let first = format_report(&spec(), &results(), &ReportOptions::default());
        let second = format_report(&spec(), &results(), &ReportOptions::default());
        assert_eq!(first, second);
        assert!(!first.contains("generated_at"));
    }

    #[test]
    fn timestamp_is_embedded_when_requested() {
        let options = ReportOptions {
            generated_at: Some("2025-05-13T09:00:00Z".to_string()),
        };
        let output = format_report(&spec(), &results(), &options);
        assert!(output.contains("\"generated_at\": \"2025-05-13T09:00:00Z\""));
    }

    #[test]
    fn report_roundtrips_through_serde() {
        let report = build_report(&spec(), &results(), &ReportOptions::default());
        let json = serde_json::to_string(&report).unwrap();
        let back: AuditReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.results.len(), 2);
        assert_eq!(back.results[1].violations.len(), 1);
    }

    #[test]
    fn verdicts_serialize_with_wire_labels() {
        let json = format_report(&spec(), &results(), &ReportOptions::default());
        assert!(json.contains("\"PASS\""));
        assert!(json.contains("\"FAIL\""));
    }
}
