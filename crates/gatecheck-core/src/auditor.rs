//! Bundle auditing -- fact collection, evaluator composition, and the audit
//! result model.
//!
//! The [`BundleAuditor`] owns the mapping from a bundle directory to an audit
//! verdict: it parses every artifact into a [`BundleFacts`] record, runs all
//! four rule evaluators over the facts, and assembles an [`AuditResult`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::checks;
use crate::parsers::{self, HeaderFact, ScriptFacts, StatusRecord, ToolRecord};
use crate::spec::SpecModel;
use crate::{Verdict, Violation};

/// The artifact files every bundle must contain.
pub const REQUIRED_FILES: &[&str] = &[
    "project_status.json",
    "setup.tcl",
    "formal_setup.tcl",
    "tool_info.csv",
];

/// The two generated-netlist variants audited per bundle.
pub const NETLIST_VARIANTS: &[&str] = &["golden", "revised"];

// ---------------------------------------------------------------------------
// BundleIdentity
// ---------------------------------------------------------------------------

/// A bundle's directory and the module name derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleIdentity {
    /// Path to the bundle directory.
    pub dir: PathBuf,
    /// Module name, taken from the directory's final path component. The
    /// bundle's internal artifacts must agree with this name.
    pub name: String,
}

impl BundleIdentity {
    /// Derives a bundle identity from its directory path.
    #[must_use]
    pub fn from_dir(dir: &Path) -> Self {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            dir: dir.to_path_buf(),
            name,
        }
    }

    /// Path of the given netlist variant file (`<name>_<variant>.v`).
    #[must_use]
    pub fn netlist_path(&self, variant: &str) -> PathBuf {
        self.dir.join(format!("{}_{variant}.v", self.name))
    }
}

// ---------------------------------------------------------------------------
// BundleFacts
// ---------------------------------------------------------------------------

/// Everything the rule evaluators need to know about one bundle, parsed
/// up front so the evaluators stay pure.
#[derive(Debug, Clone)]
pub struct BundleFacts {
    /// The bundle's identity.
    pub identity: BundleIdentity,
    /// Required files absent from the bundle directory, sorted by name.
    pub missing_required: Vec<&'static str>,
    /// Status document, `None` when unreadable.
    pub status: Option<StatusRecord>,
    /// Golden netlist header, `None` when the file is absent.
    pub golden_header: Option<HeaderFact>,
    /// Revised netlist header, `None` when the file is absent.
    pub revised_header: Option<HeaderFact>,
    /// Verification script facts, `None` when unreadable.
    pub formal_script: Option<ScriptFacts>,
    /// Environment script facts, `None` when unreadable.
    pub env_script: Option<ScriptFacts>,
    /// Tool registry rows in file order; empty when the registry is
    /// missing or unreadable.
    pub tool_rows: Vec<ToolRecord>,
}

impl BundleFacts {
    /// Parses every artifact of the bundle at `dir` into a fact record.
    #[must_use]
    pub fn collect(dir: &Path) -> Self {
        let identity = BundleIdentity::from_dir(dir);

        let mut missing_required: Vec<&'static str> = REQUIRED_FILES
            .iter()
            .copied()
            .filter(|name| !dir.join(name).is_file())
            .collect();
        missing_required.sort_unstable();

        let facts = Self {
            golden_header: parsers::parse_header(&identity.netlist_path("golden")),
            revised_header: parsers::parse_header(&identity.netlist_path("revised")),
            status: parsers::read_status(&dir.join("project_status.json")),
            formal_script: parsers::parse_script_settings(&dir.join("formal_setup.tcl")),
            env_script: parsers::parse_script_settings(&dir.join("setup.tcl")),
            tool_rows: parsers::read_tool_registry(&dir.join("tool_info.csv")),
            missing_required,
            identity,
        };
        debug!(
            bundle = %facts.identity.name,
            missing_files = facts.missing_required.len(),
            tool_rows = facts.tool_rows.len(),
            "bundle facts collected"
        );
        facts
    }

    /// The owning engineer for notification purposes.
    ///
    /// A readable status document without an `owner` field falls back to
    /// `"Admin"`; an unreadable document falls back to `"Unknown"`.
    #[must_use]
    pub fn owner(&self) -> String {
        match &self.status {
            Some(record) => record.owner.clone().unwrap_or_else(|| "Admin".to_string()),
            None => "Unknown".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// AuditResult
// ---------------------------------------------------------------------------

/// The per-bundle audit outcome, created once by the dispatch layer and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResult {
    /// Bundle/module identifier.
    pub module_id: String,
    /// Owning engineer (for notifications and reporting).
    pub owner: String,
    /// Audit verdict.
    pub verdict: Verdict,
    /// Number of recorded violations.
    pub violation_count: usize,
    /// Recorded violations; non-empty exactly when `verdict` is FAIL.
    pub violations: Vec<Violation>,
    /// Failure description for SYSTEM_ERR results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AuditResult {
    /// Builds a PASS or FAIL result from a violation list.
    ///
    /// The verdict is derived from the list so that the invariant
    /// *FAIL ⇔ violations non-empty* holds by construction.
    #[must_use]
    pub fn from_violations(module_id: String, owner: String, violations: Vec<Violation>) -> Self {
        let verdict = if violations.is_empty() {
            Verdict::Pass
        } else {
            Verdict::Fail
        };
        Self {
            module_id,
            owner,
            verdict,
            violation_count: violations.len(),
            violations,
            detail: None,
        }
    }

    /// Builds a SYSTEM_ERR result for an audit task that failed
    /// unexpectedly. Carries no violations (no verdict on the bundle
    /// content was reached); the failure description goes into `detail`.
    #[must_use]
    pub fn system_error(module_id: String, detail: String) -> Self {
        Self {
            module_id,
            owner: "Unknown".to_string(),
            verdict: Verdict::SystemError,
            violation_count: 0,
            violations: Vec::new(),
            detail: Some(detail),
        }
    }

    /// Violation messages joined for tabular export, or `"All Correct"`
    /// for a clean bundle.
    #[must_use]
    pub fn summary_line(&self) -> String {
        if self.violations.is_empty() {
            match &self.detail {
                Some(detail) => detail.clone(),
                None => "All Correct".to_string(),
            }
        } else {
            self.violations
                .iter()
                .map(|v| v.message.as_str())
                .collect::<Vec<_>>()
                .join(" | ")
        }
    }
}

// ---------------------------------------------------------------------------
// BundleAuditor
// ---------------------------------------------------------------------------

/// Composes the four rule evaluators for one bundle.
///
/// Auditors are cheap to construct and hold only a shared reference to the
/// immutable golden spec, so each dispatch task builds its own.
#[derive(Debug, Clone, Copy)]
pub struct BundleAuditor<'a> {
    spec: &'a SpecModel,
}

impl<'a> BundleAuditor<'a> {
    /// Creates an auditor for the given golden spec.
    #[must_use]
    pub fn new(spec: &'a SpecModel) -> Self {
        Self { spec }
    }

    /// Runs all four check families over previously collected facts.
    ///
    /// Evaluators never short-circuit each other; the returned list carries
    /// the violations of every family in evaluator order.
    #[must_use]
    pub fn evaluate(&self, facts: &BundleFacts) -> Vec<Violation> {
        let mut violations = checks::check_environment(self.spec, facts);
        violations.extend(checks::check_formal_consistency(self.spec, facts));
        violations.extend(checks::check_resources(self.spec, facts));
        violations.extend(checks::check_platform_consistency(self.spec, facts));
        violations
    }

    /// Audits the bundle at `dir`: collects facts, runs every evaluator,
    /// and produces the bundle's [`AuditResult`].
    #[must_use]
    pub fn audit(&self, dir: &Path) -> AuditResult {
        let facts = BundleFacts::collect(dir);
        let violations = self.evaluate(&facts);
        AuditResult::from_violations(facts.identity.name.clone(), facts.owner(), violations)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
