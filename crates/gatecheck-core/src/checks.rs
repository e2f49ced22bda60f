//! Rule evaluators for the four bundle check families.
//!
//! Every evaluator is a pure function over previously parsed facts plus the
//! golden [`SpecModel`]; none of them touch the filesystem. All four run
//! unconditionally for every bundle (no short-circuiting between families),
//! so a single bundle can accumulate violations from multiple families in
//! one pass.
//!
//! # Comparison semantics
//!
//! Date and version fields are compared by exact string equality, never by
//! temporal or semantic parsing: `2025-5-13` does not equal `2025-05-13`.
//! An absent field never equals a spec value, so absence surfaces as the
//! corresponding mismatch violation with the absence sentinel in the
//! message (`NOT_FOUND` for header/status fields, `MISSING` for script and
//! registry fields).

use std::collections::BTreeSet;

use crate::auditor::BundleFacts;
use crate::parsers::{HeaderFact, ToolRecord};
use crate::spec::SpecModel;
use crate::{CheckFamily, Violation};

/// Sentinel rendered for absent header or status fields.
const NOT_FOUND: &str = "NOT_FOUND";
/// Sentinel rendered for absent script or registry fields.
const MISSING: &str = "MISSING";

fn shown<'a>(field: &'a Option<String>, sentinel: &'static str) -> &'a str {
    field.as_deref().unwrap_or(sentinel)
}

// ---------------------------------------------------------------------------
// Tool resource policy
// ---------------------------------------------------------------------------

/// Per-tool resource policy: minimum memory and the required scheduling
/// priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolPolicy {
    /// Tool name the policy applies to.
    pub tool: &'static str,
    /// Minimum memory allocation in GB.
    pub min_memory_gb: u32,
    /// Exact priority label the assignment must carry.
    pub required_priority: &'static str,
}

/// The signoff tool policy table.
pub const TOOL_POLICIES: &[ToolPolicy] = &[
    ToolPolicy {
        tool: "PrimeTime",
        min_memory_gb: 256,
        required_priority: "High",
    },
    ToolPolicy {
        tool: "RedHawk",
        min_memory_gb: 512,
        required_priority: "High",
    },
    ToolPolicy {
        tool: "Formality",
        min_memory_gb: 64,
        required_priority: "Medium",
    },
    ToolPolicy {
        tool: "VCS",
        min_memory_gb: 128,
        required_priority: "Low",
    },
];

/// Minimum memory for tools without a dedicated policy entry. Priority is
/// not checked for such tools.
pub const FALLBACK_MIN_MEMORY_GB: u32 = 32;

/// Looks up the policy entry for a tool name, if one exists.
#[must_use]
pub fn policy_for(tool: &str) -> Option<&'static ToolPolicy> {
    TOOL_POLICIES.iter().find(|p| p.tool == tool)
}

// ---------------------------------------------------------------------------
// Environment check
// ---------------------------------------------------------------------------

/// Verifies required-file presence and the status document's content.
///
/// Produces one violation for the missing-file subset (if any), one per
/// mismatched status field, and one if the status document is unreadable.
#[must_use]
pub fn check_environment(spec: &SpecModel, facts: &BundleFacts) -> Vec<Violation> {
    let mut violations = Vec::new();

    if !facts.missing_required.is_empty() {
        violations.push(Violation::new(
            CheckFamily::Environment,
            format!(
                "required bundle files missing: {:?}",
                facts.missing_required
            ),
        ));
    }

    match &facts.status {
        Some(status) => {
            if status.process.as_deref() != Some(spec.process.as_str()) {
                violations.push(Violation::new(
                    CheckFamily::Environment,
                    format!("process mismatch: found {}", shown(&status.process, NOT_FOUND)),
                ));
            }
            if status.status.as_deref() != Some(spec.signoff_target.as_str()) {
                violations.push(Violation::new(
                    CheckFamily::Environment,
                    format!(
                        "signoff stage mismatch: found {}",
                        shown(&status.status, NOT_FOUND)
                    ),
                ));
            }
            if status.last_modified.as_deref() != Some(spec.release_date.as_str()) {
                violations.push(Violation::new(
                    CheckFamily::Environment,
                    format!(
                        "status document date mismatch: found {}",
                        shown(&status.last_modified, NOT_FOUND)
                    ),
                ));
            }
            if status.module_name.as_deref() != Some(facts.identity.name.as_str()) {
                violations.push(Violation::new(
                    CheckFamily::Environment,
                    format!(
                        "internal module name conflict: found {}",
                        shown(&status.module_name, NOT_FOUND)
                    ),
                ));
            }
        }
        None => violations.push(Violation::new(
            CheckFamily::Environment,
            "status document unreadable (project_status.json)",
        )),
    }

    violations
}

// ---------------------------------------------------------------------------
// Formal-consistency check
// ---------------------------------------------------------------------------

fn check_netlist_variant(
    spec: &SpecModel,
    bundle_name: &str,
    variant: &str,
    header: Option<&HeaderFact>,
    violations: &mut Vec<Violation>,
) {
    match header {
        None => violations.push(Violation::new(
            CheckFamily::FormalConsistency,
            format!("cannot access {variant} netlist"),
        )),
        Some(h) => {
            if h.date.as_deref() != Some(spec.release_date.as_str()) {
                violations.push(Violation::new(
                    CheckFamily::FormalConsistency,
                    format!("{variant} netlist date stale: {}", shown(&h.date, NOT_FOUND)),
                ));
            }
            if h.module_name.as_deref() != Some(bundle_name) {
                violations.push(Violation::new(
                    CheckFamily::FormalConsistency,
                    format!(
                        "{variant} netlist module name mismatch: {}",
                        shown(&h.module_name, NOT_FOUND)
                    ),
                ));
            }
        }
    }
}

/// Checks both netlist variants and the verification script.
///
/// Per variant: a missing netlist is one violation; otherwise the header
/// date and declared module name are independently checked (up to two
/// violations). The verification script must reference at least two library
/// versions; with two or more references, more than one distinct version is
/// a conflict. The script's creation date must equal the spec release date.
/// An unparseable script is one violation that short-circuits its own
/// sub-checks only.
#[must_use]
pub fn check_formal_consistency(spec: &SpecModel, facts: &BundleFacts) -> Vec<Violation> {
    let mut violations = Vec::new();

    check_netlist_variant(
        spec,
        &facts.identity.name,
        "golden",
        facts.golden_header.as_ref(),
        &mut violations,
    );
    check_netlist_variant(
        spec,
        &facts.identity.name,
        "revised",
        facts.revised_header.as_ref(),
        &mut violations,
    );

    match &facts.formal_script {
        Some(script) => {
            let libs = &script.library_versions;
            if libs.len() < 2 {
                violations.push(Violation::new(
                    CheckFamily::FormalConsistency,
                    "verification script missing library definitions",
                ));
            } else {
                let distinct: BTreeSet<&str> = libs.iter().map(String::as_str).collect();
                if distinct.len() > 1 {
                    violations.push(Violation::new(
                        CheckFamily::FormalConsistency,
                        format!("verification script library version conflict: {libs:?}"),
                    ));
                }
            }
            if script.creation_date.as_deref() != Some(spec.release_date.as_str()) {
                violations.push(Violation::new(
                    CheckFamily::FormalConsistency,
                    format!(
                        "verification script creation date mismatch: {}",
                        shown(&script.creation_date, MISSING)
                    ),
                ));
            }
        }
        None => violations.push(Violation::new(
            CheckFamily::FormalConsistency,
            "verification script unparseable (formal_setup.tcl)",
        )),
    }

    violations
}

// ---------------------------------------------------------------------------
// Resource/tooling check
// ---------------------------------------------------------------------------

fn check_tool_row(spec: &SpecModel, row: &ToolRecord, violations: &mut Vec<Violation>) {
    let tool = shown(&row.tool_name, MISSING);

    if row.report_date.as_deref() != Some(spec.release_date.as_str()) {
        violations.push(Violation::new(
            CheckFamily::Resources,
            format!(
                "tool {tool} report date deviates: {}",
                shown(&row.report_date, MISSING)
            ),
        ));
    }

    match policy_for(tool) {
        Some(policy) => {
            if row.memory_gb < policy.min_memory_gb {
                violations.push(Violation::new(
                    CheckFamily::Resources,
                    format!("tool {tool} memory below minimum: only {} GB", row.memory_gb),
                ));
            }
            if row.priority.as_deref() != Some(policy.required_priority) {
                violations.push(Violation::new(
                    CheckFamily::Resources,
                    format!(
                        "tool {tool} priority incorrect: currently {}",
                        shown(&row.priority, MISSING)
                    ),
                ));
            }
        }
        None => {
            if row.memory_gb < FALLBACK_MIN_MEMORY_GB {
                violations.push(Violation::new(
                    CheckFamily::Resources,
                    format!("unknown tool {tool} under-resourced: only {} GB", row.memory_gb),
                ));
            }
        }
    }
}

/// Checks registry completeness against the required tool set, then every
/// row (duplicates included) against the report date and the resource
/// policy table.
///
/// The per-row checks run regardless of whether the completeness check
/// passed; each threshold or priority breach is an independent violation.
#[must_use]
pub fn check_resources(spec: &SpecModel, facts: &BundleFacts) -> Vec<Violation> {
    let mut violations = Vec::new();

    let present: BTreeSet<&str> = facts
        .tool_rows
        .iter()
        .filter_map(|r| r.tool_name.as_deref())
        .filter(|name| !name.is_empty())
        .collect();
    let required = spec.required_tool_set();
    let missing: Vec<&str> = required.difference(&present).copied().collect();
    if !missing.is_empty() {
        violations.push(Violation::new(
            CheckFamily::Resources,
            format!("tool registry missing required tools: {missing:?}"),
        ));
    }

    for row in &facts.tool_rows {
        check_tool_row(spec, row, &mut violations);
    }

    violations
}

// ---------------------------------------------------------------------------
// Platform-consistency check
// ---------------------------------------------------------------------------

/// Checks the environment script's declared PDK version and release date
/// against the golden spec. An unreadable script is one violation.
#[must_use]
pub fn check_platform_consistency(spec: &SpecModel, facts: &BundleFacts) -> Vec<Violation> {
    let mut violations = Vec::new();

    match &facts.env_script {
        Some(script) => {
            if script.pdk_version.as_deref() != Some(spec.legal_pdk_version.as_str()) {
                violations.push(Violation::new(
                    CheckFamily::PlatformConsistency,
                    format!("illegal PDK version: {}", shown(&script.pdk_version, MISSING)),
                ));
            }
            if script.release_date.as_deref() != Some(spec.release_date.as_str()) {
                violations.push(Violation::new(
                    CheckFamily::PlatformConsistency,
                    format!(
                        "environment release date mismatch: {}",
                        shown(&script.release_date, MISSING)
                    ),
                ));
            }
        }
        None => violations.push(Violation::new(
            CheckFamily::PlatformConsistency,
            "environment script unreadable (setup.tcl)",
        )),
    }

    violations
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
