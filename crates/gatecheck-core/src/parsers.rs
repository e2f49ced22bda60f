//! Fail-soft artifact parsers.
//!
//! Each parser converts one bundle artifact into a typed fact record. All of
//! them share the same contract:
//!
//! - A missing file yields the absence value (`None` or an empty `Vec`),
//!   never an error.
//! - A present-but-unreadable file is logged once with path context and then
//!   treated exactly like a missing file.
//! - A readable file whose expected patterns are absent still yields a fact
//!   record; each field is independently `None` when its pattern did not
//!   match. Field absence is distinct from an empty string.
//!
//! Rule evaluators never touch the filesystem; they consume these records.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::patterns::{
    capture_all, capture_first, CREATION_DATE, GENERATED_DATE, LIB_VERSION, MODULE_DECL,
    PDK_VERSION, RELEASE_DATE,
};

// ---------------------------------------------------------------------------
// Fact records
// ---------------------------------------------------------------------------

/// Facts extracted from a generated-netlist header.
///
/// Produced only when the file exists and is readable; a missing netlist
/// yields no `HeaderFact` at all rather than an empty one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFact {
    /// Generation date from the header comment, if declared.
    pub date: Option<String>,
    /// Module identifier from the first `module` declaration, if present.
    pub module_name: Option<String>,
    /// Size of the file in bytes.
    pub byte_size: u64,
}

/// Facts extracted from a Tcl environment or verification script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptFacts {
    /// Declared PDK version (`set PDK_VER <token>`), if present.
    pub pdk_version: Option<String>,
    /// Library version references in document order, duplicates preserved.
    pub library_versions: Vec<String>,
    /// Release-labeled date, if present.
    pub release_date: Option<String>,
    /// Creation-labeled date, if present.
    pub creation_date: Option<String>,
}

/// Structured facts from a bundle's status document.
///
/// Every field is optional: a document that parses but omits a field yields
/// `None` for that field, which callers must treat differently from an
/// unreadable document (no record at all).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusRecord {
    /// Module name the bundle claims internally.
    pub module_name: Option<String>,
    /// Declared process identifier.
    pub process: Option<String>,
    /// Owning engineer.
    pub owner: Option<String>,
    /// Declared signoff stage.
    pub status: Option<String>,
    /// Last-modified date string.
    pub last_modified: Option<String>,
}

/// One row of the bundle's tool registry.
///
/// Rows are kept in file order and duplicated tool names are preserved; the
/// registry is a log of assignments, not a set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRecord {
    /// Declared tool name.
    pub tool_name: Option<String>,
    /// Compute server the assignment runs on.
    pub server_id: Option<String>,
    /// Allocated memory in GB; non-numeric input parses as 0.
    pub memory_gb: u32,
    /// Scheduling priority label.
    pub priority: Option<String>,
    /// Date the assignment was reported.
    pub report_date: Option<String>,
}

/// Raw registry row as it appears in the CSV, before memory normalization.
#[derive(Debug, Deserialize)]
struct RawToolRow {
    #[serde(rename = "Tool")]
    tool: Option<String>,
    #[serde(rename = "Server")]
    server: Option<String>,
    #[serde(rename = "Memory_GB")]
    memory_gb: Option<String>,
    #[serde(rename = "Priority")]
    priority: Option<String>,
    #[serde(rename = "Report_Date")]
    report_date: Option<String>,
}

impl From<RawToolRow> for ToolRecord {
    fn from(raw: RawToolRow) -> Self {
        Self {
            tool_name: raw.tool,
            server_id: raw.server,
            memory_gb: parse_memory(raw.memory_gb.as_deref()),
            priority: raw.priority,
            report_date: raw.report_date,
        }
    }
}

/// Parses a memory field as a non-negative integer, defaulting to 0 on
/// anything non-numeric (including negative values).
fn parse_memory(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok()).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// parse_header
// ---------------------------------------------------------------------------

/// Extracts the generation date and declared module name from a generated
/// netlist file, along with its byte size.
#[must_use]
pub fn parse_header(path: &Path) -> Option<HeaderFact> {
    if !path.is_file() {
        return None;
    }
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read netlist; treating as absent");
            return None;
        }
    };
    Some(HeaderFact {
        date: capture_first(&GENERATED_DATE, &content),
        module_name: capture_first(&MODULE_DECL, &content),
        byte_size: content.len() as u64,
    })
}

// ---------------------------------------------------------------------------
// parse_script_settings
// ---------------------------------------------------------------------------

/// Extracts the declared PDK version, library version references, and the
/// two labeled dates from free-form script text.
///
/// Each field defaults independently: a script that declares a PDK version
/// but no dates yields a record with only `pdk_version` set.
#[must_use]
pub fn parse_script_settings(path: &Path) -> Option<ScriptFacts> {
    if !path.is_file() {
        return None;
    }
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read script; treating as absent");
            return None;
        }
    };
    Some(ScriptFacts {
        pdk_version: capture_first(&PDK_VERSION, &content),
        library_versions: capture_all(&LIB_VERSION, &content),
        release_date: capture_first(&RELEASE_DATE, &content),
        creation_date: capture_first(&CREATION_DATE, &content),
    })
}

// ---------------------------------------------------------------------------
// read_status
// ---------------------------------------------------------------------------

/// Deserializes the bundle's status document.
///
/// Returns `None` on read or parse failure; callers must treat `None`
/// (unreadable) distinctly from a record whose individual fields are absent.
#[must_use]
pub fn read_status(path: &Path) -> Option<StatusRecord> {
    if !path.is_file() {
        return None;
    }
    let raw = match std::fs::read_to_string(path) {
        Ok(r) => r,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read status document");
            return None;
        }
    };
    match serde_json::from_str::<StatusRecord>(&raw) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse status document");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// read_tool_registry
// ---------------------------------------------------------------------------

/// Reads the delimited tool registry into an ordered sequence of rows.
///
/// Returns an empty sequence (never `None`) on any read failure so that
/// downstream set-membership checks behave correctly on empty input: a
/// missing registry reports every required tool as missing.
#[must_use]
pub fn read_tool_registry(path: &Path) -> Vec<ToolRecord> {
    if !path.is_file() {
        return Vec::new();
    }
    let mut reader = match csv::Reader::from_path(path) {
        Ok(r) => r,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to open tool registry");
            return Vec::new();
        }
    };
    let mut rows = Vec::new();
    for record in reader.deserialize::<RawToolRow>() {
        match record {
            Ok(raw) => rows.push(ToolRecord::from(raw)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable tool registry row; discarding registry");
                return Vec::new();
            }
        }
    }
    rows
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
