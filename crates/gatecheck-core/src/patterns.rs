//! Textual extraction patterns for bundle artifacts.
//!
//! Every artifact convention Gatecheck relies on -- labeled dates, version
//! assignments, module declarations, library path references -- is matched by
//! exactly one compiled pattern defined here, so the grammar of each artifact
//! kind is a single, independently testable unit rather than ad hoc inline
//! matching.

use once_cell::sync::Lazy;
use regex::Regex;

/// Generation-date comment in a netlist header: `// Generated on: 2025-05-13`.
pub static GENERATED_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Generated on: (\d{4}-\d{2}-\d{2})").expect("valid pattern"));

/// Module declaration in a netlist: `module mod_001 (...)`.
pub static MODULE_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"module\s+(\w+)").expect("valid pattern"));

/// PDK version assignment in an environment script: `set PDK_VER v3.0`.
pub static PDK_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"set PDK_VER\s+(\S+)").expect("valid pattern"));

/// Standard-cell library version reference: `/libs/N7/v3.0/`.
pub static LIB_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/libs/N7/(v\d+\.\d+)/").expect("valid pattern"));

/// Release-date label in an environment script: `Release: 2025-05-13`.
pub static RELEASE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Release:\s+(\d{4}-\d{2}-\d{2})").expect("valid pattern"));

/// Creation-date label in a verification script: `Creation Date: 2025-05-13`.
pub static CREATION_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Creation Date:\s+(\d{4}-\d{2}-\d{2})").expect("valid pattern"));

/// Returns the first capture of `pattern` in `text`, if any.
#[must_use]
pub fn capture_first(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Returns every capture of `pattern` in `text`, in document order.
///
/// Duplicates are preserved; callers that need distinct values build their
/// own set.
#[must_use]
pub fn capture_all(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
