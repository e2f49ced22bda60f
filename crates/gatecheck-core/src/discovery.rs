//! Bundle directory discovery.
//!
//! Candidate bundles are the immediate subdirectories of the input root
//! whose names follow the `mod_` prefix convention. Discovery is flat (no
//! recursion) and the result is sorted for deterministic dispatch order.

use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;

use crate::CoreError;

/// Directory-name prefix that marks a bundle.
pub const BUNDLE_PREFIX: &str = "mod_";

/// Collects candidate bundle directories under `root`, sorted by path.
///
/// # Errors
///
/// Returns [`CoreError::Config`] if `root` does not exist or is not a
/// directory -- a missing input root is configuration-fatal, not an empty
/// batch.
pub fn discover_bundles(root: &Path) -> Result<Vec<PathBuf>, CoreError> {
    if !root.is_dir() {
        return Err(CoreError::Config(format!(
            "input root '{}' does not exist",
            root.display()
        )));
    }

    let mut bundles = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| CoreError::Io(e.into()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with(BUNDLE_PREFIX) {
            bundles.push(entry.into_path());
        }
    }
    bundles.sort();

    info!(
        root = %root.display(),
        count = bundles.len(),
        "bundle discovery complete"
    );
    Ok(bundles)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn discovers_only_prefixed_directories() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("mod_002")).unwrap();
        fs::create_dir(tmp.path().join("mod_001")).unwrap();
        fs::create_dir(tmp.path().join("scratch")).unwrap();
        fs::write(tmp.path().join("mod_999"), "a file, not a bundle").unwrap();

        let bundles = discover_bundles(tmp.path()).unwrap();
        let names: Vec<_> = bundles
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["mod_001", "mod_002"]);
    }

    #[test]
    fn discovery_is_flat() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("mod_001/mod_nested")).unwrap();

        let bundles = discover_bundles(tmp.path()).unwrap();
        assert_eq!(bundles.len(), 1);
    }

    #[test]
    fn empty_root_yields_empty_batch() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(discover_bundles(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_root_is_config_error() {
        let err = discover_bundles(Path::new("/nonexistent/input_data")).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
