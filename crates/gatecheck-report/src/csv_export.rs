//! Tabular violation export.
//!
//! Writes the per-run violation list as CSV: failed bundles only, the
//! status column omitted (every exported row is a failure by definition),
//! in the caller-provided order (ascending module id after dispatch).
//! SYSTEM_ERR bundles carry no violations and are not exported here; they
//! remain visible in the HTML and JSON outputs.

use std::io::Write;
use std::path::Path;

use gatecheck_core::auditor::AuditResult;

/// Column headers of the violation export.
const HEADERS: [&str; 4] = ["Module_ID", "Engineer", "Total_Issues", "Issue_Summary"];

/// Writes the violation CSV for `results` to `writer`.
///
/// # Errors
///
/// Returns any underlying CSV or I/O error.
pub fn write_violation_csv<W: Write>(writer: W, results: &[AuditResult]) -> csv::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    csv_writer.write_record(HEADERS)?;
    for result in results.iter().filter(|r| r.verdict.is_fail()) {
        let issue_count = result.violation_count.to_string();
        let issue_summary = result.summary_line();
        csv_writer.write_record([
            result.module_id.as_str(),
            result.owner.as_str(),
            issue_count.as_str(),
            issue_summary.as_str(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Renders the violation CSV as a string.
///
/// # Errors
///
/// Returns any underlying CSV error.
pub fn render_violation_csv(results: &[AuditResult]) -> csv::Result<String> {
    let mut buffer = Vec::new();
    write_violation_csv(&mut buffer, results)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Writes the violation CSV to `path`.
///
/// # Errors
///
/// Returns any underlying CSV or I/O error.
pub fn export_violation_csv(path: &Path, results: &[AuditResult]) -> csv::Result<()> {
    let file = std::fs::File::create(path)?;
    write_violation_csv(file, results)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use gatecheck_core::{CheckFamily, Violation};

    fn fail(id: &str, owner: &str, messages: &[&str]) -> AuditResult {
        AuditResult::from_violations(
            id.to_string(),
            owner.to_string(),
            messages
                .iter()
                .map(|m| Violation::new(CheckFamily::Environment, *m))
                .collect(),
        )
    }

    #[test]
    fn export_contains_failed_bundles_only() {
        let results = vec![
            AuditResult::from_violations("mod_001".into(), "engineer_1".into(), Vec::new()),
            fail("mod_002", "engineer_2", &["process mismatch: found N12"]),
            AuditResult::system_error("mod_003".into(), "worker panicked".into()),
        ];

        let csv = render_violation_csv(&results).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Module_ID,Engineer,Total_Issues,Issue_Summary");
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("mod_002,engineer_2,1,"));
    }

    #[test]
    fn status_column_is_omitted() {
        let results = vec![fail("mod_001", "engineer_1", &["x"])];
        let csv = render_violation_csv(&results).unwrap();
        assert!(!csv.contains("FAIL"));
        assert!(!csv.contains("Status"));
    }

    #[test]
    fn violations_join_with_pipe_separator() {
        let results = vec![fail(
            "mod_001",
            "engineer_1",
            &["first violation", "second violation"],
        )];
        let csv = render_violation_csv(&results).unwrap();
        assert!(csv.contains("first violation | second violation"));
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let results = vec![fail(
            "mod_001",
            "engineer_1",
            &["required bundle files missing: [\"setup.tcl\", \"tool_info.csv\"]"],
        )];
        let csv = render_violation_csv(&results).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record.len(), 4);
        assert!(record[3].contains("setup.tcl"));
    }

    #[test]
    fn empty_result_set_yields_header_only() {
        let csv = render_violation_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn export_to_path_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("violation_list.csv");
        let results = vec![fail("mod_001", "engineer_1", &["x"])];

        export_violation_csv(&path, &results).unwrap();
        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, render_violation_csv(&results).unwrap());
    }

    #[test]
    fn export_is_byte_identical_across_runs() {
        let results = vec![
            fail("mod_001", "engineer_1", &["a", "b"]),
            fail("mod_002", "engineer_2", &["c"]),
        ];
        assert_eq!(
            render_violation_csv(&results).unwrap(),
            render_violation_csv(&results).unwrap()
        );
    }
}
