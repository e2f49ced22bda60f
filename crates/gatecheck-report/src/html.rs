//! HTML dashboard renderer.
//!
//! Renders the run's summary document: headline counts, pass/fail rates,
//! and a per-bundle table with status coloring. The renderer is a pure
//! function over the results plus an injected generation timestamp, so the
//! output is fully determined by its inputs.

use gatecheck_core::auditor::AuditResult;
use gatecheck_core::Verdict;

use crate::RunSummary;

/// Escapes the handful of characters that are unsafe in HTML text nodes.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn status_color(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Pass => "#28a745",
        Verdict::Fail => "#dc3545",
        Verdict::SystemError => "#6c757d",
    }
}

/// Renders the full dashboard document.
///
/// `generated_at` is the footer timestamp; callers pass the wall-clock time
/// of the run (tests pass a fixed value).
#[must_use]
pub fn render_dashboard(
    results: &[AuditResult],
    summary: &RunSummary,
    generated_at: &str,
) -> String {
    let mut rows = String::new();
    for (i, result) in results.iter().enumerate() {
        rows.push_str(&format!(
            "<tr>\
             <td>{index}</td>\
             <td>{module}</td>\
             <td>{owner}</td>\
             <td style=\"background-color: {color}; color: white; font-weight: bold; text-align: center;\">{status}</td>\
             <td>{issues}</td>\
             <td>{summary}</td>\
             </tr>\n",
            index = i + 1,
            module = escape(&result.module_id),
            owner = escape(&result.owner),
            color = status_color(result.verdict),
            status = result.verdict,
            issues = result.violation_count,
            summary = escape(&result.summary_line()),
        ));
    }

    format!(
        r#"<html><head><meta charset="UTF-8"><style>
    body {{ font-family: 'Helvetica Neue', sans-serif; margin: 50px; background: #f0f2f5; }}
    .container {{ background: white; padding: 40px; border-radius: 15px; box-shadow: 0 10px 20px rgba(0,0,0,0.1); }}
    h1 {{ color: #1a73e8; border-bottom: 3px solid #1a73e8; padding-bottom: 15px; }}
    .dashboard-header {{ display: flex; gap: 20px; margin-bottom: 30px; }}
    .count-zone {{ display: flex; flex-direction: column; gap: 10px; flex: 1; }}
    .count-item {{ background: #fff; border: 2px solid #e8f0fe; padding: 15px; border-radius: 10px; text-align: center; }}
    .rate-zone {{ display: flex; flex-direction: row; gap: 15px; flex: 2; align-items: stretch; }}
    .rate-card {{ background: #e8f0fe; padding: 20px; border-radius: 10px; flex: 1; text-align: center; display: flex; flex-direction: column; justify-content: center; }}
    table {{ width: 100%; border-collapse: collapse; margin-top: 20px; }}
    th {{ background: #1a73e8; color: white; padding: 15px; text-align: center; }}
    td {{ padding: 12px; border: 1px solid #ddd; }}
    table td:first-child {{ font-weight: bold; background: #f8f9fa; text-align: center; color: #1a73e8; }}
</style></head><body>
<div class="container">
    <h1>Pre-Sign-off Audit System</h1>
    <div class="dashboard-header">
        <div class="count-zone">
            <div class="count-item"><strong>Total modules:</strong> {total}</div>
            <div class="count-item" style="color:green"><strong>Passed:</strong> {passed}</div>
            <div class="count-item" style="color:red"><strong>Violating:</strong> {failed}</div>
        </div>
        <div class="rate-zone">
            <div class="rate-card"><h3>Pass rate</h3><p style="font-size: 24px; font-weight: bold;">{pass_rate:.1}%</p></div>
            <div class="rate-card"><h3>Violation rate</h3><p style="font-size: 24px; font-weight: bold; color:red;">{fail_rate:.1}%</p></div>
        </div>
    </div>
    <table>
        <thead><tr><th>#</th><th>Module_ID</th><th>Engineer</th><th>Status</th><th>Total_Issues</th><th>Issue_Summary</th></tr></thead>
        <tbody>
{rows}        </tbody>
    </table>
    <p style="color: #888; margin-top: 30px;">Generated by Gatecheck AutoAudit System at: {generated_at}</p>
</div>
</body></html>
"#,
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        pass_rate = summary.pass_rate(),
        fail_rate = summary.fail_rate(),
        rows = rows,
        generated_at = escape(generated_at),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
