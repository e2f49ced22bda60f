//! The `audit` CLI subcommand -- audits every bundle under the input root.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use tracing::{error, info};

use gatecheck_core::actions::{ActionContext, NotificationLog};
use gatecheck_core::discovery::discover_bundles;
use gatecheck_core::dispatch::{default_jobs, run_audit, DispatchOptions};
use gatecheck_core::spec::load_spec;
use gatecheck_report::{
    export_violation_csv, format_report, render_dashboard, ReportOptions, RunSummary,
};

use crate::ExitCode;

// ---------------------------------------------------------------------------
// AuditArgs
// ---------------------------------------------------------------------------

/// Audit every bundle under the input root against the golden spec.
#[derive(Debug, clap::Args)]
pub struct AuditArgs {
    /// Path to the golden spec document.
    #[arg(long, default_value = "config/golden_spec.yaml")]
    pub spec: PathBuf,

    /// Input root scanned for `mod_`-prefixed bundle directories.
    #[arg(long, default_value = "input_data")]
    pub input: PathBuf,

    /// Number of parallel audit workers (default: host parallelism).
    #[arg(long, short)]
    pub jobs: Option<usize>,

    /// Directory for reports and run logs.
    #[arg(long, short, default_value = "output")]
    pub output: PathBuf,

    /// Directory containing the external verification tool.
    #[arg(long, default_value = "bin")]
    pub tool_root: PathBuf,

    /// Include a generation timestamp in the JSON report.
    #[arg(long)]
    pub timestamp: bool,

    /// Enable verbose output.
    #[arg(long, short)]
    pub verbose: bool,

    /// Suppress all non-essential output.
    #[arg(long, short)]
    pub quiet: bool,
}

// ---------------------------------------------------------------------------
// execute
// ---------------------------------------------------------------------------

/// Executes the `audit` subcommand.
///
/// Returns an [`ExitCode`] indicating the outcome of the run. Configuration
/// failures (unloadable spec, missing input root) abort before any bundle
/// is dispatched and map to [`ExitCode::ConfigError`]; bundle-level
/// failures never abort the batch.
pub fn execute(args: AuditArgs) -> Result<ExitCode, anyhow::Error> {
    let started = Instant::now();

    // 1. Prepare the output directory and initialize tracing, teed to the
    //    run trace log. The tracing error is ignored if the subscriber is
    //    already set (e.g. in tests).
    std::fs::create_dir_all(&args.output).with_context(|| {
        format!(
            "failed to create output directory '{}'",
            args.output.display()
        )
    })?;
    let trace_log = args.output.join("audit_trace.log");
    let _ = gatecheck_core::init_tracing(args.verbose, args.quiet, Some(&trace_log));

    // 2. Load the golden spec. Configuration-fatal: abort with no partial
    //    output.
    let spec = match load_spec(&args.spec) {
        Ok(spec) => spec,
        Err(e) => {
            error!(error = %e, "golden spec load failed; aborting run");
            return Ok(ExitCode::ConfigError);
        }
    };

    // 3. Discover bundles. A missing input root is configuration-fatal.
    let bundles = match discover_bundles(&args.input) {
        Ok(bundles) => bundles,
        Err(e) => {
            error!(error = %e, "bundle discovery failed; aborting run");
            return Ok(ExitCode::ConfigError);
        }
    };

    // 4. Build the shared action context (notification log + tool root).
    let notifications = NotificationLog::open(&args.output.join("mail_sent.log"))
        .context("failed to open notification log")?;
    let action_ctx = ActionContext::new(notifications, args.tool_root.clone());

    // 5. Dispatch the batch across the worker pool.
    let opts = DispatchOptions {
        jobs: args.jobs.unwrap_or_else(default_jobs),
    };
    let results =
        run_audit(&spec, &bundles, &action_ctx, &opts).context("audit dispatch failed")?;

    // 6. Write the reports.
    let summary = RunSummary::from_results(&results);

    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let dashboard_path = args.output.join("final_report.html");
    std::fs::write(
        &dashboard_path,
        render_dashboard(&results, &summary, &generated_at),
    )
    .with_context(|| format!("failed to write '{}'", dashboard_path.display()))?;

    let csv_path = args.output.join("violation_list.csv");
    export_violation_csv(&csv_path, &results)
        .with_context(|| format!("failed to write '{}'", csv_path.display()))?;

    let report_options = ReportOptions {
        generated_at: args.timestamp.then(|| {
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        }),
    };
    let json_path = args.output.join("audit_report.json");
    std::fs::write(&json_path, format_report(&spec, &results, &report_options))
        .with_context(|| format!("failed to write '{}'", json_path.display()))?;

    info!(
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        elapsed_secs = started.elapsed().as_secs_f64(),
        dashboard = %dashboard_path.display(),
        violations = %csv_path.display(),
        "audit run complete"
    );

    // 7. Map the batch outcome to the process exit code.
    if summary.failed == 0 {
        Ok(ExitCode::Pass)
    } else {
        Ok(ExitCode::AuditFail)
    }
}
