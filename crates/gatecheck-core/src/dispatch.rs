//! Parallel audit dispatch.
//!
//! Each discovered bundle becomes one independent task on a fixed-size
//! worker pool. Tasks share nothing mutable beyond the notification log
//! inside the [`ActionContext`]; the golden spec is referenced immutably.
//! Completion order is unspecified -- results are re-sorted by module id
//! before they are returned, so reporting is deterministic regardless of
//! scheduling.
//!
//! Every task runs inside a panic boundary: an unexpected failure in one
//! bundle's audit is converted into a SYSTEM_ERR result for that bundle
//! instead of tearing down the pool or aborting sibling tasks.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{error, info};

use crate::actions::ActionContext;
use crate::auditor::{AuditResult, BundleAuditor, BundleIdentity};
use crate::spec::SpecModel;
use crate::CoreError;

// ---------------------------------------------------------------------------
// DispatchOptions
// ---------------------------------------------------------------------------

/// Options governing audit dispatch.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Number of parallel audit workers.
    pub jobs: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
        }
    }
}

/// Host parallelism, used when no explicit job count is configured.
#[must_use]
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}

// ---------------------------------------------------------------------------
// run_audit
// ---------------------------------------------------------------------------

/// Audits every bundle directory on a fixed-size worker pool and returns
/// one result per bundle, sorted ascending by module id.
///
/// # Errors
///
/// Returns [`CoreError::Dispatch`] only if the worker pool itself cannot be
/// built. Individual bundle failures never abort the batch.
pub fn run_audit(
    spec: &SpecModel,
    bundle_dirs: &[PathBuf],
    actions: &ActionContext,
    opts: &DispatchOptions,
) -> Result<Vec<AuditResult>, CoreError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs.max(1))
        .build()
        .map_err(|e| CoreError::Dispatch(e.to_string()))?;

    info!(
        bundles = bundle_dirs.len(),
        jobs = opts.jobs.max(1),
        "audit dispatch starting"
    );

    let mut results: Vec<AuditResult> = pool.install(|| {
        bundle_dirs
            .par_iter()
            .map(|dir| audit_task(spec, dir, actions))
            .collect()
    });

    results.sort_by(|a, b| a.module_id.cmp(&b.module_id));

    info!(
        total = results.len(),
        passed = results.iter().filter(|r| r.verdict.is_pass()).count(),
        failed = results.iter().filter(|r| r.verdict.is_fail()).count(),
        "audit dispatch complete"
    );
    Ok(results)
}

/// Runs one bundle audit inside a panic boundary, then its outcome action.
fn audit_task(spec: &SpecModel, dir: &Path, actions: &ActionContext) -> AuditResult {
    let result = match catch_unwind(AssertUnwindSafe(|| BundleAuditor::new(spec).audit(dir))) {
        Ok(result) => result,
        Err(payload) => {
            let module = BundleIdentity::from_dir(dir).name;
            let message = panic_message(payload.as_ref());
            error!(bundle = %module, error = %message, "audit task failed unexpectedly");
            AuditResult::system_error(module, format!("unexpected audit failure: {message}"))
        }
    };

    // Outcome actions are advisory; a failure there must not poison the
    // pool or alter the computed verdict.
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| actions.dispatch(&result))) {
        error!(
            bundle = %result.module_id,
            error = %panic_message(payload.as_ref()),
            "outcome action failed unexpectedly"
        );
    }
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::NotificationLog;
    use crate::Verdict;
    use std::fs;

    fn spec() -> SpecModel {
        SpecModel {
            process: "N7".into(),
            release_date: "2025-05-13".into(),
            signoff_target: "layout_done".into(),
            legal_pdk_version: "v3.0".into(),
            required_tools: vec![
                "VCS".into(),
                "PrimeTime".into(),
                "Formality".into(),
                "RedHawk".into(),
            ],
        }
    }

    fn write_compliant_bundle(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for variant in ["golden", "revised"] {
            fs::write(
                dir.join(format!("{name}_{variant}.v")),
                format!("// Generated on: 2025-05-13\nmodule {name} ();\nendmodule\n"),
            )
            .unwrap();
        }
        fs::write(
            dir.join("formal_setup.tcl"),
            "# Creation Date: 2025-05-13\n\
             read_db /tools/libs/N7/v3.0/std_cell.db\n\
             read_db /tools/libs/N7/v3.0/std_cell.db\n",
        )
        .unwrap();
        fs::write(
            dir.join("project_status.json"),
            format!(
                r#"{{"module_name": "{name}", "process": "N7", "owner": "engineer_1",
                     "status": "layout_done", "last_modified": "2025-05-13"}}"#
            ),
        )
        .unwrap();
        fs::write(
            dir.join("setup.tcl"),
            "# Environment Script (Release: 2025-05-13)\nset PDK_VER v3.0\n",
        )
        .unwrap();
        fs::write(
            dir.join("tool_info.csv"),
            "Tool,Server,Memory_GB,Priority,Report_Date\n\
             VCS,node_001,128,Low,2025-05-13\n\
             PrimeTime,node_002,256,High,2025-05-13\n\
             Formality,node_003,64,Medium,2025-05-13\n\
             RedHawk,node_004,512,High,2025-05-13\n",
        )
        .unwrap();
        dir
    }

    fn actions(root: &Path) -> ActionContext {
        ActionContext::new(
            NotificationLog::open(&root.join("mail_sent.log")).unwrap(),
            root.join("bin"),
        )
    }

    #[test]
    fn results_are_sorted_by_module_id() {
        let tmp = tempfile::tempdir().unwrap();
        let spec = spec();
        // Create in non-sorted order; feed unsorted paths to dispatch.
        let dirs = vec![
            write_compliant_bundle(tmp.path(), "mod_030"),
            write_compliant_bundle(tmp.path(), "mod_010"),
            write_compliant_bundle(tmp.path(), "mod_020"),
        ];
        let ctx = actions(tmp.path());

        let results = run_audit(&spec, &dirs, &ctx, &DispatchOptions { jobs: 2 }).unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.module_id.as_str()).collect();
        assert_eq!(ids, vec!["mod_010", "mod_020", "mod_030"]);
    }

    #[test]
    fn one_failing_bundle_does_not_abort_siblings() {
        let tmp = tempfile::tempdir().unwrap();
        let spec = spec();
        let good = write_compliant_bundle(tmp.path(), "mod_001");
        let bad = tmp.path().join("mod_002");
        fs::create_dir_all(&bad).unwrap();
        let ctx = actions(tmp.path());

        let results = run_audit(
            &spec,
            &[good, bad],
            &ctx,
            &DispatchOptions { jobs: 4 },
        )
        .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].verdict, Verdict::Pass);
        assert_eq!(results[1].verdict, Verdict::Fail);
    }

    #[test]
    fn failing_bundles_append_notifications_concurrently() {
        let tmp = tempfile::tempdir().unwrap();
        let spec = spec();
        let mut dirs = Vec::new();
        for i in 0..8 {
            let dir = tmp.path().join(format!("mod_{i:03}"));
            fs::create_dir_all(&dir).unwrap();
            dirs.push(dir);
        }
        let ctx = actions(tmp.path());

        let results = run_audit(&spec, &dirs, &ctx, &DispatchOptions { jobs: 4 }).unwrap();
        assert!(results.iter().all(|r| r.verdict == Verdict::Fail));

        // Every notification document must appear exactly once, intact.
        let log = fs::read_to_string(tmp.path().join("mail_sent.log")).unwrap();
        for i in 0..8 {
            let marker = format!("BLOCK_ID: mod_{i:03}");
            assert_eq!(
                log.matches(&marker).count(),
                1,
                "expected one intact notification for mod_{i:03}"
            );
        }
    }

    #[test]
    fn single_job_pool_processes_full_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let spec = spec();
        let dirs = vec![
            write_compliant_bundle(tmp.path(), "mod_001"),
            write_compliant_bundle(tmp.path(), "mod_002"),
        ];
        let ctx = actions(tmp.path());

        let results = run_audit(&spec, &dirs, &ctx, &DispatchOptions { jobs: 1 }).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.verdict == Verdict::Pass));
    }

    #[test]
    fn repeated_runs_yield_identical_results() {
        let tmp = tempfile::tempdir().unwrap();
        let spec = spec();
        let mut dirs = vec![write_compliant_bundle(tmp.path(), "mod_001")];
        let degraded = tmp.path().join("mod_002");
        fs::create_dir_all(&degraded).unwrap();
        fs::write(
            degraded.join("tool_info.csv"),
            "Tool,Server,Memory_GB,Priority,Report_Date\nPrimeTime,node_001,8,High,2025-05-13\n",
        )
        .unwrap();
        dirs.push(degraded);
        let ctx = actions(tmp.path());

        let opts = DispatchOptions { jobs: 4 };
        let first = run_audit(&spec, &dirs, &ctx, &opts).unwrap();
        let second = run_audit(&spec, &dirs, &ctx, &opts).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn default_jobs_is_at_least_one() {
        assert!(default_jobs() >= 1);
    }
}
