//! Outcome actions triggered by a bundle's audit verdict.
//!
//! A FAIL verdict composes an owner notification and appends it to the
//! shared notification log; a PASS verdict launches the external
//! verification tool with a bounded timeout. Both are downstream side
//! effects: nothing here can change an already-computed verdict, and every
//! failure in this module is logged rather than propagated.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::auditor::AuditResult;
use crate::{CoreError, Verdict};

/// Name of the external verification executable, resolved under the
/// configured tool root.
pub const VERIFICATION_TOOL: &str = "formality";

/// Upper bound on one verification tool invocation.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// NotificationLog
// ---------------------------------------------------------------------------

/// Append-only notification log shared across audit workers.
///
/// Each notification is appended with a single `write_all`, and the inner
/// mutex serializes concurrent appends, so entries from parallel workers
/// never interleave.
#[derive(Debug)]
pub struct NotificationLog {
    file: Mutex<File>,
}

impl NotificationLog {
    /// Opens (creating if needed) the notification log at `path` in append
    /// mode.
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one notification document to the log.
    pub fn append(&self, text: &str) -> std::io::Result<()> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(text.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Notification composition
// ---------------------------------------------------------------------------

/// Renders the notification document for a failed bundle.
///
/// Kept pure (timestamp injected) so the format is testable.
#[must_use]
pub fn compose_notification(result: &AuditResult, timestamp: &str) -> String {
    let mut text = format!(
        "\n\
         ==================================================\n\
         NOTIFICATION: PRE-SIGN-OFF AUDIT FAILED\n\
         ==================================================\n\
         TIME: {timestamp}\n\
         RECIPIENT: {}@design.com\n\
         CC: manager@design.com\n\
         BLOCK_ID: {}\n\
         VIOLATIONS DETECTED:\n",
        result.owner, result.module_id
    );
    for (i, violation) in result.violations.iter().enumerate() {
        text.push_str(&format!("\n  [{}] {}", i + 1, violation.message));
    }
    text.push_str("\n\nSTATUS: BLOCK REJECTED FROM TAPE-OUT FLOW.\n");
    text.push_str("==================================================\n\n\n");
    text
}

// ---------------------------------------------------------------------------
// ActionContext
// ---------------------------------------------------------------------------

/// The handles an audit task needs to run outcome actions.
///
/// Constructed once per run and shared immutably across workers; the
/// notification log is the only synchronization point.
#[derive(Debug)]
pub struct ActionContext {
    notifications: NotificationLog,
    tool_root: PathBuf,
    tool_timeout: Duration,
}

impl ActionContext {
    /// Creates an action context with the default tool timeout.
    #[must_use]
    pub fn new(notifications: NotificationLog, tool_root: PathBuf) -> Self {
        Self {
            notifications,
            tool_root,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Overrides the verification tool timeout.
    #[must_use]
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Runs the outcome action for one audit result.
    pub fn dispatch(&self, result: &AuditResult) {
        match result.verdict {
            Verdict::Fail => self.notify_owner(result),
            Verdict::Pass => self.trigger_verification_tool(&result.module_id),
            // The dispatch layer already logged the task failure.
            Verdict::SystemError => {}
        }
    }

    fn notify_owner(&self, result: &AuditResult) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let text = compose_notification(result, &timestamp);
        match self.notifications.append(&text) {
            Ok(()) => warn!(
                bundle = %result.module_id,
                owner = %result.owner,
                violations = result.violation_count,
                "audit failed; notification dispatched to owner"
            ),
            Err(e) => error!(
                bundle = %result.module_id,
                error = %e,
                "failed to append owner notification"
            ),
        }
    }

    fn trigger_verification_tool(&self, module_id: &str) {
        let exe = self.tool_root.join(VERIFICATION_TOOL);
        if !exe.is_file() {
            error!(
                bundle = %module_id,
                tool = %exe.display(),
                "verification tool executable not found"
            );
            return;
        }

        let mut child = match Command::new(&exe)
            .args(["-block", module_id, "-mode", "verify"])
            .env("AUDIT_PASS", "1")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                error!(bundle = %module_id, error = %e, "failed to launch verification tool");
                return;
            }
        };

        let deadline = Instant::now() + self.tool_timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let mut output = String::new();
                    if let Some(mut stdout) = child.stdout.take() {
                        let _ = stdout.read_to_string(&mut output);
                    }
                    if status.success() {
                        info!(
                            bundle = %module_id,
                            output = %output.trim(),
                            "audit passed; verification tool completed"
                        );
                    } else {
                        error!(
                            bundle = %module_id,
                            code = ?status.code(),
                            "verification tool returned a failure code"
                        );
                    }
                    return;
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        error!(
                            bundle = %module_id,
                            timeout_secs = self.tool_timeout.as_secs_f64(),
                            "verification tool timed out"
                        );
                        return;
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    error!(bundle = %module_id, error = %e, "failed to poll verification tool");
                    let _ = child.kill();
                    let _ = child.wait();
                    return;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CheckFamily, Violation};

    fn failed_result() -> AuditResult {
        AuditResult::from_violations(
            "mod_013".to_string(),
            "engineer_4".to_string(),
            vec![
                Violation::new(CheckFamily::Environment, "process mismatch: found N12"),
                Violation::new(
                    CheckFamily::PlatformConsistency,
                    "illegal PDK version: v2.0",
                ),
            ],
        )
    }

    #[test]
    fn notification_document_format() {
        let text = compose_notification(&failed_result(), "2025-05-13 09:00:00");
        assert!(text.contains("NOTIFICATION: PRE-SIGN-OFF AUDIT FAILED"));
        assert!(text.contains("TIME: 2025-05-13 09:00:00"));
        assert!(text.contains("RECIPIENT: engineer_4@design.com"));
        assert!(text.contains("CC: manager@design.com"));
        assert!(text.contains("BLOCK_ID: mod_013"));
        assert!(text.contains("  [1] process mismatch: found N12"));
        assert!(text.contains("  [2] illegal PDK version: v2.0"));
        assert!(text.contains("STATUS: BLOCK REJECTED FROM TAPE-OUT FLOW."));
    }

    #[test]
    fn notification_log_appends() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("mail_sent.log");
        let log = NotificationLog::open(&path).unwrap();

        log.append("first\n").unwrap();
        log.append("second\n").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn notification_log_creates_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("output/mail_sent.log");
        let log = NotificationLog::open(&path).unwrap();
        log.append("entry\n").unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn fail_dispatch_appends_notification() {
        let tmp = tempfile::tempdir().unwrap();
        let log_path = tmp.path().join("mail_sent.log");
        let ctx = ActionContext::new(
            NotificationLog::open(&log_path).unwrap(),
            tmp.path().join("bin"),
        );

        ctx.dispatch(&failed_result());

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("BLOCK_ID: mod_013"));
    }

    #[test]
    fn pass_dispatch_with_missing_tool_does_not_write_notification() {
        let tmp = tempfile::tempdir().unwrap();
        let log_path = tmp.path().join("mail_sent.log");
        let ctx = ActionContext::new(
            NotificationLog::open(&log_path).unwrap(),
            tmp.path().join("bin"),
        );
        let result = AuditResult::from_violations(
            "mod_014".to_string(),
            "engineer_1".to_string(),
            Vec::new(),
        );

        // Tool executable is absent: must log-and-return, never panic.
        ctx.dispatch(&result);

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.is_empty());
    }

    #[cfg(unix)]
    fn write_tool_script(dir: &Path, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        std::fs::create_dir_all(dir).unwrap();
        let exe = dir.join(VERIFICATION_TOOL);
        std::fs::write(&exe, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&exe).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&exe, perms).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn pass_dispatch_invokes_tool_with_block_argument() {
        let tmp = tempfile::tempdir().unwrap();
        let bin = tmp.path().join("bin");
        let marker = tmp.path().join("invoked.txt");
        write_tool_script(&bin, &format!("echo \"$@\" > {}", marker.display()));

        let ctx = ActionContext::new(
            NotificationLog::open(&tmp.path().join("mail_sent.log")).unwrap(),
            bin,
        );
        let result = AuditResult::from_violations(
            "mod_015".to_string(),
            "engineer_1".to_string(),
            Vec::new(),
        );
        ctx.dispatch(&result);

        let args = std::fs::read_to_string(&marker).unwrap();
        assert!(args.contains("-block mod_015"));
        assert!(args.contains("-mode verify"));
    }

    #[cfg(unix)]
    #[test]
    fn tool_timeout_kills_runaway_invocation() {
        let tmp = tempfile::tempdir().unwrap();
        let bin = tmp.path().join("bin");
        write_tool_script(&bin, "sleep 30");

        let ctx = ActionContext::new(
            NotificationLog::open(&tmp.path().join("mail_sent.log")).unwrap(),
            bin,
        )
        .with_tool_timeout(Duration::from_millis(200));
        let result = AuditResult::from_violations(
            "mod_016".to_string(),
            "engineer_1".to_string(),
            Vec::new(),
        );

        let started = Instant::now();
        ctx.dispatch(&result);
        assert!(
            started.elapsed() < Duration::from_secs(5),
            "timed-out tool must be killed promptly"
        );
    }

    #[cfg(unix)]
    #[test]
    fn tool_failure_code_does_not_panic_or_notify() {
        let tmp = tempfile::tempdir().unwrap();
        let bin = tmp.path().join("bin");
        write_tool_script(&bin, "exit 3");

        let log_path = tmp.path().join("mail_sent.log");
        let ctx = ActionContext::new(NotificationLog::open(&log_path).unwrap(), bin);
        let result = AuditResult::from_violations(
            "mod_017".to_string(),
            "engineer_1".to_string(),
            Vec::new(),
        );
        ctx.dispatch(&result);

        assert!(std::fs::read_to_string(&log_path).unwrap().is_empty());
    }
}
