//! The refactoring workflow: plan -> backup -> execute -> validate, with
//! rollback on any failure.
//!
//! Execution is strictly single-threaded: one operation's writes complete or
//! fail before the next starts, because later operations read paths earlier
//! ones rewrite and one backup manifest is being consumed. The analyzed root
//! is owned exclusively through the workspace lock for the whole run.

use crate::config::Policy;
use crate::errors::SplitmapError;
use crate::transform::batch::{BatchSplitter, OperationResult};
use crate::workflow::backup::{self, RollbackReport};
use crate::workflow::lock::WorkspaceLock;
use crate::workflow::plan::{OpStatus, Operation, Plan};
use crate::workflow::state::{TransitionLog, WorkflowState};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    pub continue_on_error: bool,
    /// External test command run as the final validation gate
    pub test_command: Option<String>,
    pub test_timeout: Duration,
    pub rollback_enabled: bool,
    /// Keep completed operations when the run is cancelled mid-plan
    pub keep_partial_on_cancel: bool,
    /// Checked between operations; set by the caller to cancel
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            continue_on_error: false,
            test_command: None,
            test_timeout: Duration::from_secs(300),
            rollback_enabled: true,
            keep_partial_on_cancel: false,
            cancel: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub final_state: WorkflowState,
    pub operations: Vec<OperationResult>,
    pub backup_id: Option<String>,
    pub rollback: Option<RollbackReport>,
    /// Cause of a failed run, naming the failing stage or operation
    pub failure: Option<String>,
}

/// Execute a validated plan against `root`.
pub fn execute(
    root: &Path,
    plan: &Plan,
    options: &ExecuteOptions,
    policy: &Policy,
) -> Result<WorkflowResult, SplitmapError> {
    plan.validate()?;
    if plan.operations.is_empty() {
        return Err(SplitmapError::structural("plan contains no operations"));
    }

    let state_dir = policy.state_dir_for(root);
    let _lock = WorkspaceLock::acquire(&state_dir)?;

    // Backup failure aborts before anything executes.
    let backup_root = policy.backup_root_for(root);
    let handle = backup::create(root, &backup_root, plan)?;
    let mut log = TransitionLog::create(&handle.dir)?;
    log.transition(WorkflowState::BackedUp, format!("backup {}", handle.id))?;

    log.transition(WorkflowState::Executing, "")?;
    let batch = BatchSplitter::new(
        plan,
        options.continue_on_error,
        options.cancel.as_deref(),
    );
    let report = batch.run(
        |op| pre_validate(op),
        |op| post_validate(op),
        |op, status, detail| {
            if let Err(e) = log.record_operation(&op.id, status, detail) {
                log::warn!("failed to record operation transition: {e}");
            }
        },
    );

    let mut result = WorkflowResult {
        final_state: WorkflowState::Executing,
        operations: report.results,
        backup_id: Some(handle.id.clone()),
        rollback: None,
        failure: None,
    };

    if report.cancelled || report.failed {
        let cause = if report.cancelled {
            "cancelled between operations".to_string()
        } else {
            first_failure(&result.operations)
        };
        log.transition(WorkflowState::Failed, cause.clone())?;
        result.failure = Some(cause);
        let keep = report.cancelled && options.keep_partial_on_cancel;
        finish_failed(root, &backup_root, &handle.id, options, &mut log, &mut result, keep)?;
        return Ok(result);
    }

    log.transition(WorkflowState::Validating, "")?;
    if let Some(command) = &options.test_command {
        if let Err(err) = run_test_command(root, command, options.test_timeout) {
            let cause = err.to_string();
            log.transition(WorkflowState::Failed, cause.clone())?;
            result.failure = Some(cause);
            finish_failed(root, &backup_root, &handle.id, options, &mut log, &mut result, false)?;
            return Ok(result);
        }
    } else {
        log::debug!("no test command configured, validation gate passes vacuously");
    }

    log.transition(WorkflowState::Succeeded, "")?;
    result.final_state = WorkflowState::Succeeded;
    Ok(result)
}

#[allow(clippy::too_many_arguments)]
fn finish_failed(
    root: &Path,
    backup_root: &Path,
    backup_id: &str,
    options: &ExecuteOptions,
    log: &mut TransitionLog,
    result: &mut WorkflowResult,
    keep_partial: bool,
) -> Result<(), SplitmapError> {
    if !options.rollback_enabled || keep_partial {
        result.final_state = WorkflowState::Failed;
        return Ok(());
    }
    let report = backup::restore(root, backup_root, backup_id)?;
    for op in &mut result.operations {
        if op.status == OpStatus::Succeeded {
            op.status = OpStatus::RolledBack;
            if let Err(e) = log.record_operation(&op.id, OpStatus::RolledBack, "") {
                log::warn!("failed to record rollback transition: {e}");
            }
        }
    }
    log.transition(WorkflowState::RolledBack, format!("restored {}", report.restored))?;
    result.rollback = Some(report);
    result.final_state = WorkflowState::RolledBack;
    Ok(())
}

fn first_failure(operations: &[OperationResult]) -> String {
    operations
        .iter()
        .find(|op| op.status == OpStatus::Failed)
        .map(|op| {
            format!(
                "operation {} failed: {}",
                op.id,
                op.error.as_deref().unwrap_or("unknown cause")
            )
        })
        .unwrap_or_else(|| "unknown failure".to_string())
}

/// Pre-operation validation: the source is present and parseable and no
/// target is already occupied.
fn pre_validate(op: &Operation) -> Result<(), SplitmapError> {
    if !op.source.exists() {
        return Err(SplitmapError::validation(
            &op.id,
            format!("source {} does not exist", op.source.display()),
        ));
    }
    let source = crate::io::read_to_string_retry(&op.source)?;
    syn::parse_file(&source).map_err(|e| {
        SplitmapError::validation(&op.id, format!("source no longer parses: {e}"))
    })?;
    for target in &op.targets {
        if target.exists() {
            return Err(SplitmapError::validation(
                &op.id,
                format!("target {} already exists", target.display()),
            ));
        }
    }
    Ok(())
}

/// Post-operation validation: every file the operation wrote parses again
/// from disk.
fn post_validate(op: &Operation) -> Result<(), SplitmapError> {
    for path in op.targets.iter().chain(std::iter::once(&op.source)) {
        if !path.exists() {
            continue; // move operations legitimately remove their source
        }
        let content = crate::io::read_to_string_retry(path)?;
        syn::parse_file(&content).map_err(|e| {
            SplitmapError::validation(
                &op.id,
                format!("output {} does not parse: {e}", path.display()),
            )
        })?;
    }
    Ok(())
}

/// Run the project's test command with a deadline. The child is polled so a
/// hung suite cannot wedge the workflow; timeout kills it and counts as
/// failure.
fn run_test_command(root: &Path, command: &str, timeout: Duration) -> Result<(), SplitmapError> {
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or_else(|| SplitmapError::ExternalCommand {
        message: "empty test command".to_string(),
    })?;

    log::info!("running validation command: {command}");
    let mut child = Command::new(program)
        .args(parts)
        .current_dir(root)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| SplitmapError::ExternalCommand {
            message: format!("failed to spawn `{command}`: {e}"),
        })?;

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                if status.success() {
                    return Ok(());
                }
                return Err(SplitmapError::ExternalCommand {
                    message: format!("`{command}` exited with {status}"),
                });
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SplitmapError::ExternalCommandTimeout(timeout));
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                return Err(SplitmapError::ExternalCommand {
                    message: format!("waiting on `{command}`: {e}"),
                });
            }
        }
    }
}
