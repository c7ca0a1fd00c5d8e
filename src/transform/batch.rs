//! Sequenced execution of a plan's operations.
//!
//! Operations run strictly serially in plan order. The default mode halts at
//! the first failure; continue-on-error completes independent operations and
//! reports transitive dependents of a failure as skipped — not attempted,
//! not failed. Cancellation is honored only between operations.

use crate::errors::SplitmapError;
use crate::transform::moves::{move_with_history, HistoryOutcome};
use crate::transform::splitter::{split_file, SplitRequest};
use crate::workflow::plan::{OpKind, OpStatus, Operation, Plan};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult {
    pub id: String,
    pub status: OpStatus,
    pub targets: Vec<PathBuf>,
    pub history: Option<HistoryOutcome>,
    pub duration_ms: u64,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<OperationResult>,
    pub failed: bool,
    pub cancelled: bool,
}

pub struct BatchSplitter<'a> {
    plan: &'a Plan,
    continue_on_error: bool,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> BatchSplitter<'a> {
    pub fn new(plan: &'a Plan, continue_on_error: bool, cancel: Option<&'a AtomicBool>) -> Self {
        Self {
            plan,
            continue_on_error,
            cancel,
        }
    }

    /// Run every operation. `pre` and `post` are the workflow's validation
    /// hooks, invoked around each operation; `observe` sees every status
    /// change for logging.
    pub fn run(
        &self,
        mut pre: impl FnMut(&Operation) -> Result<(), SplitmapError>,
        mut post: impl FnMut(&Operation) -> Result<(), SplitmapError>,
        mut observe: impl FnMut(&Operation, OpStatus, &str),
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let mut skipped: HashSet<String> = HashSet::new();
        let mut halted = false;

        for op in &self.plan.operations {
            if self.cancel.is_some_and(|flag| flag.load(Ordering::SeqCst)) && !report.cancelled {
                report.cancelled = true;
                log::info!("cancellation requested; skipping remaining operations");
            }
            if halted || report.cancelled || skipped.contains(&op.id) {
                let detail = if report.cancelled {
                    "cancelled before start"
                } else if halted {
                    "not attempted after earlier failure"
                } else {
                    "dependent of a failed operation"
                };
                observe(op, OpStatus::Skipped, detail);
                report.results.push(OperationResult {
                    id: op.id.clone(),
                    status: OpStatus::Skipped,
                    targets: op.targets.clone(),
                    history: None,
                    duration_ms: 0,
                    error: None,
                });
                continue;
            }

            observe(op, OpStatus::Running, "");
            let started = Instant::now();
            let outcome = pre(op).and_then(|_| self.execute(op)).and_then(|history| {
                post(op)?;
                Ok(history)
            });
            let duration_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(history) => {
                    observe(op, OpStatus::Succeeded, "");
                    report.results.push(OperationResult {
                        id: op.id.clone(),
                        status: OpStatus::Succeeded,
                        targets: op.targets.clone(),
                        history,
                        duration_ms,
                        error: None,
                    });
                }
                Err(err) => {
                    let message = err.to_string();
                    observe(op, OpStatus::Failed, &message);
                    report.failed = true;
                    report.results.push(OperationResult {
                        id: op.id.clone(),
                        status: OpStatus::Failed,
                        targets: op.targets.clone(),
                        history: None,
                        duration_ms,
                        error: Some(message),
                    });
                    if self.continue_on_error {
                        skipped.extend(self.plan.dependents_of(&op.id));
                    } else {
                        halted = true;
                    }
                }
            }
        }
        report
    }

    fn execute(&self, op: &Operation) -> Result<Option<HistoryOutcome>, SplitmapError> {
        match op.kind {
            OpKind::Split => {
                let target = op.targets.first().ok_or_else(|| {
                    SplitmapError::validation(&op.id, "split operation without a target")
                })?;
                let outcome = split_file(&SplitRequest {
                    source_path: &op.source,
                    group_name: op.group_name.as_deref().unwrap_or("group"),
                    members: &op.members,
                    target_path: target,
                    prefer_move: op.prefer_move,
                })?;
                Ok(outcome.history)
            }
            OpKind::Move => {
                let target = op.targets.first().ok_or_else(|| {
                    SplitmapError::validation(&op.id, "move operation without a target")
                })?;
                let outcome = move_with_history(&op.source, target)?;
                Ok(Some(outcome))
            }
        }
    }
}
