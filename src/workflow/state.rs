//! Workflow state machine and its append-only transition log.
//!
//! Every state change and every operation status change is one JSON line in
//! the run's log file. Recovery and audit replay the log as data instead of
//! reconstructing control flow.

use crate::errors::SplitmapError;
use crate::workflow::plan::OpStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const LOG_FILE_NAME: &str = "transitions.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    Planned,
    BackedUp,
    Executing,
    Validating,
    Succeeded,
    Failed,
    RolledBack,
}

impl WorkflowState {
    /// Legal transitions of the state machine.
    pub fn can_transition_to(self, next: WorkflowState) -> bool {
        use WorkflowState::*;
        matches!(
            (self, next),
            (Planned, BackedUp)
                | (BackedUp, Executing)
                | (Executing, Validating)
                | (Executing, Failed)
                | (Validating, Succeeded)
                | (Validating, Failed)
                | (Failed, RolledBack)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "record")]
pub enum LogRecord {
    State {
        at: DateTime<Utc>,
        state: WorkflowState,
        detail: String,
    },
    Operation {
        at: DateTime<Utc>,
        operation: String,
        status: OpStatus,
        detail: String,
    },
}

/// Append-only writer over the run's transition log.
pub struct TransitionLog {
    file: File,
    path: PathBuf,
    state: WorkflowState,
}

impl TransitionLog {
    /// Open the log in the backup directory and record the initial state.
    pub fn create(dir: &Path) -> Result<Self, SplitmapError> {
        let path = dir.join(LOG_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| SplitmapError::io(&path, e))?;
        let mut log = Self {
            file,
            path,
            state: WorkflowState::Planned,
        };
        log.append(&LogRecord::State {
            at: Utc::now(),
            state: WorkflowState::Planned,
            detail: "plan validated".to_string(),
        })?;
        Ok(log)
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Advance the state machine; illegal transitions are programming errors
    /// surfaced as structural failures, never silently logged.
    pub fn transition(
        &mut self,
        next: WorkflowState,
        detail: impl Into<String>,
    ) -> Result<(), SplitmapError> {
        if !self.state.can_transition_to(next) {
            return Err(SplitmapError::structural(format!(
                "illegal workflow transition {:?} -> {next:?}",
                self.state
            )));
        }
        self.append(&LogRecord::State {
            at: Utc::now(),
            state: next,
            detail: detail.into(),
        })?;
        self.state = next;
        Ok(())
    }

    pub fn record_operation(
        &mut self,
        operation: &str,
        status: OpStatus,
        detail: impl Into<String>,
    ) -> Result<(), SplitmapError> {
        self.append(&LogRecord::Operation {
            at: Utc::now(),
            operation: operation.to_string(),
            status,
            detail: detail.into(),
        })
    }

    fn append(&mut self, record: &LogRecord) -> Result<(), SplitmapError> {
        let line = serde_json::to_string(record).map_err(|e| SplitmapError::Backup {
            message: format!("log serialization: {e}"),
        })?;
        writeln!(self.file, "{line}").map_err(|e| SplitmapError::io(&self.path, e))?;
        self.file
            .flush()
            .map_err(|e| SplitmapError::io(&self.path, e))
    }
}

/// Parse a transition log back into records, for audit and tests.
pub fn read_log(dir: &Path) -> Result<Vec<LogRecord>, SplitmapError> {
    let path = dir.join(LOG_FILE_NAME);
    let raw = crate::io::read_to_string_retry(&path)?;
    raw.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|e| SplitmapError::Backup {
                message: format!("corrupt log line: {e}"),
            })
        })
        .collect()
}
