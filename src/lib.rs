// Export modules for library usage
pub mod analysis;
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod errors;
pub mod io;
pub mod metrics;
pub mod transform;
pub mod workflow;

// Re-export commonly used types
pub use crate::core::{
    DetectReport, FileAnalysis, FileMetrics, GroupProposal, MemberRef, Recommendation,
    ResponsibilityGroup, RiskLevel, SkippedFile,
};

pub use crate::api::{analyze_file, build_plan, detect, execute, rollback};

pub use crate::config::Policy;

pub use crate::errors::SplitmapError;

pub use crate::transform::{HistoryOutcome, OperationResult, SplitOutcome};

pub use crate::workflow::{
    ExecuteOptions, OpKind, OpStatus, Operation, Plan, Selection, WorkflowResult, WorkflowState,
};
