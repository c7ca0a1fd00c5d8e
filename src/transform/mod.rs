//! The transformation engine: path derivation, history-preserving moves,
//! single-file splits, and batch sequencing.

pub mod batch;
pub mod moves;
pub mod paths;
pub mod splitter;

pub use batch::{BatchReport, BatchSplitter, OperationResult};
pub use moves::{move_with_history, GitIndexMove, HistoryOutcome, HistoryPreservingMove, MoveSupport};
pub use paths::derive_child_path;
pub use splitter::{split_file, SplitOutcome, SplitRequest};
