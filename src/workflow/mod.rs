//! Transactional orchestration: plans, backups, the exclusivity lock, the
//! state machine, and the executor.

pub mod backup;
pub mod executor;
pub mod lock;
pub mod plan;
pub mod state;

pub use backup::{Manifest, RollbackReport};
pub use executor::{execute, ExecuteOptions, WorkflowResult};
pub use lock::WorkspaceLock;
pub use plan::{build_plan, OpKind, OpStatus, Operation, Plan, Selection};
pub use state::{WorkflowState, TransitionLog};
