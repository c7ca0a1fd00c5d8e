pub mod ast;
pub mod types;

pub use ast::{declarations, import_bindings, ImportBinding, ParsedFile};
pub use types::{
    Decl, DeclKind, DeclVisibility, DetectReport, FileAnalysis, FileMetrics, GroupProposal,
    MemberRef, Recommendation, ResponsibilityGroup, RiskLevel, SkippedFile,
};
