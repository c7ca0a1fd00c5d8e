//! Common type definitions used across the codebase

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Risk classification for a file, a pure function of metrics and thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
    /// Metrics could not be computed (parse failure)
    Unknown,
}

impl RiskLevel {
    pub fn display_name(&self) -> &str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
            RiskLevel::Unknown => "UNKNOWN",
        }
    }
}

/// Immutable per-file metrics snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetrics {
    pub path: PathBuf,
    /// Non-blank, non-full-comment source lines
    pub physical_lines: usize,
    pub total_lines: usize,
    pub cyclomatic_complexity: u32,
    /// Composite score in [0, 100]; higher is healthier
    pub maintainability_index: f64,
    /// comment lines / (code + comment lines)
    pub comment_density: f64,
    pub risk: RiskLevel,
    pub parse_error: bool,
}

/// Closed classification of a top-level declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclKind {
    /// struct, enum, union, or trait definition
    Type,
    Function,
    /// inherent or trait impl block
    Impl,
    /// `use` declaration
    Import,
    /// const, static, type alias, module declaration, macro, ...
    Other,
}

/// Declared visibility, reduced to the exposure classes the splitter must
/// preserve across a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclVisibility {
    Public,
    /// `pub(crate)`, `pub(super)`, `pub(in ...)`
    Restricted,
    Private,
}

/// One top-level declaration of a parsed file, with its source span and the
/// identifiers it references.
#[derive(Debug, Clone)]
pub struct Decl {
    /// Position in the file's item list; grouping ties break on this
    pub index: usize,
    pub kind: DeclKind,
    /// Item name; for impl blocks the self-type name, `None` for imports
    /// and unnamed items
    pub name: Option<String>,
    pub visibility: DeclVisibility,
    /// 1-based line range, attributes and contiguous leading comments included
    pub line_start: usize,
    pub line_end: usize,
    /// Free path-root identifiers referenced inside the declaration
    pub referenced: BTreeSet<String>,
    /// False for declarations that must stay in place (module declarations,
    /// macro definitions); they still resolve references by name
    pub movable: bool,
}

impl Decl {
    pub fn line_span(&self) -> usize {
        self.line_end.saturating_sub(self.line_start) + 1
    }

    /// Kinds that participate in responsibility grouping.
    pub fn is_groupable(&self) -> bool {
        self.movable && self.name.is_some() && self.kind != DeclKind::Import
    }
}

/// Identity of a group member, stable across re-parses of the source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRef {
    pub kind: DeclKind,
    pub name: String,
}

/// Named cluster of declarations inferred to serve one purpose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsibilityGroup {
    pub name: String,
    pub members: Vec<MemberRef>,
    /// Indices into the file's declaration list, in declaration order
    pub decl_indices: Vec<usize>,
    /// Import names the members need
    pub needed_imports: BTreeSet<String>,
    /// Cohesion confidence in [0, 1]
    pub cohesion: f64,
    /// Total line span of the members
    pub estimated_lines: usize,
}

/// A proposed extraction of one group to one new file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupProposal {
    pub group: ResponsibilityGroup,
    pub new_path: PathBuf,
}

/// One analysis finding: how to decompose one oversized file.
/// Produced once per run; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub path: PathBuf,
    pub risk: RiskLevel,
    /// Combined grouping confidence, grouped fraction, and inverse
    /// dependent count; always in [0, 1]
    pub confidence: f64,
    pub proposals: Vec<GroupProposal>,
    /// Count of groupable declarations left ungrouped
    pub ungrouped: usize,
    /// Files that import the target, from the reverse-import index
    pub dependents: Vec<PathBuf>,
}

/// A file the detector had to skip, with the cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Output of a detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectReport {
    pub root: PathBuf,
    pub metrics: Vec<FileMetrics>,
    pub recommendations: Vec<Recommendation>,
    pub skipped: Vec<SkippedFile>,
}

/// Output of single-file analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub metrics: FileMetrics,
    pub groups: Vec<ResponsibilityGroup>,
    pub ungrouped: usize,
}
