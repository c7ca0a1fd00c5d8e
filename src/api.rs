//! The crate's entry points, as consumed by surrounding tooling.

use crate::analysis::{self, ReverseImportIndex};
use crate::config::Policy;
use crate::core::ast::{declarations, import_bindings, ParsedFile};
use crate::core::{DetectReport, FileAnalysis, Recommendation};
use crate::errors::SplitmapError;
use crate::metrics;
use crate::workflow::{self, backup, ExecuteOptions, Plan, Selection, WorkflowResult};
use anyhow::{Context, Result};
use std::path::Path;

/// Read-only detection pass over a tree: metrics for every file plus ranked
/// decomposition recommendations for the oversized ones.
pub fn detect(root: &Path, policy: &Policy, show_progress: bool) -> Result<DetectReport> {
    let detection = analysis::scan_tree(root, policy, show_progress)?;

    // Barrier: the reverse-import index must exist before any recommendation.
    let parsed: Vec<&ParsedFile> = detection
        .records
        .iter()
        .filter_map(|r| r.parsed.as_ref())
        .collect();
    let index = ReverseImportIndex::build(root, &parsed);
    let recommendations = analysis::recommend(&detection, &index, policy);

    Ok(DetectReport {
        root: root.to_path_buf(),
        metrics: detection.records.into_iter().map(|r| r.metrics).collect(),
        recommendations,
        skipped: detection.skipped,
    })
}

/// Read-only analysis of one file: metrics and responsibility groups.
pub fn analyze_file(path: &Path, policy: &Policy) -> Result<FileAnalysis> {
    let source = crate::io::read_to_string_retry(path)?;
    match ParsedFile::from_source(path, source) {
        Ok(parsed) => {
            let metrics = metrics::compute(path, &parsed.source, Some(&parsed.ast), policy);
            let decls = declarations(&parsed);
            let imports = import_bindings(&parsed);
            let (groups, ungrouped) =
                analysis::group_declarations(&decls, &imports, &policy.grouping);
            Ok(FileAnalysis {
                metrics,
                groups,
                ungrouped: ungrouped.len(),
            })
        }
        Err(SplitmapError::Parse { .. }) => {
            let source = crate::io::read_to_string_retry(path)?;
            Ok(FileAnalysis {
                metrics: metrics::compute(path, &source, None, policy),
                groups: Vec::new(),
                ungrouped: 0,
            })
        }
        Err(other) => Err(other.into()),
    }
}

/// Build an executable plan from recommendations. Structural problems (a
/// cyclic dependency graph, unknown dependencies) are fatal here and nothing
/// executes.
pub fn build_plan(
    recommendations: &[Recommendation],
    selection: &Selection,
) -> Result<Plan, SplitmapError> {
    workflow::build_plan(recommendations, selection)
}

/// Execute a plan under the full workflow: lock, backup, serial execution
/// with per-operation validation, final test gate, rollback on failure.
pub fn execute(
    root: &Path,
    plan: &Plan,
    options: &ExecuteOptions,
    policy: &Policy,
) -> Result<WorkflowResult> {
    workflow::execute(root, plan, options, policy)
        .with_context(|| format!("workflow failed for {}", root.display()))
}

/// Restore a backup independently of a workflow run, e.g. after a terminal
/// failed state with automatic rollback disabled. `backup_id` defaults to
/// the most recent backup.
pub fn rollback(
    root: &Path,
    policy: &Policy,
    backup_id: Option<&str>,
) -> Result<backup::RollbackReport> {
    let backup_root = policy.backup_root_for(root);
    let id = match backup_id {
        Some(id) => id.to_string(),
        None => backup::latest_id(&backup_root)
            .with_context(|| format!("no backups under {}", backup_root.display()))?,
    };
    Ok(backup::restore(root, &backup_root, &id)?)
}
