//! Report rendering: terminal, JSON, and markdown writers.

use crate::core::{DetectReport, FileAnalysis, RiskLevel};
use crate::workflow::WorkflowResult;
use anyhow::Result;
use colored::Colorize;
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Terminal,
    Json,
    Markdown,
}

fn risk_colored(risk: RiskLevel) -> String {
    let name = risk.display_name();
    match risk {
        RiskLevel::Low => name.green().to_string(),
        RiskLevel::Medium => name.yellow().to_string(),
        RiskLevel::High => name.red().to_string(),
        RiskLevel::Critical => name.red().bold().to_string(),
        RiskLevel::Unknown => name.dimmed().to_string(),
    }
}

pub fn render_detect_report(report: &DetectReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Markdown => Ok(detect_markdown(report)),
        OutputFormat::Terminal => Ok(detect_terminal(report)),
    }
}

fn detect_terminal(report: &DetectReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} files analyzed, {} skipped",
        "Detection:".bold(),
        report.metrics.len(),
        report.skipped.len()
    );
    for skipped in &report.skipped {
        let _ = writeln!(out, "  {} {} ({})", "skipped".dimmed(), skipped.path.display(), skipped.reason);
    }

    if report.recommendations.is_empty() {
        let _ = writeln!(out, "\nNo decomposition recommendations.");
        return out;
    }

    let _ = writeln!(out, "\n{}", "Recommendations:".bold());
    for rec in &report.recommendations {
        let _ = writeln!(
            out,
            "\n  {} [{}] confidence {:.2}, {} dependent file(s)",
            rec.path.display(),
            risk_colored(rec.risk),
            rec.confidence,
            rec.dependents.len()
        );
        for proposal in &rec.proposals {
            let _ = writeln!(
                out,
                "    -> {} ({} declarations, ~{} lines, cohesion {:.2})",
                proposal.new_path.display(),
                proposal.group.members.len(),
                proposal.group.estimated_lines,
                proposal.group.cohesion
            );
        }
        if rec.ungrouped > 0 {
            let _ = writeln!(out, "    {} {} declaration(s) left in place", "note:".dimmed(), rec.ungrouped);
        }
    }
    out
}

fn detect_markdown(report: &DetectReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Detection report\n");
    let _ = writeln!(
        out,
        "Analyzed {} files ({} skipped).\n",
        report.metrics.len(),
        report.skipped.len()
    );
    let _ = writeln!(out, "| File | Lines | Complexity | MI | Risk |");
    let _ = writeln!(out, "|------|-------|------------|----|------|");
    for m in report.metrics.iter().filter(|m| m.risk >= RiskLevel::Medium) {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.1} | {} |",
            m.path.display(),
            m.physical_lines,
            m.cyclomatic_complexity,
            m.maintainability_index,
            m.risk.display_name()
        );
    }
    let _ = writeln!(out, "\n## Recommendations\n");
    for rec in &report.recommendations {
        let _ = writeln!(
            out,
            "- `{}` (confidence {:.2}): split into {} modules",
            rec.path.display(),
            rec.confidence,
            rec.proposals.len()
        );
        for proposal in &rec.proposals {
            let _ = writeln!(out, "  - `{}`", proposal.new_path.display());
        }
    }
    out
}

pub fn render_analysis(analysis: &FileAnalysis, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(analysis)?),
        OutputFormat::Markdown | OutputFormat::Terminal => {
            let m = &analysis.metrics;
            let mut out = String::new();
            let _ = writeln!(out, "{}", m.path.display());
            let _ = writeln!(
                out,
                "  lines: {} physical / {} total",
                m.physical_lines, m.total_lines
            );
            let _ = writeln!(out, "  cyclomatic complexity: {}", m.cyclomatic_complexity);
            let _ = writeln!(out, "  maintainability index: {:.1}", m.maintainability_index);
            let _ = writeln!(out, "  risk: {}", risk_colored(m.risk));
            if m.parse_error {
                let _ = writeln!(out, "  {}", "parse error: grouping unavailable".red());
            }
            for group in &analysis.groups {
                let _ = writeln!(
                    out,
                    "  group {} ({} members, cohesion {:.2}): {}",
                    group.name.bold(),
                    group.members.len(),
                    group.cohesion,
                    group
                        .members
                        .iter()
                        .map(|m| m.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            if analysis.ungrouped > 0 {
                let _ = writeln!(out, "  ungrouped declarations: {}", analysis.ungrouped);
            }
            Ok(out)
        }
    }
}

pub fn render_workflow_result(result: &WorkflowResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Markdown | OutputFormat::Terminal => {
            let mut out = String::new();
            let state = format!("{:?}", result.final_state);
            let _ = writeln!(
                out,
                "{} {}",
                "Workflow:".bold(),
                match result.final_state {
                    crate::workflow::WorkflowState::Succeeded => state.green().to_string(),
                    crate::workflow::WorkflowState::RolledBack => state.yellow().to_string(),
                    _ => state.red().to_string(),
                }
            );
            if let Some(id) = &result.backup_id {
                let _ = writeln!(out, "  backup: {id}");
            }
            for op in &result.operations {
                let targets: Vec<PathBuf> = op.targets.clone();
                let _ = writeln!(
                    out,
                    "  {} {:?} ({} ms){}{}",
                    op.id,
                    op.status,
                    op.duration_ms,
                    targets
                        .first()
                        .map(|t| format!(" -> {}", t.display()))
                        .unwrap_or_default(),
                    op.error
                        .as_deref()
                        .map(|e| format!(": {e}"))
                        .unwrap_or_default()
                );
            }
            if let Some(failure) = &result.failure {
                let _ = writeln!(out, "  {} {failure}", "cause:".red());
            }
            if let Some(rollback) = &result.rollback {
                let _ = writeln!(
                    out,
                    "  rollback: {} restored, {} deleted",
                    rollback.restored, rollback.deleted
                );
            }
            Ok(out)
        }
    }
}
