//! Per-file metrics: physical lines, cyclomatic complexity, maintainability.

pub mod cyclomatic;
pub mod loc;
pub mod maintainability;
pub mod risk;

pub use cyclomatic::file_complexity;
pub use loc::{count_lines, LineStats};
pub use maintainability::maintainability_index;
pub use risk::{is_oversized, risk_level};

use crate::config::Policy;
use crate::core::{FileMetrics, RiskLevel};
use std::path::Path;

/// Compute the full metrics snapshot for one file. `ast` is `None` when the
/// file failed to parse; line statistics are still reported, risk is Unknown,
/// and the parse-error flag is set.
pub fn compute(path: &Path, source: &str, ast: Option<&syn::File>, policy: &Policy) -> FileMetrics {
    let stats = count_lines(source);
    let density = stats.comment_density();

    match ast {
        Some(ast) => {
            let complexity = file_complexity(ast);
            FileMetrics {
                path: path.to_path_buf(),
                physical_lines: stats.physical,
                total_lines: stats.total,
                cyclomatic_complexity: complexity,
                maintainability_index: maintainability_index(
                    complexity,
                    stats.physical,
                    density,
                    &policy.maintainability,
                ),
                comment_density: density,
                risk: risk_level(stats.physical, complexity, &policy.thresholds),
                parse_error: false,
            }
        }
        None => FileMetrics {
            path: path.to_path_buf(),
            physical_lines: stats.physical,
            total_lines: stats.total,
            cyclomatic_complexity: 0,
            maintainability_index: 0.0,
            comment_density: density,
            risk: RiskLevel::Unknown,
            parse_error: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn unparsable_input_yields_unknown_risk() {
        let metrics = compute(
            &PathBuf::from("broken.rs"),
            "fn broken( {",
            None,
            &Policy::default(),
        );
        assert!(metrics.parse_error);
        assert_eq!(metrics.risk, RiskLevel::Unknown);
        assert_eq!(metrics.physical_lines, 1);
    }

    #[test]
    fn parsed_input_gets_full_metrics() {
        let source = "fn f(x: bool) -> u32 { if x { 1 } else { 0 } }\n";
        let ast = syn::parse_file(source).unwrap();
        let metrics = compute(
            &PathBuf::from("ok.rs"),
            source,
            Some(&ast),
            &Policy::default(),
        );
        assert!(!metrics.parse_error);
        assert_eq!(metrics.cyclomatic_complexity, 2);
        assert_eq!(metrics.risk, RiskLevel::Low);
        assert!(metrics.maintainability_index > 0.0);
    }
}
