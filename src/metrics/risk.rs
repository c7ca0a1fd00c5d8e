use crate::config::Thresholds;
use crate::core::RiskLevel;

/// Deterministic risk classification from metrics and thresholds.
pub fn risk_level(physical_lines: usize, complexity: u32, thresholds: &Thresholds) -> RiskLevel {
    let line_ratio = physical_lines as f64 / thresholds.max_lines.max(1) as f64;
    let complexity_ratio = f64::from(complexity) / f64::from(thresholds.max_complexity.max(1));

    if line_ratio >= thresholds.critical_multiplier
        && complexity_ratio >= thresholds.critical_multiplier
    {
        RiskLevel::Critical
    } else if line_ratio > 1.0 || complexity_ratio > 1.0 {
        RiskLevel::High
    } else if line_ratio >= thresholds.warn_ratio || complexity_ratio >= thresholds.warn_ratio {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// True when either threshold is exceeded; the detector's filter.
pub fn is_oversized(physical_lines: usize, complexity: u32, thresholds: &Thresholds) -> bool {
    physical_lines > thresholds.max_lines || complexity > thresholds.max_complexity
}
