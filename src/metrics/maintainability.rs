use crate::config::MaintainabilityWeights;

/// Composite maintainability index in [0, 100].
///
/// `base - complexity_weight * cc - size_weight * ln(loc) + comment bonus`,
/// rescaled against `base`. Monotonic in the penalizing direction: more
/// complexity or more lines can only lower the score. The comment bonus uses
/// the classic `50 * sin(sqrt(2.4 * density))` shape, scaled by policy.
pub fn maintainability_index(
    complexity: u32,
    physical_lines: usize,
    comment_density: f64,
    weights: &MaintainabilityWeights,
) -> f64 {
    let loc = physical_lines.max(1) as f64;
    let density = comment_density.clamp(0.0, 1.0);
    let bonus = weights.comment_weight * (2.4 * density).sqrt().sin();
    let raw =
        weights.base - weights.complexity_weight * f64::from(complexity) - weights.size_weight * loc.ln()
            + bonus;
    let scale = if weights.base > 0.0 { weights.base } else { 100.0 };
    (raw * 100.0 / scale).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mi(cc: u32, loc: usize, density: f64) -> f64 {
        maintainability_index(cc, loc, density, &MaintainabilityWeights::default())
    }

    #[test]
    fn more_complexity_never_raises_the_score() {
        let base = mi(5, 200, 0.1);
        for cc in [10, 40, 160, 640] {
            assert!(mi(cc, 200, 0.1) <= base);
        }
    }

    #[test]
    fn more_lines_never_raise_the_score() {
        let base = mi(10, 100, 0.1);
        for loc in [200, 800, 3200] {
            assert!(mi(10, loc, 0.1) <= base);
        }
    }

    #[test]
    fn comments_help_a_little() {
        assert!(mi(10, 500, 0.3) >= mi(10, 500, 0.0));
    }

    #[test]
    fn score_stays_in_bounds() {
        assert!(mi(0, 1, 1.0) <= 100.0);
        assert!(mi(10_000, 1_000_000, 0.0) >= 0.0);
    }
}
