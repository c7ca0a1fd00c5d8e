use proptest::prelude::*;
use splitmap::config::{MaintainabilityWeights, Thresholds};
use splitmap::metrics::{maintainability_index, risk_level};
use splitmap::RiskLevel;

proptest! {
    /// Risk is a total, deterministic function of metrics and thresholds.
    #[test]
    fn risk_is_total_and_deterministic(
        lines in 0usize..100_000,
        complexity in 0u32..10_000,
        max_lines in 1usize..5_000,
        max_complexity in 1u32..1_000,
    ) {
        let thresholds = Thresholds {
            max_lines,
            max_complexity,
            ..Thresholds::default()
        };
        let first = risk_level(lines, complexity, &thresholds);
        let second = risk_level(lines, complexity, &thresholds);
        prop_assert_eq!(first, second);
        prop_assert!(first != RiskLevel::Unknown);
    }

    /// Raising either metric never lowers the risk classification.
    #[test]
    fn risk_is_monotonic_in_metrics(
        lines in 0usize..10_000,
        complexity in 0u32..1_000,
        bump_lines in 0usize..10_000,
        bump_complexity in 0u32..1_000,
    ) {
        let thresholds = Thresholds::default();
        let base = risk_level(lines, complexity, &thresholds);
        let bumped = risk_level(lines + bump_lines, complexity + bump_complexity, &thresholds);
        prop_assert!(bumped >= base);
    }

    /// The maintainability index stays in [0, 100] and never rises with more
    /// complexity or more lines.
    #[test]
    fn maintainability_is_bounded_and_monotonic(
        complexity in 0u32..5_000,
        lines in 1usize..100_000,
        density in 0.0f64..1.0,
        bump in 1u32..1_000,
    ) {
        let weights = MaintainabilityWeights::default();
        let score = maintainability_index(complexity, lines, density, &weights);
        prop_assert!((0.0..=100.0).contains(&score));

        let more_complex = maintainability_index(complexity + bump, lines, density, &weights);
        prop_assert!(more_complex <= score);

        let longer = maintainability_index(complexity, lines + bump as usize, density, &weights);
        prop_assert!(longer <= score);
    }
}
