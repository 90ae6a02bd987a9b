//! Turning requested mixing proportions into per-source sub-sampling rates.
//!
//! A source sequenced at coverage `c` contributes `rate * target / c` of its
//! reads, so that every source ends up at `rate * target` reads per site in
//! the mixture. Sources too shallow for their share get a rate above 1 and
//! their reads are duplicated by the merge.

use log::warn;
use std::path::PathBuf;

use crate::consts::RATE_SUM_TOLERANCE;
use crate::errors::ValidationError;

///
/// Append the implied last rate when one fewer rate than sources was given.
///
/// # Arguments
/// - rates: requested rates, in source order
/// - nr_sources: number of sources (K)
///
pub fn complete_rates(mut rates: Vec<f64>, nr_sources: usize) -> Result<Vec<f64>, ValidationError> {
    if nr_sources > 0 && rates.len() == nr_sources - 1 {
        let sum: f64 = rates.iter().sum();
        rates.push(1.0 - sum);
    }

    if rates.len() != nr_sources {
        return Err(ValidationError::RateCountMismatch {
            expected: nr_sources,
            found: rates.len(),
        });
    }
    Ok(rates)
}

///
/// Rates must sum to 1 (within [`RATE_SUM_TOLERANCE`]) and each lie in `[0, 1]`.
///
/// A rate of exactly 1 is accepted; the remaining sources then contribute nothing.
///
pub fn validate_rates(rates: &[f64]) -> Result<(), ValidationError> {
    let sum: f64 = rates.iter().sum();
    if !sum.is_finite() || (sum - 1.0).abs() > RATE_SUM_TOLERANCE {
        return Err(ValidationError::RateSumError(sum));
    }

    if let Some(&bad) = rates.iter().find(|&&r| !(0.0..=1.0).contains(&r)) {
        return Err(ValidationError::RateRangeError(bad));
    }
    Ok(())
}

///
/// The requested output coverage, or by default the coverage of the source with
/// the highest rate (the first one on ties).
///
pub fn resolve_target_coverage(target: Option<f64>, rates: &[f64], coverages: &[f64]) -> f64 {
    if let Some(target) = target {
        return target;
    }

    let mut best = 0;
    for (i, rate) in rates.iter().enumerate() {
        if *rate > rates[best] {
            best = i;
        }
    }
    coverages[best]
}

///
/// Per-source sub-sampling probabilities, `rate * target / coverage`.
///
/// Values above 1 are passed through unchanged, with a warning naming the source.
///
pub fn compute_adjusted_rates(
    rates: &[f64],
    target: f64,
    coverages: &[f64],
    sources: &[PathBuf],
) -> Vec<f64> {
    rates
        .iter()
        .zip(coverages)
        .zip(sources)
        .map(|((rate, coverage), source)| {
            let adjusted = rate * target / coverage;
            if adjusted > 1.0 {
                warn!(
                    "{} has low coverage. Reads will be duplicated",
                    source.display()
                );
            }
            adjusted
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn sources(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("s{}.pat.gz", i))).collect()
    }

    #[rstest]
    fn test_complete_missing_rate() {
        let rates = complete_rates(vec![0.7], 2).unwrap();
        assert_eq!(rates.len(), 2);
        assert!((rates[1] - 0.3).abs() < 1e-12);
        assert!(validate_rates(&rates).is_ok());
    }

    #[rstest]
    fn test_complete_keeps_full_vector() {
        let rates = complete_rates(vec![0.2, 0.3, 0.5], 3).unwrap();
        assert_eq!(rates, vec![0.2, 0.3, 0.5]);
    }

    #[rstest]
    #[case(vec![0.5], 3)]
    #[case(vec![0.1, 0.2, 0.3, 0.4], 3)]
    #[case(vec![], 2)]
    fn test_rate_count_mismatch(#[case] rates: Vec<f64>, #[case] nr_sources: usize) {
        let found = rates.len();
        let result = complete_rates(rates, nr_sources);
        assert_eq!(
            result,
            Err(ValidationError::RateCountMismatch {
                expected: nr_sources,
                found
            })
        );
    }

    #[rstest]
    fn test_rates_must_sum_to_one() {
        let result = validate_rates(&[0.5, 0.6]);
        assert!(matches!(result, Err(ValidationError::RateSumError(_))));

        // within tolerance
        assert!(validate_rates(&[0.5, 0.5 + 1e-9]).is_ok());
    }

    #[rstest]
    fn test_rates_must_be_in_range() {
        let result = validate_rates(&[1.2, -0.2]);
        assert_eq!(result, Err(ValidationError::RateRangeError(1.2)));

        let result = validate_rates(&[-0.5, 1.5]);
        assert_eq!(result, Err(ValidationError::RateRangeError(-0.5)));
    }

    #[rstest]
    fn test_rate_of_exactly_one_is_accepted() {
        assert!(validate_rates(&[1.0, 0.0]).is_ok());
        let rates = complete_rates(vec![1.0], 2).unwrap();
        assert!(validate_rates(&rates).is_ok());
    }

    #[rstest]
    #[case(3, vec![0.2, 0.5, 0.3])]
    #[case(4, vec![0.25, 0.25, 0.25])]
    #[case(5, vec![0.0, 0.0, 0.9, 0.05])]
    fn test_completed_vectors_are_valid(#[case] k: usize, #[case] rates: Vec<f64>) {
        let rates = complete_rates(rates, k).unwrap();
        assert_eq!(rates.len(), k);
        assert!(validate_rates(&rates).is_ok());
    }

    #[rstest]
    fn test_target_defaults_to_highest_rate_source() {
        assert_eq!(resolve_target_coverage(None, &[0.6, 0.4], &[10.0, 5.0]), 10.0);
        assert_eq!(resolve_target_coverage(None, &[0.2, 0.8], &[10.0, 5.0]), 5.0);
        // first source wins ties
        assert_eq!(resolve_target_coverage(None, &[0.5, 0.5], &[7.0, 3.0]), 7.0);
        assert_eq!(resolve_target_coverage(Some(12.5), &[0.6, 0.4], &[10.0, 5.0]), 12.5);
    }

    #[rstest]
    fn test_adjusted_rates() {
        let rates = [0.6, 0.4];
        let coverages = [10.0, 5.0];
        let target = resolve_target_coverage(None, &rates, &coverages);
        let adjusted = compute_adjusted_rates(&rates, target, &coverages, &sources(2));

        assert!((adjusted[0] - 0.6).abs() < 1e-12);
        assert!((adjusted[1] - 0.8).abs() < 1e-12);
    }

    #[rstest]
    fn test_adjusted_rates_are_not_clamped() {
        let rates = [0.5, 0.5];
        let coverages = [20.0, 2.0];
        let adjusted = compute_adjusted_rates(&rates, 20.0, &coverages, &sources(2));

        assert!((adjusted[0] - 0.5).abs() < 1e-12);
        assert!((adjusted[1] - 5.0).abs() < 1e-12);

        for i in 0..2 {
            assert!((adjusted[i] - rates[i] * 20.0 / coverages[i]).abs() < 1e-12);
        }
    }
}
