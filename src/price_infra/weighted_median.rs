use crate::error::{Error, Result};

/// Weighted median with cumulative weights.
///
/// Pairs are sorted by value and the first value whose cumulative weight
/// reaches half of the total is returned. When the cumulative weight lands
/// exactly on the midpoint the lower of the two candidates wins, so equal
/// weights over an even sample give the lower median.
pub fn weighted_median(values: &[f64], weights: &[f64]) -> Result<f64> {
    if values.len() != weights.len() {
        return Err(Error::LengthMismatch {
            values: values.len(),
            weights: weights.len(),
        });
    }
    if values.is_empty() {
        return Err(Error::EmptySample);
    }
    if let Some(&weight) = weights.iter().find(|w| !w.is_finite() || **w <= 0.0) {
        return Err(Error::InvalidWeight { weight });
    }

    let mut weighted: Vec<(f64, f64)> = values.iter().copied().zip(weights.iter().copied()).collect();
    weighted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let total_weight: f64 = weighted.iter().map(|(_, w)| w).sum();
    let target_weight = total_weight / 2.0;
    // Sums that miss the midpoint only by rounding still count as landing on it.
    // Bounded by the worst-case error of summing `n` weights.
    let tolerance = total_weight * weighted.len() as f64 * f64::EPSILON;

    let mut cumulative = 0.0;
    for (value, weight) in &weighted {
        cumulative += weight;
        if cumulative + tolerance >= target_weight {
            return Ok(*value);
        }
    }

    // Rounding can leave the last cumulative sum a hair below the target.
    Ok(weighted[weighted.len() - 1].0)
}

/// Weighted median absolute deviation around `center`.
pub fn weighted_mad(values: &[f64], weights: &[f64], center: f64) -> Result<f64> {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    weighted_median(&deviations, weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lower_median(values: &[f64]) -> f64 {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted[(sorted.len() - 1) / 2]
    }

    #[test]
    fn test_heavy_weight_dominates() {
        let median = weighted_median(&[10.0, 20.0, 30.0], &[1.0, 1.0, 100.0]).unwrap();
        assert_eq!(median, 30.0);
    }

    #[test]
    fn test_single_value_ignores_weight() {
        assert_eq!(weighted_median(&[42.5], &[0.25]).unwrap(), 42.5);
        assert_eq!(weighted_median(&[42.5], &[1000.0]).unwrap(), 42.5);
    }

    #[test]
    fn test_exact_midpoint_takes_lower_value() {
        // Cumulative weight after 10.0 is exactly half of the total.
        assert_eq!(weighted_median(&[20.0, 10.0], &[1.0, 1.0]).unwrap(), 10.0);
        assert_eq!(weighted_median(&[1.0, 2.0, 3.0, 4.0], &[1.0, 1.0, 1.0, 1.0]).unwrap(), 2.0);
        assert_eq!(weighted_median(&[5.0, 7.0, 9.0], &[2.0, 1.0, 1.0]).unwrap(), 5.0);
    }

    #[test]
    fn test_slight_majority_is_not_a_tie() {
        assert_eq!(weighted_median(&[10.0, 20.0], &[1.0, 1.0 + 3e-12]).unwrap(), 20.0);
        assert_eq!(weighted_median(&[10.0, 20.0], &[1.0 + 3e-12, 1.0]).unwrap(), 10.0);
    }

    #[test]
    fn test_rounded_midpoint_takes_lower_value() {
        // 0.1 + 0.2 + 0.3 is not exactly half of the rounded six-term sum.
        let weights = [0.1, 0.2, 0.3, 0.3, 0.2, 0.1];
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(weighted_median(&values, &weights).unwrap(), 3.0);
    }

    #[test]
    fn test_unsorted_input() {
        let median = weighted_median(&[30.0, 10.0, 20.0], &[1.0, 1.0, 1.0]).unwrap();
        assert_eq!(median, 20.0);
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(matches!(weighted_median(&[], &[]), Err(Error::EmptySample)));
        assert!(matches!(
            weighted_median(&[1.0, 2.0], &[1.0]),
            Err(Error::LengthMismatch { values: 2, weights: 1 })
        ));
        assert!(matches!(
            weighted_median(&[1.0, 2.0], &[1.0, 0.0]),
            Err(Error::InvalidWeight { .. })
        ));
        assert!(matches!(
            weighted_median(&[1.0], &[-3.0]),
            Err(Error::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_mad_of_identical_quotes_is_zero() {
        let values = [100.0, 100.0, 100.0];
        let weights = [1.0, 2.0, 3.0];
        assert_eq!(weighted_mad(&values, &weights, 100.0).unwrap(), 0.0);
    }

    #[test]
    fn test_mad_spread() {
        let values = [98.0, 100.0, 103.0];
        let weights = [1.0, 1.0, 1.0];
        // Deviations 2, 0, 3 -> median 2
        assert_eq!(weighted_mad(&values, &weights, 100.0).unwrap(), 2.0);
    }

    proptest! {
        #[test]
        fn prop_equal_weights_match_lower_median(
            values in prop::collection::vec(-1.0e6f64..1.0e6, 1..40),
            weight in 0.1f64..50.0,
        ) {
            let weights = vec![weight; values.len()];
            prop_assert_eq!(weighted_median(&values, &weights).unwrap(), lower_median(&values));
        }

        #[test]
        fn prop_equal_weights_odd_sample_match_median(
            values in prop::collection::vec(-1.0e6f64..1.0e6, 1..20),
            weight in 1u32..50,
        ) {
            let mut values = values;
            if values.len() % 2 == 0 {
                values.pop();
            }
            prop_assume!(!values.is_empty());
            let weights = vec![weight as f64; values.len()];
            let mut sorted = values.clone();
            sorted.sort_by(|a, b| a.total_cmp(b));
            prop_assert_eq!(weighted_median(&values, &weights).unwrap(), sorted[sorted.len() / 2]);
        }

        #[test]
        fn prop_median_is_one_of_the_values(
            sample in prop::collection::vec((-1.0e6f64..1.0e6, 0.01f64..100.0), 1..40),
        ) {
            let (values, weights): (Vec<f64>, Vec<f64>) = sample.into_iter().unzip();
            let median = weighted_median(&values, &weights).unwrap();
            prop_assert!(values.contains(&median));
        }
    }
}
