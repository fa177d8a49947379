//! Mean and standard deviation over plain slices.

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n − 1 denominator).
///
/// Returns 0.0 for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;

    if n <= 1.0 {
        return 0.0;
    }

    let mean = mean(values).unwrap_or(0.0);
    let variance: f64 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);

    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0, 9.0]), Some(5.0));
    }

    #[test]
    fn test_sample_std() {
        // Variance 32 / 4
        let values = [2.0, 4.0, 4.0, 4.0, 6.0];
        assert!((sample_std(&values) - 8.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_sample_std_small_inputs() {
        assert_eq!(sample_std(&[]), 0.0);
        assert_eq!(sample_std(&[42.0]), 0.0);
        assert_eq!(sample_std(&[3.0, 3.0, 3.0]), 0.0);
    }
}
