//! Ordinary least-squares utilities
//!
//! One pure regression routine backs every fit in the crate. Power laws are
//! fitted as straight lines in log-log space.

use crate::{FitCoefficients, Result, ScalingError};

/// Result of a straight-line least-squares fit `y = slope·x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Fit `y = slope·x + intercept` by ordinary least squares.
///
/// Uses centered sums so large offsets in `x` (e.g. ring counts in the
/// hundreds) do not cancel catastrophically.
pub fn linear_least_squares(x: &[f64], y: &[f64]) -> Result<LinearFit> {
    if x.len() != y.len() {
        return Err(ScalingError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(ScalingError::DegenerateFit(format!(
            "need at least 2 points, have {}",
            x.len()
        )));
    }

    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if sxx == 0.0 || !sxx.is_finite() {
        return Err(ScalingError::DegenerateFit(
            "x-values have zero variance".to_string(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    // Constant y is fitted exactly by a flat line
    let r_squared = if syy > 0.0 {
        let ss_res: f64 = x
            .iter()
            .zip(y)
            .map(|(xi, yi)| (yi - (slope * xi + intercept)).powi(2))
            .sum();
        1.0 - ss_res / syy
    } else {
        1.0
    };

    Ok(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

/// Fit `y = a·x^b` by linear regression on `(ln x, ln y)`.
///
/// Every input must be strictly positive; the first offending value is
/// reported with the series it came from.
pub fn power_law_fit(x: &[f64], y: &[f64]) -> Result<FitCoefficients> {
    let log_x = log_series("x", x)?;
    let log_y = log_series("y", y)?;
    let fit = linear_least_squares(&log_x, &log_y)?;
    Ok(FitCoefficients::power_law(fit.intercept.exp(), fit.slope).with_r_squared(fit.r_squared))
}

/// Linear regression packaged as a coefficient pair (a = slope, b = intercept)
pub fn linear_fit(x: &[f64], y: &[f64]) -> Result<FitCoefficients> {
    let fit = linear_least_squares(x, y)?;
    Ok(FitCoefficients::linear(fit.slope, fit.intercept).with_r_squared(fit.r_squared))
}

fn log_series(series: &'static str, values: &[f64]) -> Result<Vec<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            if value > 0.0 && value.is_finite() {
                Ok(value.ln())
            } else {
                Err(ScalingError::NonPositiveLogInput {
                    series,
                    index,
                    value,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FitKind;

    #[test]
    fn test_linear_regression_exact() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![2.0, 4.0, 6.0, 8.0, 10.0]; // y = 2x
        let fit = linear_least_squares(&x, &y).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!(fit.intercept.abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_regression_noisy() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![2.1, 3.9, 6.1, 7.9, 10.1];
        let fit = linear_least_squares(&x, &y).unwrap();
        assert!((fit.slope - 2.0).abs() < 0.1);
        assert!(fit.r_squared > 0.99);
    }

    #[test]
    fn test_constant_y() {
        let fit = linear_least_squares(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, 4.0);
        assert_eq!(fit.r_squared, 1.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(matches!(
            linear_least_squares(&[1.0], &[2.0]),
            Err(ScalingError::DegenerateFit(_))
        ));
        assert!(matches!(
            linear_least_squares(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]),
            Err(ScalingError::DegenerateFit(_))
        ));
        assert!(matches!(
            linear_least_squares(&[1.0, 2.0], &[1.0]),
            Err(ScalingError::LengthMismatch { x: 2, y: 1 })
        ));
    }

    #[test]
    fn test_power_law_exact() {
        let x: Vec<f64> = (1..=50).map(|i| f64::from(i) * 10.0).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0e-4 * v.powf(1.5)).collect();
        let fit = power_law_fit(&x, &y).unwrap();
        assert_eq!(fit.kind, FitKind::PowerLaw);
        assert!((fit.a - 3.0e-4).abs() / 3.0e-4 < 1e-9);
        assert!((fit.b - 1.5).abs() < 1e-12);
        assert!(fit.r_squared.unwrap() > 0.999_999);
    }

    #[test]
    fn test_power_law_rejects_non_positive() {
        let err = power_law_fit(&[1.0, 2.0, 3.0], &[1.0, 0.0, 2.0]).unwrap_err();
        match err {
            ScalingError::NonPositiveLogInput { series, index, value } => {
                assert_eq!(series, "y");
                assert_eq!(index, 1);
                assert_eq!(value, 0.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_large_offset_is_stable() {
        // Centered sums keep this exact despite the 1e9 offset
        let x: Vec<f64> = (0..100).map(|i| 1.0e9 + f64::from(i)).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.5 * (v - 1.0e9) + 7.0).collect();
        let fit = linear_least_squares(&x, &y).unwrap();
        assert!((fit.slope - 0.5).abs() < 1e-9);
    }
}
