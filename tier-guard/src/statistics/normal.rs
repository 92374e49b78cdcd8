//! Normal distribution helpers over `statrs`.

use statrs::distribution::{ContinuousCDF, Normal};

/// Standard normal CDF.
pub fn cdf(z: f64) -> f64 {
    Normal::standard().cdf(z)
}

/// Normal CDF with the given mean and standard deviation.
///
/// A non-positive or non-finite standard deviation degenerates to a step at
/// the mean.
pub fn cdf_with(x: f64, mean: f64, std_dev: f64) -> f64 {
    match Normal::new(mean, std_dev) {
        Ok(dist) if std_dev > 0.0 => dist.cdf(x),
        _ => {
            if x < mean {
                0.0
            } else {
                1.0
            }
        }
    }
}

/// Two-tailed p-value of a standard normal statistic.
pub fn two_tailed_p(z: f64) -> f64 {
    (2.0 * Normal::standard().sf(z.abs())).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdf_reference_points() {
        assert!((cdf(0.0) - 0.5).abs() < 1e-12);
        assert!((cdf(1.96) - 0.975_002_104_851_78).abs() < 1e-10);
        assert!((cdf(-1.0) - 0.158_655_253_931_457).abs() < 1e-10);
        assert!(cdf(-10.0) > 0.0, "far tail must stay positive");
        assert!(cdf(-10.0) < 1e-20);
    }

    #[test]
    fn test_shifted_cdf_matches_standardized() {
        assert!((cdf_with(130.0, 100.0, 15.0) - cdf(2.0)).abs() < 1e-12);
        assert!((cdf_with(85.0, 100.0, 15.0) - cdf(-1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_two_tailed_p() {
        assert!((two_tailed_p(1.96) - 0.05).abs() < 1e-4);
        assert!((two_tailed_p(-1.96) - 0.05).abs() < 1e-4);
        assert!((two_tailed_p(0.0) - 1.0).abs() < 1e-12);
        // Survival function keeps precision where 1 - cdf would round to 0.
        assert!(two_tailed_p(9.0) > 0.0);
    }

    #[test]
    fn test_degenerate_std_dev() {
        assert_eq!(cdf_with(1.0, 2.0, 0.0), 0.0);
        assert_eq!(cdf_with(2.0, 2.0, 0.0), 1.0);
        assert_eq!(cdf_with(3.0, 2.0, -1.0), 1.0);
        assert_eq!(cdf_with(1.0, 2.0, f64::NAN), 0.0);
    }
}
