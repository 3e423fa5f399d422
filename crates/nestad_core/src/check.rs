//! Comparing automatic gradients against finite differences.

use crate::functional::{self, ScalarFunction};
use anyhow::{anyhow, bail, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Settings for [`check_gradient`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiniteDiffConfig {
    /// Step for the central differences.
    pub epsilon: f64,
    /// Largest accepted absolute difference per coordinate.
    pub error_tolerance: f64,
}

impl Default for FiniteDiffConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            error_tolerance: 1e-6,
        }
    }
}

/// Central-difference gradient, `(f(x + e) - f(x - e)) / 2e` per coordinate.
pub fn finite_diff_gradient<F: ScalarFunction>(f: &F, x: &[f64], epsilon: f64) -> Vec<f64> {
    let mut probe = x.to_vec();
    (0..x.len())
        .map(|i| {
            probe[i] = x[i] + epsilon;
            let up = f.apply(&probe);
            probe[i] = x[i] - epsilon;
            let down = f.apply(&probe);
            probe[i] = x[i];
            (up - down) / (2.0 * epsilon)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateCheck {
    pub index: usize,
    pub ad: f64,
    pub finite_diff: f64,
    pub error: f64,
}

/// Outcome of [`check_gradient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientCheck {
    pub value: f64,
    pub coordinates: Vec<CoordinateCheck>,
    pub num_failed: usize,
}

impl GradientCheck {
    pub fn passed(&self) -> bool {
        self.num_failed == 0
    }

    /// Turns a failed check into an error naming the worst coordinate.
    pub fn ensure(self) -> Result<Self> {
        if self.passed() {
            return Ok(self);
        }
        let worst = self
            .coordinates
            .iter()
            .max_by(|a, b| a.error.total_cmp(&b.error))
            .ok_or_else(|| anyhow!("Gradient check failed with no coordinates."))?;
        bail!(
            "Gradient check failed in {} of {} coordinates; worst is {} (ad = {}, finite diff = {}).",
            self.num_failed,
            self.coordinates.len(),
            worst.index,
            worst.ad,
            worst.finite_diff
        );
    }
}

/// Compares the reverse-mode gradient of `f` at `x` against central differences.
pub fn check_gradient<F: ScalarFunction>(
    f: &F,
    x: &[f64],
    config: &FiniteDiffConfig,
) -> Result<GradientCheck> {
    if !(config.epsilon > 0.0 && config.epsilon.is_finite()) {
        bail!("epsilon must be positive and finite.");
    }
    if !(config.error_tolerance >= 0.0) {
        bail!("error_tolerance must be non-negative.");
    }

    let (value, ad) = functional::gradient(f, x);
    if !value.is_finite() {
        bail!("Function value {} at the check point is not finite.", value);
    }
    let fd = finite_diff_gradient(f, x, config.epsilon);

    let coordinates: Vec<CoordinateCheck> = ad
        .iter()
        .zip(&fd)
        .enumerate()
        .map(|(index, (&ad, &finite_diff))| CoordinateCheck {
            index,
            ad,
            finite_diff,
            error: (ad - finite_diff).abs(),
        })
        .collect();

    let mut num_failed = 0;
    for c in &coordinates {
        // A NaN error fails too.
        if !(c.error <= config.error_tolerance) {
            num_failed += 1;
            warn!(
                "gradient mismatch at coordinate {}: ad = {}, finite diff = {}, error = {:e}",
                c.index, c.ad, c.finite_diff, c.error
            );
        }
    }
    debug!(
        "check_gradient: {} coordinates, {} failed",
        coordinates.len(),
        num_failed
    );

    Ok(GradientCheck {
        value,
        coordinates,
        num_failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Scalar;

    /// x^2 y + 3 y^2
    struct Poly;

    impl ScalarFunction for Poly {
        fn apply<S: Scalar>(&self, x: &[S]) -> S {
            x[0] * x[0] * x[1] + x[1] * x[1] * 3.0
        }
    }

    /// `x` at exactly 1.5 and `2x` everywhere else.
    struct Broken;

    impl ScalarFunction for Broken {
        fn apply<S: Scalar>(&self, x: &[S]) -> S {
            if x[0].value_of_rec() != 1.5 {
                x[0] * 2.0
            } else {
                x[0]
            }
        }
    }

    #[test]
    fn central_differences() {
        let fd = finite_diff_gradient(&Poly, &[5.0, 7.0], 1e-6);
        assert!((fd[0] - 70.0).abs() < 1e-5);
        assert!((fd[1] - 67.0).abs() < 1e-5);
    }

    #[test_log::test]
    fn matching_gradient_passes() {
        let check = check_gradient(&Poly, &[5.0, 7.0], &FiniteDiffConfig::default())
            .expect("valid configuration");
        assert_eq!(check.value, 322.0);
        assert_eq!(check.coordinates.len(), 2);
        assert!(check.passed());
        assert!(check.ensure().is_ok());
    }

    #[test_log::test]
    fn mismatching_gradient_is_reported() {
        let config = FiniteDiffConfig {
            epsilon: 1e-4,
            error_tolerance: 1e-3,
        };
        let check = check_gradient(&Broken, &[1.5], &config).expect("valid configuration");
        assert_eq!(check.num_failed, 1);
        assert!(!check.passed());
        let c = check.coordinates[0];
        assert_eq!(c.ad, 1.0);
        assert!((c.finite_diff - 2.0).abs() < 1e-9);

        let err = check.ensure().expect_err("failed check");
        assert!(err.to_string().contains("1 of 1"));
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let zero_step = FiniteDiffConfig {
            epsilon: 0.0,
            ..Default::default()
        };
        assert!(check_gradient(&Poly, &[1.0, 1.0], &zero_step).is_err());

        let negative = FiniteDiffConfig {
            error_tolerance: -1.0,
            ..Default::default()
        };
        assert!(check_gradient(&Poly, &[1.0, 1.0], &negative).is_err());
    }

    #[test]
    fn non_finite_value_is_rejected() {
        struct Log;
        impl ScalarFunction for Log {
            fn apply<S: Scalar>(&self, x: &[S]) -> S {
                x[0].ln()
            }
        }
        let err = check_gradient(&Log, &[0.0], &FiniteDiffConfig::default())
            .expect_err("log(0) is not finite");
        assert!(err.to_string().contains("not finite"));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = FiniteDiffConfig {
            epsilon: 1e-5,
            error_tolerance: 1e-4,
        };
        let json = serde_json::to_string(&config).expect("serialize");
        let back: FiniteDiffConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, config);

        let defaults: FiniteDiffConfig =
            serde_json::from_str(r#"{"epsilon":1e-6,"error_tolerance":1e-6}"#).expect("parse");
        assert_eq!(defaults, FiniteDiffConfig::default());
    }
}
