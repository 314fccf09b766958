/*!

L2-regularized binary logistic regression over a fixed number of features, fit by Newton's method
(iteratively reweighted least squares).

The objective is the penalized negative log-likelihood used by most libraries,

```text
    sum_i logloss(y_i, sigmoid(b + w . x_i)) + penalty / 2 * |w|^2
```

with the intercept `b` left unpenalized. With `penalty > 0` the Hessian of the weights block is
positive definite, so each Newton step is a small dense solve.

*/

use crate::error::CampusError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Numerically stable logistic function.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct FitOptions {
    /// Inverse of `C`; strength of the L2 penalty on the weights.
    pub penalty: f64,
    /// Stop once no coefficient moves by more than this in one step.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            penalty: 1.0,
            tolerance: 1e-4,
            max_iterations: 100,
        }
    }
}

/// A fitted model. Immutable once returned from [`LogisticRegression::fit`].
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct LogisticRegression<const N: usize> {
    pub intercept: f64,
    #[serde(with = "coefficients")]
    pub coefficients: [f64; N],
    pub iterations: usize,
    pub converged: bool,
}

impl<const N: usize> LogisticRegression<N> {
    /// Fits the model to `samples` with boolean `labels`.
    ///
    /// The caller is responsible for making sure both classes are present;
    /// without them the maximum likelihood intercept diverges.
    pub fn fit(samples: &[[f64; N]], labels: &[bool], options: &FitOptions) -> Result<Self, CampusError> {
        if samples.len() != labels.len() {
            return Err(CampusError::ModelFit(format!(
                "{} samples but {} labels",
                samples.len(),
                labels.len()
            )));
        }

        // beta[0] is the intercept, beta[1..] the weights.
        let mut beta = vec![0.0; N + 1];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < options.max_iterations {
            iterations += 1;
            let mut gradient = vec![0.0; N + 1];
            let mut hessian = vec![vec![0.0; N + 1]; N + 1];

            for (x, &y) in samples.iter().zip(labels) {
                let row = design_row(x);
                let p = sigmoid(dot(&beta, &row));
                let residual = p - if y { 1.0 } else { 0.0 };
                let weight = p * (1.0 - p);
                for j in 0..=N {
                    gradient[j] += residual * row[j];
                    for k in 0..=N {
                        hessian[j][k] += weight * row[j] * row[k];
                    }
                }
            }
            for j in 1..=N {
                gradient[j] += options.penalty * beta[j];
                hessian[j][j] += options.penalty;
            }

            let step = solve(hessian, gradient).ok_or_else(|| {
                CampusError::ModelFit(format!("singular Newton system at iteration {iterations}"))
            })?;

            let mut largest_move: f64 = 0.0;
            for (b, s) in beta.iter_mut().zip(&step) {
                *b -= s;
                largest_move = largest_move.max(s.abs());
            }
            if !beta.iter().all(|b| b.is_finite()) {
                return Err(CampusError::ModelFit(format!(
                    "coefficients diverged at iteration {iterations}"
                )));
            }
            debug!("newton iteration {iterations}: largest coefficient change {largest_move:.3e}");

            if largest_move < options.tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                "logistic regression did not converge within {} iterations",
                options.max_iterations
            );
        }

        let mut coefficients = [0.0; N];
        coefficients.copy_from_slice(&beta[1..]);
        Ok(LogisticRegression {
            intercept: beta[0],
            coefficients,
            iterations,
            converged,
        })
    }

    /// The linear score `b + w . x`.
    #[must_use]
    pub fn decision_function(&self, x: &[f64; N]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(x)
                .map(|(w, v)| w * v)
                .sum::<f64>()
    }

    /// Probability of the positive class.
    #[must_use]
    pub fn predict_proba(&self, x: &[f64; N]) -> f64 {
        sigmoid(self.decision_function(x))
    }
}

fn design_row<const N: usize>(x: &[f64; N]) -> Vec<f64> {
    let mut row = Vec::with_capacity(N + 1);
    row.push(1.0);
    row.extend_from_slice(x);
    row
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Solves `a * x = b` by Gaussian elimination with partial pivoting.
/// Returns `None` if `a` is (numerically) singular.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if !(a[pivot][col].abs() > 1e-12) {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

// serde only derives array impls up to length 32 and not for const generic lengths.
mod coefficients {
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(values: &[f64; N], serializer: S) -> Result<S::Ok, S::Error> {
        values.as_slice().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(deserializer: D) -> Result<[f64; N], D::Error> {
        let values = Vec::<f64>::deserialize(deserializer)?;
        let len = values.len();
        values
            .try_into()
            .map_err(|_| D::Error::custom(format!("expected {N} coefficients, got {len}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn sigmoid_values() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!((sigmoid(40.0) - 1.0).abs() < 1e-12);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(-800.0).is_finite());
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn solve_small_system() {
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let x = solve(a, vec![3.0, 5.0]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn solve_needs_pivoting() {
        let a = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let x = solve(a, vec![2.0, 3.0]).unwrap();
        assert_eq!(x, vec![3.0, 2.0]);
    }

    #[test]
    fn solve_singular() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(solve(a, vec![1.0, 2.0]).is_none());
    }

    #[test]
    fn recovers_known_coefficients() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut samples = Vec::new();
        let mut labels = Vec::new();
        for _ in 0..20_000 {
            let x = [rng.random_range(-2.0..2.0), rng.random_range(-2.0..2.0)];
            let p = sigmoid(-0.5 + 1.5 * x[0] - 1.0 * x[1]);
            samples.push(x);
            labels.push(rng.random_bool(p));
        }

        let model = LogisticRegression::fit(&samples, &labels, &FitOptions::default()).unwrap();
        assert!(model.converged);
        assert!((model.intercept + 0.5).abs() < 0.15, "{model:?}");
        assert!((model.coefficients[0] - 1.5).abs() < 0.15, "{model:?}");
        assert!((model.coefficients[1] + 1.0).abs() < 0.15, "{model:?}");
    }

    #[test]
    fn penalty_shrinks_weights() {
        let samples = [[0.0], [1.0], [2.0], [3.0], [0.5], [2.5]];
        let labels = [false, false, true, true, true, false];
        let light = LogisticRegression::fit(&samples, &labels, &FitOptions { penalty: 0.01, ..FitOptions::default() }).unwrap();
        let heavy = LogisticRegression::fit(&samples, &labels, &FitOptions { penalty: 10.0, ..FitOptions::default() }).unwrap();
        assert!(heavy.coefficients[0].abs() < light.coefficients[0].abs());
    }

    #[test]
    fn mismatched_lengths() {
        let result = LogisticRegression::fit(&[[1.0]], &[true, false], &FitOptions::default());
        assert!(matches!(result, Err(CampusError::ModelFit(_))));
    }

    #[test]
    fn coefficients_round_trip_through_json() {
        let model = LogisticRegression {
            intercept: -1.0,
            coefficients: [0.5, 2.0, -3.0],
            iterations: 4,
            converged: true,
        };
        let json = serde_json::to_string(&model).unwrap();
        let back: LogisticRegression<3> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }
}
