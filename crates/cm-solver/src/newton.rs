//! Newton solver with line search and log-space step clamping.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};

/// Newton solver configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance for residual norm
    pub abs_tol: f64,
    /// Relative tolerance for residual norm (0 disables it)
    pub rel_tol: f64,
    /// Converged once the infinity norm of a full step falls below this
    pub step_tol: f64,
    /// Largest allowed change of any unknown in one iteration
    pub max_step: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            abs_tol: 1e-13,
            rel_tol: 0.0,
            step_tol: 1e-12,
            max_step: 4.0,
            line_search_beta: 0.5,
            max_line_search_iters: 40,
        }
    }
}

/// Snapshot reported after every accepted Newton step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonProgress {
    pub iteration: usize,
    pub residual_norm: f64,
    pub step_length: f64,
}

/// Newton iteration result.
#[derive(Debug, Clone)]
pub struct NewtonResult {
    /// Solution vector
    pub x: DVector<f64>,
    /// Final residual norm
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
    /// Converged flag
    pub converged: bool,
}

/// Newton solver with line search.
pub fn newton_solve<F, J>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    config: &NewtonConfig,
) -> SolverResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
    J: Fn(&DVector<f64>) -> SolverResult<DMatrix<f64>>,
{
    newton_solve_with_progress(x0, residual_fn, jacobian_fn, config, None)
}

/// Newton solver with line search, reporting each accepted step.
pub fn newton_solve_with_progress<F, J>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    config: &NewtonConfig,
    mut progress: Option<&mut dyn FnMut(NewtonProgress)>,
) -> SolverResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
    J: Fn(&DVector<f64>) -> SolverResult<DMatrix<f64>>,
{
    let mut x = x0;
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.norm();
    let r0_norm = r_norm;

    if !r_norm.is_finite() {
        return Err(SolverError::Numeric {
            what: format!("Non-finite residual at initial guess ({})", r_norm),
        });
    }

    for iter in 0..config.max_iterations {
        // Check convergence
        if r_norm <= config.abs_tol || r_norm <= config.rel_tol * r0_norm {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
                converged: true,
            });
        }

        let jac = jacobian_fn(&x)?;

        // Solve J * dx = -r
        let mut dx = jac
            .lu()
            .solve(&(-r.clone()))
            .ok_or_else(|| SolverError::Numeric {
                what: "Jacobian solve failed".to_string(),
            })?;

        if dx.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::Numeric {
                what: format!("Non-finite Newton step at iteration {}", iter),
            });
        }

        let dx_max = dx.amax();
        if dx_max > config.max_step {
            dx *= config.max_step / dx_max;
        } else if dx_max < config.step_tol {
            x += &dx;
            r = residual_fn(&x)?;
            return Ok(NewtonResult {
                x,
                residual_norm: r.norm(),
                iterations: iter + 1,
                converged: true,
            });
        }

        // Backtrack until the residual decreases
        let mut alpha = 1.0;
        let mut accepted = None;
        for _ in 0..config.max_line_search_iters {
            let x_new = &x + alpha * &dx;
            let r_new = residual_fn(&x_new)?;
            let r_new_norm = r_new.norm();
            if r_new_norm < r_norm {
                accepted = Some((x_new, r_new, r_new_norm));
                break;
            }
            alpha *= config.line_search_beta;
        }

        let Some((x_new, r_new, r_new_norm)) = accepted else {
            return Err(SolverError::ConvergenceFailed {
                what: format!(
                    "Line search stagnated at iteration {}, residual = {}",
                    iter, r_norm
                ),
            });
        };

        x = x_new;
        r = r_new;
        r_norm = r_new_norm;

        tracing::debug!(
            iteration = iter,
            residual_norm = r_norm,
            step_length = alpha,
            "newton iteration"
        );
        if let Some(cb) = progress.as_deref_mut() {
            cb(NewtonProgress {
                iteration: iter,
                residual_norm: r_norm,
                step_length: alpha,
            });
        }
    }

    if r_norm <= config.abs_tol {
        return Ok(NewtonResult {
            x,
            residual_norm: r_norm,
            iterations: config.max_iterations,
            converged: true,
        });
    }

    Err(SolverError::ConvergenceFailed {
        what: format!(
            "Maximum iterations {} reached, residual = {}",
            config.max_iterations, r_norm
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_quadratic() {
        // Solve x^2 - 4 = 0, x > 0
        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0] - 4.0))
        };
        let jacobian = |x: &DVector<f64>| -> SolverResult<DMatrix<f64>> {
            Ok(DMatrix::from_element(1, 1, 2.0 * x[0]))
        };

        let x0 = DVector::from_element(1, 3.0);
        let config = NewtonConfig::default();
        let result = newton_solve(x0, residual, jacobian, &config).unwrap();

        assert!(result.converged);
        assert!((result.x[0] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn exponential_in_log_space_converges() {
        // exp(x) - 1e-30 = 0 from x = 0: needs ~69 units of travel.
        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0].exp() / 1e-30 - 1.0))
        };
        let jacobian = |x: &DVector<f64>| -> SolverResult<DMatrix<f64>> {
            Ok(DMatrix::from_element(1, 1, x[0].exp() / 1e-30))
        };

        let mut steps = Vec::new();
        let mut record = |p: NewtonProgress| steps.push(p);
        let result = newton_solve_with_progress(
            DVector::from_element(1, 0.0),
            residual,
            jacobian,
            &NewtonConfig::default(),
            Some(&mut record),
        )
        .unwrap();

        assert!((result.x[0] - (1e-30f64).ln()).abs() < 1e-9);
        assert!(steps.len() <= result.iterations);
        assert!(steps.windows(2).all(|w| w[1].residual_norm < w[0].residual_norm));
    }

    #[test]
    fn max_iterations_reported() {
        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0] - 4.0))
        };
        let jacobian = |x: &DVector<f64>| -> SolverResult<DMatrix<f64>> {
            Ok(DMatrix::from_element(1, 1, 2.0 * x[0]))
        };
        let config = NewtonConfig {
            max_iterations: 1,
            ..NewtonConfig::default()
        };

        let err = newton_solve(DVector::from_element(1, 30.0), residual, jacobian, &config)
            .unwrap_err();
        assert!(matches!(err, SolverError::ConvergenceFailed { .. }));
    }

    #[test]
    fn singular_jacobian_is_numeric_error() {
        let residual = |_: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, 1.0))
        };
        let jacobian =
            |_: &DVector<f64>| -> SolverResult<DMatrix<f64>> { Ok(DMatrix::zeros(1, 1)) };

        let err = newton_solve(
            DVector::from_element(1, 0.0),
            residual,
            jacobian,
            &NewtonConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SolverError::Numeric { .. }));
    }
}
