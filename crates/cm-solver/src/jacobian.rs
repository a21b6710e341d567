//! Finite difference Jacobians of the mass-balance residual.
//!
//! The unknowns are natural log activities of the free components, so a step
//! in `x[j]` scales the activity of component `j` and of every species it
//! forms. Selected through [`JacobianMode`](crate::JacobianMode) to
//! cross-check [`analytic_jacobian`](crate::equilibrium::analytic_jacobian).

use crate::error::SolverResult;
use nalgebra::{DMatrix, DVector};

/// Forward differences: column j is `(f(x + dx e_j) - f(x)) / dx`.
///
/// The step is relative to `|x[j]|`, floored at `epsilon` for log activities
/// near zero.
pub fn finite_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> SolverResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let n = x.len();
    let f_x = f(x)?;
    let m = f_x.len();

    let mut jac = DMatrix::zeros(m, n);

    for j in 0..n {
        let mut x_perturbed = x.clone();
        let dx = epsilon * x[j].abs().max(1.0);
        x_perturbed[j] += dx;

        let f_perturbed = f(&x_perturbed)?;
        jac.set_column(j, &((f_perturbed - &f_x) / dx));
    }

    Ok(jac)
}

/// Compute Jacobian using central finite differences (more accurate but 2x cost).
pub fn central_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> SolverResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let n = x.len();
    let m = f(x)?.len();

    let mut jac = DMatrix::zeros(m, n);

    for j in 0..n {
        let dx = epsilon * x[j].abs().max(1.0);

        let mut x_plus = x.clone();
        x_plus[j] += dx;
        let f_plus = f(&x_plus)?;

        let mut x_minus = x.clone();
        x_minus[j] -= dx;
        let f_minus = f(&x_minus)?;

        jac.set_column(j, &((f_plus - f_minus) / (2.0 * dx)));
    }

    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jacobian_linear() {
        // f(x) = 2*x, J = 2
        let f = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, 2.0 * x[0]))
        };

        let x = DVector::from_element(1, 3.0);
        let jac = finite_difference_jacobian(&x, f, 1e-7).unwrap();

        assert!((jac[(0, 0)] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn jacobian_exponential_central() {
        // f(x) = exp(x), J = exp(x)
        let f = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0].exp()))
        };

        let x = DVector::from_element(1, -2.0);
        let jac = central_difference_jacobian(&x, f, 1e-5).unwrap();

        assert!((jac[(0, 0)] - (-2.0f64).exp()).abs() < 1e-8);
    }

    #[test]
    fn jacobian_rectangular_shape() {
        let f = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_vec(vec![x[0] + x[1], x[0] * x[1], x[1]]))
        };

        let x = DVector::from_vec(vec![1.0, 2.0]);
        let jac = finite_difference_jacobian(&x, f, 1e-7).unwrap();

        assert_eq!(jac.shape(), (3, 2));
        assert!((jac[(1, 0)] - 2.0).abs() < 1e-5);
        assert!((jac[(1, 1)] - 1.0).abs() < 1e-5);
    }
}
