//! High-level solver interface.

use crate::equilibrium::{
    EquilibriumSolution, analytic_jacobian, build_solution, compute_residuals, initial_guess,
    pack_log_activities,
};
use crate::error::SolverResult;
use crate::jacobian::{central_difference_jacobian, finite_difference_jacobian};
use crate::newton::{NewtonConfig, NewtonProgress, newton_solve_with_progress};
use crate::problem::EquilibriumProblem;
use nalgebra::{DMatrix, DVector};

/// How the Jacobian of the mass balances is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JacobianMode {
    #[default]
    Analytic,
    ForwardDifference,
    CentralDifference,
}

/// Equilibrium solver configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    pub newton: NewtonConfig,
    pub jacobian: JacobianMode,
    /// Relative perturbation for finite-difference Jacobians
    pub fd_epsilon: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            newton: NewtonConfig::default(),
            jacobian: JacobianMode::default(),
            fd_epsilon: 1e-7,
        }
    }
}

impl SolverConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.newton.max_iterations = max_iterations;
        self
    }
}

/// Progress events emitted while solving.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveProgressEvent {
    NewtonIteration {
        iteration: usize,
        max_iterations: usize,
        residual_norm: f64,
        step_length: f64,
    },
    Converged {
        iterations: usize,
        residual_norm: f64,
    },
}

/// Solve an equilibrium problem.
///
/// This function:
/// 1. Validates the problem setup
/// 2. Builds an initial guess (from the totals, or from a previous solution)
/// 3. Runs Newton's method on the mass balances of the free components
///
/// # Arguments
/// * `problem` - The equilibrium problem to solve
/// * `config` - Optional solver configuration
/// * `warm_start` - Optional previous solution of the same problem structure
pub fn solve(
    problem: &EquilibriumProblem,
    config: Option<SolverConfig>,
    warm_start: Option<&EquilibriumSolution>,
) -> SolverResult<EquilibriumSolution> {
    solve_internal(problem, config, warm_start, None)
}

/// Solve an equilibrium problem and stream progress events.
pub fn solve_with_progress(
    problem: &EquilibriumProblem,
    config: Option<SolverConfig>,
    warm_start: Option<&EquilibriumSolution>,
    progress: &mut dyn FnMut(SolveProgressEvent),
) -> SolverResult<EquilibriumSolution> {
    solve_internal(problem, config, warm_start, Some(progress))
}

fn solve_internal(
    problem: &EquilibriumProblem,
    config: Option<SolverConfig>,
    warm_start: Option<&EquilibriumSolution>,
    mut progress: Option<&mut dyn FnMut(SolveProgressEvent)>,
) -> SolverResult<EquilibriumSolution> {
    problem.validate()?;
    let cfg = config.unwrap_or_default();

    if problem.num_free_vars() == 0 {
        let solution = build_solution(&DVector::zeros(0), problem, 0.0, 0)?;
        emit_converged(&mut progress, &solution);
        return Ok(solution);
    }

    let x0 = match warm_start {
        Some(prev)
            if prev.log_activities.len() == problem.components.len()
                && prev.log_activities.iter().all(|v| v.is_finite()) =>
        {
            pack_log_activities(&prev.log_activities, problem)
        }
        _ => initial_guess(problem),
    };

    let residual_fn = |x: &DVector<f64>| compute_residuals(x, problem);
    let jacobian_fn = |x: &DVector<f64>| -> SolverResult<DMatrix<f64>> {
        match cfg.jacobian {
            JacobianMode::Analytic => analytic_jacobian(x, problem),
            JacobianMode::ForwardDifference => {
                finite_difference_jacobian(x, residual_fn, cfg.fd_epsilon)
            }
            JacobianMode::CentralDifference => {
                central_difference_jacobian(x, residual_fn, cfg.fd_epsilon)
            }
        }
    };

    let max_iterations = cfg.newton.max_iterations;
    let mut forward = |p: NewtonProgress| {
        if let Some(cb) = progress.as_deref_mut() {
            cb(SolveProgressEvent::NewtonIteration {
                iteration: p.iteration,
                max_iterations,
                residual_norm: p.residual_norm,
                step_length: p.step_length,
            });
        }
    };

    let result =
        newton_solve_with_progress(x0, residual_fn, jacobian_fn, &cfg.newton, Some(&mut forward))?;

    let solution = build_solution(&result.x, problem, result.residual_norm, result.iterations)?;
    emit_converged(&mut progress, &solution);
    Ok(solution)
}

fn emit_converged(
    progress: &mut Option<&mut dyn FnMut(SolveProgressEvent)>,
    solution: &EquilibriumSolution,
) {
    if let Some(cb) = progress.as_deref_mut() {
        cb(SolveProgressEvent::Converged {
            iterations: solution.iterations,
            residual_norm: solution.residual_norm,
        });
    }
}
