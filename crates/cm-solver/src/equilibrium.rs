//! Mass action and mass balance equations.

use crate::error::{SolverError, SolverResult};
use crate::problem::EquilibriumProblem;
use cm_core::{ComponentId, Phase, SpeciesId};
use nalgebra::{DMatrix, DVector};

/// Starting activity for free components without a positive total.
pub const DEFAULT_INITIAL_ACTIVITY: f64 = 1e-7;

/// Solution state of an equilibrium problem.
#[derive(Clone, Debug, PartialEq)]
pub struct EquilibriumSolution {
    /// Natural log activity of every component (fixed ones included)
    pub log_activities: Vec<f64>,
    /// Activity of every species
    pub activities: Vec<f64>,
    /// Total of every component recomputed from the species, in the
    /// component's own unit (mol/l or fraction of sites)
    pub totals: Vec<f64>,
    /// Residual norm at convergence
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
}

impl EquilibriumSolution {
    pub fn activity(&self, species: SpeciesId) -> f64 {
        self.activities[species.position()]
    }

    pub fn total(&self, component: ComponentId) -> f64 {
        self.totals[component.position()]
    }
}

/// Expand the unknown vector into log activities of all components.
pub(crate) fn unpack_log_activities(
    x: &DVector<f64>,
    problem: &EquilibriumProblem,
) -> SolverResult<Vec<f64>> {
    let mut log_activities = Vec::with_capacity(problem.components.len());
    let mut idx = 0;
    for component in &problem.components {
        let la = if component.phase == Phase::Solvent {
            0.0
        } else if let Some(fixed) = component.fixed_activity {
            fixed.ln()
        } else {
            let v = *x.get(idx).ok_or_else(|| SolverError::InvalidState {
                what: format!(
                    "Unknown vector too short: {} free components expected",
                    problem.num_free_vars()
                ),
            })?;
            idx += 1;
            v
        };
        log_activities.push(la);
    }
    Ok(log_activities)
}

/// Pack log activities of the free components into an unknown vector.
pub(crate) fn pack_log_activities(
    log_activities: &[f64],
    problem: &EquilibriumProblem,
) -> DVector<f64> {
    let free = problem.free_components();
    DVector::from_iterator(free.len(), free.iter().map(|&i| log_activities[i]))
}

/// Activity of every species from the component log activities.
///
/// `ln a_S = ln K_S + Σ_j ν_jS · ln a_j`, with a unit activity for the solvent.
pub fn species_activities(problem: &EquilibriumProblem, log_activities: &[f64]) -> Vec<f64> {
    problem
        .species
        .iter()
        .map(|s| {
            if s.phase == Phase::Solvent {
                return 1.0;
            }
            let ln_a = s.ln_k
                + s.stoichiometry
                    .iter()
                    .zip(log_activities)
                    .map(|(nu, la)| if *nu == 0.0 { 0.0 } else { nu * la })
                    .sum::<f64>();
            ln_a.exp()
        })
        .collect()
}

/// Quantity (mol/l) carried by every species.
pub fn species_quantities(problem: &EquilibriumProblem, activities: &[f64]) -> Vec<f64> {
    problem
        .species
        .iter()
        .zip(activities)
        .map(|(s, a)| problem.quantity_weight(s.phase) * a)
        .collect()
}

/// Component totals implied by the species quantities, in component units.
pub fn component_totals(problem: &EquilibriumProblem, quantities: &[f64]) -> Vec<f64> {
    problem
        .components
        .iter()
        .enumerate()
        .map(|(c, component)| {
            let weight = problem.quantity_weight(component.phase);
            if weight == 0.0 {
                return component.total;
            }
            let sum: f64 = problem
                .species
                .iter()
                .zip(quantities)
                .map(|(s, q)| s.stoichiometry[c] * q)
                .sum();
            sum / weight
        })
        .collect()
}

/// Normalisation applied to the mass balance of a component.
pub fn residual_scale(problem: &EquilibriumProblem, component: usize) -> f64 {
    let total = problem.total_quantity(component).abs();
    if total > 0.0 { total } else { 1.0 }
}

/// Compute residuals of the mass balances of the free components.
///
/// For each free component c:
/// `R_c = (Σ_S ν_cS · q_S - T_c) / scale_c`
pub fn compute_residuals(
    x: &DVector<f64>,
    problem: &EquilibriumProblem,
) -> SolverResult<DVector<f64>> {
    let log_activities = unpack_log_activities(x, problem)?;
    let activities = species_activities(problem, &log_activities);
    let quantities = species_quantities(problem, &activities);

    let free = problem.free_components();
    let mut residuals = DVector::zeros(free.len());
    for (row, &c) in free.iter().enumerate() {
        let sum: f64 = problem
            .species
            .iter()
            .zip(&quantities)
            .map(|(s, q)| s.stoichiometry[c] * q)
            .sum();
        residuals[row] = (sum - problem.total_quantity(c)) / residual_scale(problem, c);
    }

    Ok(residuals)
}

/// Analytic Jacobian of [`compute_residuals`] with respect to the free log activities.
///
/// `J_cj = Σ_S ν_cS · ν_jS · q_S / scale_c`
pub fn analytic_jacobian(
    x: &DVector<f64>,
    problem: &EquilibriumProblem,
) -> SolverResult<DMatrix<f64>> {
    let log_activities = unpack_log_activities(x, problem)?;
    let activities = species_activities(problem, &log_activities);
    let quantities = species_quantities(problem, &activities);

    let free = problem.free_components();
    let n = free.len();
    let mut jac = DMatrix::zeros(n, n);
    for (row, &c) in free.iter().enumerate() {
        let scale = residual_scale(problem, c);
        for (col, &j) in free.iter().enumerate() {
            let sum: f64 = problem
                .species
                .iter()
                .zip(&quantities)
                .map(|(s, q)| s.stoichiometry[c] * s.stoichiometry[j] * q)
                .sum();
            jac[(row, col)] = sum / scale;
        }
    }

    Ok(jac)
}

/// Initial guess: each free component holds its whole total.
pub fn initial_guess(problem: &EquilibriumProblem) -> DVector<f64> {
    let free = problem.free_components();
    DVector::from_iterator(
        free.len(),
        free.iter().map(|&c| {
            let total = problem.components[c].total;
            if total > 0.0 {
                total.ln()
            } else {
                DEFAULT_INITIAL_ACTIVITY.ln()
            }
        }),
    )
}

/// Build a full solution from converged unknowns.
pub(crate) fn build_solution(
    x: &DVector<f64>,
    problem: &EquilibriumProblem,
    residual_norm: f64,
    iterations: usize,
) -> SolverResult<EquilibriumSolution> {
    let log_activities = unpack_log_activities(x, problem)?;
    let activities = species_activities(problem, &log_activities);
    if let Some(i) = activities.iter().position(|a| !a.is_finite()) {
        return Err(SolverError::Numeric {
            what: format!("Non-finite activity for species {}", problem.species[i].name),
        });
    }
    let quantities = species_quantities(problem, &activities);
    let totals = component_totals(problem, &quantities);
    Ok(EquilibriumSolution {
        log_activities,
        activities,
        totals,
        residual_norm,
        iterations,
    })
}
