//! Snapshots of solved systems.

use cm_results::{ComponentValue, EquilibriumRecord, ReactionValue, SpeciesValue};
use cm_system::{ChemicalEntity, ChemicalSystem};

use crate::error::{AppError, AppResult};

/// Record the equilibrium state of a solved system.
pub fn record_equilibrium(system: &ChemicalSystem) -> AppResult<EquilibriumRecord> {
    let solution = system
        .last_solution()
        .ok_or_else(|| AppError::InvalidInput("system has not been solved".to_string()))?;

    let species = system
        .components()
        .map(|c| c.species())
        .chain(system.tracked_species())
        .map(|s| SpeciesValue {
            name: s.name().to_string(),
            phase: s.phase(),
            concentration: s.concentration(),
        })
        .collect();

    let components = system
        .components()
        .map(|c| ComponentValue {
            name: c.name().to_string(),
            total_concentration: c.total_concentration(),
            fixed: system.is_fixed(c.name()),
        })
        .collect();

    let reactions = system
        .reactions()
        .iter()
        .map(|r| {
            Ok::<_, AppError>(ReactionValue {
                name: r.name().to_string(),
                log_k: r.log_k(),
                log_quotient: system.log_reaction_quotient(r.name())?,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(EquilibriumRecord {
        ph: system.ph(),
        iterations: solution.iterations,
        residual_norm: solution.residual_norm,
        species,
        components,
        reactions,
    })
}
