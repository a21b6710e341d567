//! cm-system: the chemical system aggregate.
//!
//! A [`ChemicalSystem`] gathers components, species and reactions, compiles
//! them into an equilibrium problem on [`ChemicalSystem::set_up`] and keeps
//! the concentrations of every tracked species up to date after each
//! [`ChemicalSystem::solve`].

pub mod error;
mod setup;
pub mod system;

pub use cm_model::{
    ChemicalComponent, ChemicalEntity, ChemicalSpecies, Phase, Reaction, Reagent, Solvent,
};
pub use error::{ChemmisolError, ChemmisolResult};
pub use system::{ChemicalSystem, DEFAULT_H_COMPONENT, DEFAULT_MAX_ITERATIONS};
