//! Chemical entities handled by a chemical system.
//!
//! Every entity carries a name and a [`Phase`]. Species hold a concentration,
//! components pair a species with the total concentration conserved by the
//! equilibrium solver, and reactions are lists of reagents with a log K.

pub mod component;
pub mod entity;
pub mod reaction;
pub mod species;

pub use cm_core::Phase;
pub use component::{ChemicalComponent, Solvent};
pub use entity::ChemicalEntity;
pub use reaction::{Reaction, Reagent};
pub use species::ChemicalSpecies;
