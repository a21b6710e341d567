//! Chemical species definitions.

use crate::entity::ChemicalEntity;
use cm_core::Phase;

/// A species living in a chemical system, associated to a concentration.
///
/// The interpretation of the concentration depends on the phase: mol/l for
/// aqueous species, fraction of surface sites for mineral species. The
/// solvent always has a unit activity.
#[derive(Debug, Clone, PartialEq)]
pub struct ChemicalSpecies {
    name: String,
    phase: Phase,
    concentration: f64,
}

impl ChemicalSpecies {
    /// Create a species with a zero initial concentration.
    pub fn new(name: impl Into<String>, phase: Phase) -> Self {
        Self::with_concentration(name, phase, 0.0)
    }

    pub fn with_concentration(name: impl Into<String>, phase: Phase, concentration: f64) -> Self {
        Self {
            name: name.into(),
            phase,
            concentration,
        }
    }

    pub fn concentration(&self) -> f64 {
        self.concentration
    }

    pub fn set_concentration(&mut self, concentration: f64) {
        self.concentration = concentration;
    }
}

impl ChemicalEntity for ChemicalSpecies {
    fn name(&self) -> &str {
        &self.name
    }

    fn phase(&self) -> Phase {
        self.phase
    }
}
