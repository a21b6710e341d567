//! Chemical components and the solvent.

use crate::entity::ChemicalEntity;
use crate::species::ChemicalSpecies;
use cm_core::Phase;

/// A canonical entity from which other species are produced by reactions.
///
/// The total concentration is the conserved quantity: the concentration of
/// the component's own species plus its share in every species built from
/// it. Solving an equilibrium dispatches the total among those species, so
/// at equilibrium the species concentration generally differs from the total.
///
/// By convention the component is named after its species.
#[derive(Debug, Clone, PartialEq)]
pub struct ChemicalComponent {
    species: ChemicalSpecies,
    total_concentration: f64,
}

impl ChemicalComponent {
    pub fn new(species: ChemicalSpecies, total_concentration: f64) -> Self {
        Self {
            species,
            total_concentration,
        }
    }

    /// Create a component together with its species.
    ///
    /// The species starts with a concentration equal to the total.
    pub fn from_name(name: impl Into<String>, phase: Phase, total_concentration: f64) -> Self {
        Self::new(
            ChemicalSpecies::with_concentration(name, phase, total_concentration),
            total_concentration,
        )
    }

    pub fn species(&self) -> &ChemicalSpecies {
        &self.species
    }

    pub fn species_mut(&mut self) -> &mut ChemicalSpecies {
        &mut self.species
    }

    pub fn total_concentration(&self) -> f64 {
        self.total_concentration
    }

    /// Overwrite the stored total.
    ///
    /// A chemical system owning this component must be told through its own
    /// `set_total_concentration` so that the next solve sees the new value.
    pub fn set_total_concentration(&mut self, total_concentration: f64) {
        self.total_concentration = total_concentration;
    }
}

impl ChemicalEntity for ChemicalComponent {
    fn name(&self) -> &str {
        self.species.name()
    }

    fn phase(&self) -> Phase {
        self.species.phase()
    }
}

/// The solvent of a chemical system (typically H2O), with unit activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solvent {
    name: String,
}

impl Solvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ChemicalEntity for Solvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn phase(&self) -> Phase {
        Phase::Solvent
    }
}

impl From<Solvent> for ChemicalComponent {
    fn from(solvent: Solvent) -> Self {
        ChemicalComponent::from_name(solvent.name, Phase::Solvent, 1.0)
    }
}
