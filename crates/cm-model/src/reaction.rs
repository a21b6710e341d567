//! Equilibrium reactions.
//!
//! A reaction is a list of [`Reagent`]s with integer coefficients and an
//! equilibrium constant given as log K. Negative coefficients mark the
//! produced side, so the reaction quotient reads
//!
//! ```text
//! Q = Π a(reagent)^(-coefficient)
//! ```
//!
//! and the reaction is at equilibrium when `Q = 10^logK`.

use crate::entity::ChemicalEntity;
use cm_core::Phase;

/// A stoichiometric participant of a reaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reagent {
    name: String,
    coefficient: i32,
    phase: Phase,
}

impl Reagent {
    pub fn new(name: impl Into<String>, coefficient: i32, phase: Phase) -> Self {
        Self {
            name: name.into(),
            coefficient,
            phase,
        }
    }

    pub fn coefficient(&self) -> i32 {
        self.coefficient
    }

    pub fn set_coefficient(&mut self, coefficient: i32) {
        self.coefficient = coefficient;
    }
}

impl ChemicalEntity for Reagent {
    fn name(&self) -> &str {
        &self.name
    }

    fn phase(&self) -> Phase {
        self.phase
    }
}

/// Named equilibrium reaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    name: String,
    log_k: f64,
    reagents: Vec<Reagent>,
}

impl Reaction {
    pub fn new(name: impl Into<String>, log_k: f64) -> Self {
        Self {
            name: name.into(),
            log_k,
            reagents: Vec::new(),
        }
    }

    /// Builder-style reagent addition.
    pub fn with_reagent(mut self, name: impl Into<String>, coefficient: i32, phase: Phase) -> Self {
        self.reagents.push(Reagent::new(name, coefficient, phase));
        self
    }

    pub fn add_reagent(&mut self, reagent: Reagent) -> &mut Self {
        self.reagents.push(reagent);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log_k(&self) -> f64 {
        self.log_k
    }

    /// `K = 10^logK`
    pub fn equilibrium_constant(&self) -> f64 {
        10f64.powf(self.log_k)
    }

    pub fn reagents(&self) -> &[Reagent] {
        &self.reagents
    }

    /// Net coefficient of a reagent, summing repeated entries.
    pub fn coefficient_of(&self, name: &str) -> Option<i32> {
        self.reagents
            .iter()
            .filter(|r| r.name() == name)
            .map(Reagent::coefficient)
            .reduce(|a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h4po3() -> Reaction {
        Reaction::new("H4PO3", 13.192)
            .with_reagent("H4PO3", -1, Phase::Aqueous)
            .with_reagent("H+", 4, Phase::Aqueous)
            .with_reagent("PO4-3", 1, Phase::Aqueous)
    }

    #[test]
    fn builder_keeps_order() {
        let r = h4po3();
        let names: Vec<&str> = r.reagents().iter().map(|r| r.name()).collect();
        assert_eq!(names, ["H4PO3", "H+", "PO4-3"]);
        assert_eq!(r.log_k(), 13.192);
    }

    #[test]
    fn coefficient_lookup() {
        let mut r = h4po3();
        r.add_reagent(Reagent::new("H+", -1, Phase::Aqueous));
        assert_eq!(r.coefficient_of("H+"), Some(3));
        assert_eq!(r.coefficient_of("H4PO3"), Some(-1));
        assert_eq!(r.coefficient_of("OH-"), None);
    }

    #[test]
    fn equilibrium_constant_from_log() {
        let r = Reaction::new("w", -14.0);
        assert!((r.equilibrium_constant() - 1e-14).abs() < 1e-28);
    }
}
