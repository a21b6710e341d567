//! Problem definition for equilibrium solving.

use crate::error::{SolverError, SolverResult};
use cm_core::{ComponentId, Phase, SpeciesId, ensure_finite};

/// A conserved component of the problem.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentTerm {
    pub name: String,
    pub phase: Phase,
    /// Total concentration: mol/l for aqueous components, fraction of sites
    /// for mineral components.
    pub total: f64,
    /// Fixed activity (None = free variable). The solvent is always fixed.
    pub fixed_activity: Option<f64>,
}

impl ComponentTerm {
    pub fn is_free(&self) -> bool {
        self.fixed_activity.is_none() && self.phase != Phase::Solvent
    }
}

/// A species expressed in terms of the components.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesTerm {
    pub name: String,
    pub phase: Phase,
    /// Natural log of the formation constant from the components.
    pub ln_k: f64,
    /// Stoichiometric coefficient of each component (indexed like the components).
    pub stoichiometry: Vec<f64>,
}

/// Equilibrium speciation problem.
///
/// The species of each component is stored as a species with identity
/// stoichiometry and `ln_k = 0`, so every mass balance reads
/// `Σ_S ν_cS · q_S = T_c` over the species list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquilibriumProblem {
    pub components: Vec<ComponentTerm>,
    pub species: Vec<SpeciesTerm>,
    /// Species index of each component's own species.
    pub component_species: Vec<usize>,
    /// Quantity of surface sites (mol/l), required by mineral entities.
    pub sites_quantity: Option<f64>,
}

impl EquilibriumProblem {
    pub fn new(sites_quantity: Option<f64>) -> Self {
        Self {
            sites_quantity,
            ..Self::default()
        }
    }

    /// Add a component and its own species, returning the component ID.
    pub fn add_component(
        &mut self,
        name: impl Into<String>,
        phase: Phase,
        total: f64,
    ) -> SolverResult<ComponentId> {
        let name = name.into();
        if self.components.iter().any(|c| c.name == name) {
            return Err(SolverError::ProblemSetup {
                what: format!("Component {} already exists", name),
            });
        }
        let id = ComponentId::from_position(self.components.len()).ok_or_else(|| {
            SolverError::ProblemSetup {
                what: "too many components".to_string(),
            }
        })?;

        // Existing species do not contain the new component
        for species in &mut self.species {
            species.stoichiometry.push(0.0);
        }

        self.components.push(ComponentTerm {
            name: name.clone(),
            phase,
            total,
            fixed_activity: None,
        });

        let mut stoichiometry = vec![0.0; self.components.len()];
        stoichiometry[id.position()] = 1.0;
        self.component_species.push(self.species.len());
        self.species.push(SpeciesTerm {
            name,
            phase,
            ln_k: 0.0,
            stoichiometry,
        });

        Ok(id)
    }

    /// Add a species formed from the components.
    pub fn add_species(
        &mut self,
        name: impl Into<String>,
        phase: Phase,
        ln_k: f64,
        stoichiometry: Vec<f64>,
    ) -> SolverResult<SpeciesId> {
        let name = name.into();
        if stoichiometry.len() != self.components.len() {
            return Err(SolverError::ProblemSetup {
                what: format!(
                    "Species {} stoichiometry length mismatch: {} != {}",
                    name,
                    stoichiometry.len(),
                    self.components.len()
                ),
            });
        }
        if self.species.iter().any(|s| s.name == name) {
            return Err(SolverError::ProblemSetup {
                what: format!("Species {} already exists", name),
            });
        }
        let id = SpeciesId::from_position(self.species.len()).ok_or_else(|| {
            SolverError::ProblemSetup {
                what: "too many species".to_string(),
            }
        })?;
        self.species.push(SpeciesTerm {
            name,
            phase,
            ln_k,
            stoichiometry,
        });
        Ok(id)
    }

    /// Fix the activity of a component, removing it from the unknowns.
    pub fn fix_activity(&mut self, component: ComponentId, activity: f64) -> SolverResult<()> {
        ensure_finite(activity, "fixed activity")?;
        if activity <= 0.0 {
            return Err(SolverError::ProblemSetup {
                what: format!("Fixed activity must be positive, got {}", activity),
            });
        }
        self.component_mut(component)?.fixed_activity = Some(activity);
        Ok(())
    }

    /// Set the total concentration of a component.
    pub fn set_total(&mut self, component: ComponentId, total: f64) -> SolverResult<()> {
        ensure_finite(total, "total concentration")?;
        self.component_mut(component)?.total = total;
        Ok(())
    }

    pub fn component_id(&self, name: &str) -> Option<ComponentId> {
        self.components
            .iter()
            .position(|c| c.name == name)
            .and_then(ComponentId::from_position)
    }

    pub fn species_id(&self, name: &str) -> Option<SpeciesId> {
        self.species
            .iter()
            .position(|s| s.name == name)
            .and_then(SpeciesId::from_position)
    }

    fn component_mut(&mut self, component: ComponentId) -> SolverResult<&mut ComponentTerm> {
        let len = self.components.len();
        self.components
            .get_mut(component.position())
            .ok_or_else(|| {
                cm_core::CoreError::IndexOob {
                    what: "component",
                    index: component.position(),
                    len,
                }
                .into()
            })
    }

    /// Validate problem setup.
    pub fn validate(&self) -> SolverResult<()> {
        let n = self.components.len();

        if self.component_species.len() != n {
            return Err(SolverError::ProblemSetup {
                what: format!(
                    "component_species length mismatch: {} != {}",
                    self.component_species.len(),
                    n
                ),
            });
        }

        if let Some(sites) = self.sites_quantity {
            ensure_finite(sites, "sites quantity")?;
            if sites <= 0.0 {
                return Err(SolverError::ProblemSetup {
                    what: format!("Sites quantity must be positive, got {}", sites),
                });
            }
        }

        for component in &self.components {
            ensure_finite(component.total, "total concentration")?;
            if component.phase == Phase::Mineral && self.sites_quantity.is_none() {
                return Err(SolverError::ProblemSetup {
                    what: format!(
                        "Mineral component {} requires a sites quantity",
                        component.name
                    ),
                });
            }
        }

        for species in &self.species {
            if species.stoichiometry.len() != n {
                return Err(SolverError::ProblemSetup {
                    what: format!(
                        "Species {} stoichiometry length mismatch: {} != {}",
                        species.name,
                        species.stoichiometry.len(),
                        n
                    ),
                });
            }
            ensure_finite(species.ln_k, "ln K")?;
            for &nu in &species.stoichiometry {
                ensure_finite(nu, "stoichiometric coefficient")?;
            }
            if species.phase == Phase::Mineral && self.sites_quantity.is_none() {
                return Err(SolverError::ProblemSetup {
                    what: format!(
                        "Mineral species {} requires a sites quantity",
                        species.name
                    ),
                });
            }
        }

        Ok(())
    }

    /// Indices of the components whose activity is unknown.
    pub fn free_components(&self) -> Vec<usize> {
        self.components
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_free())
            .map(|(i, _)| i)
            .collect()
    }

    /// Get the number of free variables (unknowns).
    pub fn num_free_vars(&self) -> usize {
        self.components.iter().filter(|c| c.is_free()).count()
    }

    /// Converts an activity of the given phase into mol/l.
    ///
    /// The solvent does not take part in mass balances.
    pub fn quantity_weight(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Aqueous => 1.0,
            Phase::Mineral => self.sites_quantity.unwrap_or(0.0),
            Phase::Solvent => 0.0,
        }
    }

    /// Total of a component in mol/l.
    pub fn total_quantity(&self, component: usize) -> f64 {
        let c = &self.components[component];
        c.total * self.quantity_weight(c.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_get_identity_species() {
        let mut problem = EquilibriumProblem::new(None);
        let p = problem.add_component("PO4-3", Phase::Aqueous, 0.1).unwrap();
        problem
            .add_species("H4PO3", Phase::Aqueous, 1.0, vec![1.0])
            .unwrap();
        let h = problem.add_component("H+", Phase::Aqueous, 0.0).unwrap();

        assert_eq!(p.position(), 0);
        assert_eq!(h.position(), 1);
        assert_eq!(problem.species.len(), 3);
        // Species added before H+ were widened with a zero coefficient
        assert_eq!(problem.species[1].stoichiometry, vec![1.0, 0.0]);
        assert_eq!(problem.species[2].stoichiometry, vec![0.0, 1.0]);
        assert_eq!(problem.component_species, vec![0, 2]);
        problem.validate().unwrap();
    }

    #[test]
    fn duplicate_component_rejected() {
        let mut problem = EquilibriumProblem::new(None);
        problem.add_component("Na+", Phase::Aqueous, 0.1).unwrap();
        assert!(problem.add_component("Na+", Phase::Aqueous, 0.2).is_err());
    }

    #[test]
    fn fixed_and_solvent_components_are_not_free() {
        let mut problem = EquilibriumProblem::new(None);
        problem.add_component("H2O", Phase::Solvent, 1.0).unwrap();
        let h = problem.add_component("H+", Phase::Aqueous, 0.0).unwrap();
        problem.add_component("Cl-", Phase::Aqueous, 0.1).unwrap();
        problem.fix_activity(h, 1e-7).unwrap();

        assert_eq!(problem.free_components(), vec![2]);
        assert_eq!(problem.num_free_vars(), 1);
        assert!(problem.fix_activity(h, 0.0).is_err());
    }

    #[test]
    fn mineral_requires_sites() {
        let mut problem = EquilibriumProblem::new(None);
        problem.add_component("=SOH", Phase::Mineral, 1.0).unwrap();
        assert!(problem.validate().is_err());

        problem.sites_quantity = Some(8e-5);
        problem.validate().unwrap();
        assert!((problem.total_quantity(0) - 8e-5).abs() < 1e-20);
    }

    #[test]
    fn stoichiometry_length_checked() {
        let mut problem = EquilibriumProblem::new(None);
        problem.add_component("A", Phase::Aqueous, 1.0).unwrap();
        let err = problem
            .add_species("AB", Phase::Aqueous, 0.0, vec![1.0, 1.0])
            .unwrap_err();
        assert!(matches!(err, SolverError::ProblemSetup { .. }));
    }
}
