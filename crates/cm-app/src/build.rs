//! Construction of chemical systems from definitions.

use cm_core::Phase;
use cm_project::schema::{FixedActivityDef, SystemDef};
use cm_system::{
    ChemicalComponent, ChemicalSpecies, ChemicalSystem, DEFAULT_H_COMPONENT, Reaction, Solvent,
};

use crate::error::AppResult;

/// Build a chemical system from its definition.
pub fn build_system(def: &SystemDef) -> AppResult<ChemicalSystem> {
    build_system_with_ph(def, None)
}

/// Build a chemical system, replacing the pH of the definition when `ph`
/// is given.
///
/// The override applies to the component of the first fixed pH of the
/// definition, or to `H+` if the definition does not fix the pH.
pub fn build_system_with_ph(def: &SystemDef, ph: Option<f64>) -> AppResult<ChemicalSystem> {
    tracing::debug!(system = def.id.as_str(), ?ph, "Building system");
    let mut system = match &def.mineral {
        Some(mineral) => ChemicalSystem::with_mineral(
            mineral.solid_concentration_g_per_l,
            mineral.specific_surface_area_m2_per_g,
            mineral.site_concentration_mol_per_m2,
            mineral.surface_complex.clone(),
        )?,
        None => ChemicalSystem::new(),
    };
    if let Some(max_iterations) = def.max_iterations {
        system.set_max_iterations(max_iterations);
    }

    for component in &def.components {
        let component = match component.phase {
            Phase::Solvent => ChemicalComponent::from(Solvent::new(component.name.clone())),
            phase => ChemicalComponent::from_name(
                component.name.clone(),
                phase,
                component.total_concentration,
            ),
        };
        system.add_component(component)?;
    }

    for reaction in &def.reactions {
        let reaction = reaction
            .reagents
            .iter()
            .fold(Reaction::new(reaction.name.clone(), reaction.log_k), |r, reagent| {
                r.with_reagent(reagent.name.clone(), reagent.coefficient, reagent.phase)
            });
        system.add_reaction(reaction)?;
    }

    for species in &def.species {
        system.add_species(ChemicalSpecies::new(species.name.clone(), species.phase))?;
    }

    let mut ph_component = None;
    for fixed in &def.fixed {
        match fixed {
            FixedActivityDef::Ph { value, component } => {
                if ph_component.is_none() {
                    ph_component = Some(component.as_str());
                }
                if ph.is_none() {
                    system.fix_ph_in(*value, component)?;
                }
            }
            FixedActivityDef::Concentration { component, value } => {
                system.fix_concentration(component, *value)?;
            }
        }
    }
    if let Some(ph) = ph {
        system.fix_ph_in(ph, ph_component.unwrap_or(DEFAULT_H_COMPONENT))?;
    }

    Ok(system)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_project::schema::{ComponentDef, ReactionDef, ReagentDef};

    fn water() -> SystemDef {
        SystemDef {
            id: "water".to_string(),
            name: "Water".to_string(),
            mineral: None,
            components: vec![ComponentDef {
                name: "H2O".to_string(),
                phase: Phase::Solvent,
                total_concentration: 0.0,
            }],
            reactions: vec![ReactionDef {
                name: "OH-".to_string(),
                log_k: -14.0,
                reagents: vec![
                    ReagentDef {
                        name: "OH-".to_string(),
                        coefficient: -1,
                        phase: Phase::Aqueous,
                    },
                    ReagentDef {
                        name: "H+".to_string(),
                        coefficient: -1,
                        phase: Phase::Aqueous,
                    },
                ],
            }],
            species: vec![],
            fixed: vec![FixedActivityDef::Ph {
                value: 7.0,
                component: "H+".to_string(),
            }],
            max_iterations: Some(20),
            ph: None,
        }
    }

    #[test]
    fn definition_builds_and_solves() {
        let mut system = build_system(&water()).unwrap();
        assert_eq!(system.max_iterations(), 20);
        // Solvents always have a unit total
        assert_eq!(system.component("H2O").unwrap().total_concentration(), 1.0);
        system.solve().unwrap();
        let oh = system.concentration("OH-").unwrap();
        assert!((oh - 1e-7).abs() / 1e-7 < 1e-9);
    }

    #[test]
    fn ph_override_replaces_definition() {
        let system = build_system_with_ph(&water(), Some(9.0)).unwrap();
        let h = system.concentration("H+").unwrap();
        assert!((h - 1e-9).abs() / 1e-9 < 1e-12);
    }
}
