//! Compilation of components and reactions into an equilibrium problem.

use crate::error::{ChemmisolError, ChemmisolResult};
use cm_model::{ChemicalComponent, ChemicalEntity, Phase, Reaction, Reagent};
use cm_solver::EquilibriumProblem;
use std::collections::HashMap;
use std::f64::consts::LN_10;

/// A produced species extracted from a reaction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProducedSpecies {
    pub name: String,
    pub phase: Phase,
    pub reaction: String,
}

/// Result of a system set-up.
#[derive(Debug, Clone)]
pub(crate) struct CompiledSystem {
    pub problem: EquilibriumProblem,
    pub produced: Vec<ProducedSpecies>,
}

impl CompiledSystem {
    pub fn species_position(&self, name: &str) -> Option<usize> {
        self.problem.species_id(name).map(|id| id.position())
    }
}

/// A component entry as seen by the compiler.
pub(crate) struct ComponentInput<'a> {
    pub component: &'a ChemicalComponent,
    pub fixed_activity: Option<f64>,
}

pub(crate) fn compile<'a>(
    components: impl IntoIterator<Item = ComponentInput<'a>>,
    reactions: &[Reaction],
    tracked: &[&str],
    sites_quantity: Option<f64>,
) -> ChemmisolResult<CompiledSystem> {
    let mut problem = EquilibriumProblem::new(sites_quantity);

    for input in components {
        let component = input.component;
        if component.phase() == Phase::Mineral && sites_quantity.is_none() {
            return Err(ChemmisolError::InvalidMineralSpeciesWithUndefinedSitesCount {
                species: component.name().to_string(),
            });
        }
        let id = problem.add_component(
            component.name(),
            component.phase(),
            component.total_concentration(),
        )?;
        if component.phase() != Phase::Solvent
            && let Some(activity) = input.fixed_activity
        {
            problem.fix_activity(id, activity)?;
        }
    }

    let mut producers: HashMap<String, String> = HashMap::new();
    let mut produced = Vec::with_capacity(reactions.len());
    for reaction in reactions {
        let species = produced_species(reaction, &problem)?;

        if species.phase == Phase::Solvent {
            return Err(ChemmisolError::SolventProducedSpecies {
                species: species.name,
                reaction: reaction.name().to_string(),
            });
        }
        if species.phase == Phase::Mineral && sites_quantity.is_none() {
            return Err(ChemmisolError::InvalidMineralSpeciesWithUndefinedSitesCount {
                species: species.name,
            });
        }
        if let Some(first) = producers.get(&species.name) {
            return Err(ChemmisolError::SpeciesProducedTwice {
                species: species.name,
                first: first.clone(),
                second: reaction.name().to_string(),
            });
        }

        let (ln_k, stoichiometry) = mass_action(reaction, &species.name, &problem)?;
        tracing::debug!(
            reaction = reaction.name(),
            species = species.name.as_str(),
            ln_k,
            "Compiled reaction"
        );
        problem.add_species(species.name.clone(), species.phase, ln_k, stoichiometry)?;
        producers.insert(species.name.clone(), reaction.name().to_string());
        produced.push(species);
    }

    for &name in tracked {
        if problem.species_id(name).is_none() {
            return Err(ChemmisolError::UntrackedSpecies {
                species: name.to_string(),
            });
        }
    }

    problem.validate()?;
    Ok(CompiledSystem { problem, produced })
}

/// The single reagent of a reaction that is not a component.
fn produced_species(
    reaction: &Reaction,
    problem: &EquilibriumProblem,
) -> ChemmisolResult<ProducedSpecies> {
    let mut candidates: Vec<&Reagent> = Vec::new();
    for reagent in reaction.reagents() {
        if reagent.coefficient() == 0 {
            return Err(ChemmisolError::InvalidReagent {
                reaction: reaction.name().to_string(),
                reagent: reagent.name().to_string(),
                reason: "null coefficient".to_string(),
            });
        }
        if problem.component_id(reagent.name()).is_none()
            && !candidates.iter().any(|c| c.name() == reagent.name())
        {
            candidates.push(reagent);
        }
    }

    match candidates.as_slice() {
        [] => Err(ChemmisolError::MissingProducedSpeciesInReaction {
            reaction: reaction.name().to_string(),
        }),
        [single] => Ok(ProducedSpecies {
            name: single.name().to_string(),
            phase: single.phase(),
            reaction: reaction.name().to_string(),
        }),
        many => Err(ChemmisolError::TooManyProducedSpeciesInReaction {
            reaction: reaction.name().to_string(),
            species: many.iter().map(|r| r.name().to_string()).collect(),
        }),
    }
}

/// Formation constant and stoichiometry of the produced species.
///
/// With `Q = Π a_i^(-c_i)` and `Q = K` at equilibrium, the produced species
/// S satisfies `ln a_S = (ln K + Σ_j c_j ln a_j) / (-c_S)`.
fn mass_action(
    reaction: &Reaction,
    produced: &str,
    problem: &EquilibriumProblem,
) -> ChemmisolResult<(f64, Vec<f64>)> {
    let c_s = reaction.coefficient_of(produced).unwrap_or(0);
    if c_s == 0 {
        return Err(ChemmisolError::InvalidReagent {
            reaction: reaction.name().to_string(),
            reagent: produced.to_string(),
            reason: "coefficients cancel out".to_string(),
        });
    }
    let divisor = -f64::from(c_s);

    let mut stoichiometry = vec![0.0; problem.components.len()];
    for reagent in reaction.reagents() {
        if let Some(id) = problem.component_id(reagent.name()) {
            stoichiometry[id.position()] += f64::from(reagent.coefficient()) / divisor;
        }
    }
    Ok((reaction.log_k() * LN_10 / divisor, stoichiometry))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(components: &[ChemicalComponent]) -> Vec<ComponentInput<'_>> {
        components
            .iter()
            .map(|component| ComponentInput {
                component,
                fixed_activity: None,
            })
            .collect()
    }

    #[test]
    fn produced_species_stoichiometry() {
        let components = vec![
            ChemicalComponent::from_name("PO4-3", Phase::Aqueous, 0.1),
            ChemicalComponent::from_name("H+", Phase::Aqueous, 0.0),
        ];
        let reactions = vec![
            Reaction::new("H4PO3", 13.192)
                .with_reagent("H4PO3", -1, Phase::Aqueous)
                .with_reagent("H+", 4, Phase::Aqueous)
                .with_reagent("PO4-3", 1, Phase::Aqueous),
        ];
        let compiled = compile(inputs(&components), &reactions, &[], None).unwrap();

        let s = &compiled.problem.species[2];
        assert_eq!(s.name, "H4PO3");
        assert_eq!(s.stoichiometry, vec![1.0, 4.0]);
        assert!((s.ln_k - 13.192 * LN_10).abs() < 1e-12);
        assert_eq!(compiled.produced[0].reaction, "H4PO3");
    }

    #[test]
    fn produced_species_on_the_right_hand_side() {
        // Water autoprotolysis written with a positive produced coefficient
        let components = vec![ChemicalComponent::from_name("H+", Phase::Aqueous, 0.0)];
        let reactions = vec![
            Reaction::new("OH-", 28.0)
                .with_reagent("OH-", 2, Phase::Aqueous)
                .with_reagent("H+", 2, Phase::Aqueous),
        ];
        let compiled = compile(inputs(&components), &reactions, &[], None).unwrap();
        let s = &compiled.problem.species[1];
        assert_eq!(s.stoichiometry, vec![-1.0]);
        assert!((s.ln_k + 14.0 * LN_10).abs() < 1e-12);
    }

    #[test]
    fn repeated_produced_reagent_counts_once() {
        let components = vec![ChemicalComponent::from_name("A", Phase::Aqueous, 0.1)];
        let reactions = vec![
            Reaction::new("A2", 1.0)
                .with_reagent("A2", -2, Phase::Aqueous)
                .with_reagent("A2", 1, Phase::Aqueous)
                .with_reagent("A", 2, Phase::Aqueous),
        ];
        let compiled = compile(inputs(&components), &reactions, &[], None).unwrap();
        assert_eq!(compiled.problem.species[1].stoichiometry, vec![2.0]);
    }

    #[test]
    fn cancelled_produced_species_rejected() {
        let components = vec![ChemicalComponent::from_name("A", Phase::Aqueous, 0.1)];
        let reactions = vec![
            Reaction::new("B", 1.0)
                .with_reagent("B", -1, Phase::Aqueous)
                .with_reagent("B", 1, Phase::Aqueous)
                .with_reagent("A", 1, Phase::Aqueous),
        ];
        let err = compile(inputs(&components), &reactions, &[], None).unwrap_err();
        assert!(matches!(err, ChemmisolError::InvalidReagent { .. }));
    }

    #[test]
    fn untracked_species_rejected() {
        let components = vec![ChemicalComponent::from_name("A", Phase::Aqueous, 0.1)];
        let err = compile(inputs(&components), &[], &["B"], None).unwrap_err();
        assert_eq!(
            err,
            ChemmisolError::UntrackedSpecies {
                species: "B".to_string()
            }
        );
    }
}
