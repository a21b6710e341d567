//! Smoke tests for the chemical entity model.

use cm_model::{ChemicalComponent, ChemicalEntity, ChemicalSpecies, Phase, Reaction, Solvent};
use proptest::prelude::*;

fn names<T: ChemicalEntity>(entities: &[T]) -> Vec<String> {
    entities.iter().map(|e| e.name().to_string()).collect()
}

#[test]
fn entities_share_identity_trait() {
    let species = vec![
        ChemicalSpecies::new("H+", Phase::Aqueous),
        ChemicalSpecies::new("=SOH", Phase::Mineral),
    ];
    assert_eq!(names(&species), ["H+", "=SOH"]);

    let reaction = Reaction::new("OH-", -13.997)
        .with_reagent("OH-", -1, Phase::Aqueous)
        .with_reagent("H+", -1, Phase::Aqueous)
        .with_reagent("H2O", 1, Phase::Solvent);
    assert_eq!(names(reaction.reagents()), ["OH-", "H+", "H2O"]);
}

#[test]
fn component_wraps_existing_species() {
    let species = ChemicalSpecies::with_concentration("Na+", Phase::Aqueous, 0.05);
    let mut component = ChemicalComponent::new(species, 0.1);
    assert_eq!(component.species().concentration(), 0.05);

    component.set_total_concentration(0.2);
    component.species_mut().set_concentration(0.2);
    assert_eq!(component.total_concentration(), 0.2);
    assert_eq!(component.species().concentration(), 0.2);
}

#[test]
fn solvent_converts_to_fixed_component() {
    let solvent = Solvent::new("H2O");
    assert_eq!(solvent.phase(), Phase::Solvent);
    let component = ChemicalComponent::from(solvent);
    assert_eq!(component.name(), "H2O");
    assert_eq!(component.species().concentration(), 1.0);
}

proptest! {
    #[test]
    fn coefficient_of_sums_all_entries(coeffs in proptest::collection::vec(-4i32..=4, 1..6)) {
        let mut reaction = Reaction::new("r", 0.0);
        for &c in &coeffs {
            reaction = reaction.with_reagent("X", c, Phase::Aqueous);
        }
        prop_assert_eq!(reaction.coefficient_of("X"), Some(coeffs.iter().sum::<i32>()));
    }
}
