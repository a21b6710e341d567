//! Definition validation logic.

use crate::schema::{ComponentDef, FixedActivityDef, MineralDef, Project, ReactionDef, SystemDef};
use cm_core::Phase;
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    let mut system_ids = HashSet::new();
    for system in &project.systems {
        if !system_ids.insert(&system.id) {
            return Err(ValidationError::DuplicateId {
                id: system.id.clone(),
                context: "systems".to_string(),
            });
        }
        validate_system(system)?;
    }

    Ok(())
}

fn validate_system(system: &SystemDef) -> Result<(), ValidationError> {
    if system.ph.is_some() {
        return Err(ValidationError::Unsupported {
            feature: format!("system '{}' ph", system.id),
            reason: "use a fixed activity of type Ph".to_string(),
        });
    }

    if let Some(mineral) = &system.mineral {
        validate_mineral(mineral, &system.id)?;
    }
    let has_sites = system.mineral.is_some();

    let mut component_names = HashSet::new();
    if let Some(mineral) = &system.mineral {
        component_names.insert(mineral.surface_complex.as_str());
    }
    for component in &system.components {
        if !component_names.insert(component.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: component.name.clone(),
                context: format!("system '{}' components", system.id),
            });
        }
        validate_component(component, has_sites, &system.id)?;
    }

    let mut reaction_names = HashSet::new();
    for reaction in &system.reactions {
        if !reaction_names.insert(reaction.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: reaction.name.clone(),
                context: format!("system '{}' reactions", system.id),
            });
        }
        validate_reaction(reaction, has_sites, &system.id)?;
    }

    let mut species_names = HashSet::new();
    for species in &system.species {
        if !species_names.insert(species.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: species.name.clone(),
                context: format!("system '{}' species", system.id),
            });
        }
        require_sites(species.phase, has_sites, &species.name)?;
    }

    let mut fixed_components = HashSet::new();
    for fixed in &system.fixed {
        if !fixed_components.insert(fixed.component()) {
            return Err(ValidationError::DuplicateId {
                id: fixed.component().to_string(),
                context: format!("system '{}' fixed activities", system.id),
            });
        }
        validate_fixed(fixed, system)?;
    }

    if system.max_iterations == Some(0) {
        return Err(ValidationError::InvalidValue {
            field: format!("system '{}' max_iterations", system.id),
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(())
}

fn validate_mineral(mineral: &MineralDef, system_id: &str) -> Result<(), ValidationError> {
    for (field, value) in [
        ("solid_concentration_g_per_l", mineral.solid_concentration_g_per_l),
        (
            "specific_surface_area_m2_per_g",
            mineral.specific_surface_area_m2_per_g,
        ),
        ("site_concentration_mol_per_m2", mineral.site_concentration_mol_per_m2),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: format!("system '{}' mineral {}", system_id, field),
                value: value.to_string(),
                reason: "must be positive and finite".to_string(),
            });
        }
    }
    if mineral.surface_complex.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: format!("system '{}' mineral surface_complex", system_id),
            value: String::new(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

fn validate_component(
    component: &ComponentDef,
    has_sites: bool,
    system_id: &str,
) -> Result<(), ValidationError> {
    if component.name.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: format!("system '{}' component name", system_id),
            value: String::new(),
            reason: "must not be empty".to_string(),
        });
    }
    if !component.total_concentration.is_finite() {
        return Err(ValidationError::InvalidValue {
            field: format!("component '{}' total_concentration", component.name),
            value: component.total_concentration.to_string(),
            reason: "must be finite".to_string(),
        });
    }
    require_sites(component.phase, has_sites, &component.name)
}

fn validate_reaction(
    reaction: &ReactionDef,
    has_sites: bool,
    system_id: &str,
) -> Result<(), ValidationError> {
    if reaction.reagents.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: format!("system '{}' reaction '{}' reagents", system_id, reaction.name),
            value: "[]".to_string(),
            reason: "a reaction needs at least one reagent".to_string(),
        });
    }
    if !reaction.log_k.is_finite() {
        return Err(ValidationError::InvalidValue {
            field: format!("reaction '{}' log_k", reaction.name),
            value: reaction.log_k.to_string(),
            reason: "must be finite".to_string(),
        });
    }
    for reagent in &reaction.reagents {
        if reagent.coefficient == 0 {
            return Err(ValidationError::InvalidValue {
                field: format!("reaction '{}' reagent '{}'", reaction.name, reagent.name),
                value: "0".to_string(),
                reason: "coefficient must not be zero".to_string(),
            });
        }
        require_sites(reagent.phase, has_sites, &reagent.name)?;
    }
    Ok(())
}

fn validate_fixed(fixed: &FixedActivityDef, system: &SystemDef) -> Result<(), ValidationError> {
    let (field, value) = match fixed {
        FixedActivityDef::Ph { value, component } => {
            (format!("fixed pH of '{}'", component), *value)
        }
        FixedActivityDef::Concentration { value, component } => {
            if *value <= 0.0 {
                return Err(ValidationError::InvalidValue {
                    field: format!("fixed concentration of '{}'", component),
                    value: value.to_string(),
                    reason: "must be positive".to_string(),
                });
            }
            (format!("fixed concentration of '{}'", component), *value)
        }
    };
    if !value.is_finite() {
        return Err(ValidationError::InvalidValue {
            field,
            value: value.to_string(),
            reason: "must be finite".to_string(),
        });
    }

    // Unknown targets are created as aqueous components when fixed
    let target = system
        .components
        .iter()
        .find(|c| c.name == fixed.component());
    if target.is_some_and(|c| c.phase == Phase::Solvent) {
        return Err(ValidationError::Unsupported {
            feature: format!("fixed activity of solvent '{}'", fixed.component()),
            reason: "the solvent activity is always 1".to_string(),
        });
    }
    Ok(())
}

fn require_sites(phase: Phase, has_sites: bool, name: &str) -> Result<(), ValidationError> {
    if phase == Phase::Mineral && !has_sites {
        return Err(ValidationError::MissingReference {
            id: name.to_string(),
            context: "mineral entity without a mineral surface".to_string(),
        });
    }
    Ok(())
}
