//! Definition file schema.

use cm_core::Phase;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub systems: Vec<SystemDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemDef {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mineral: Option<MineralDef>,
    #[serde(default)]
    pub components: Vec<ComponentDef>,
    #[serde(default)]
    pub reactions: Vec<ReactionDef>,
    /// Species tracked on top of the components and produced species.
    #[serde(default)]
    pub species: Vec<SpeciesDef>,
    #[serde(default)]
    pub fixed: Vec<FixedActivityDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
    /// Version 1 pH, moved into `fixed` on migration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
}

/// Suspended mineral offering adsorption sites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MineralDef {
    pub solid_concentration_g_per_l: f64,
    pub specific_surface_area_m2_per_g: f64,
    /// Site density in mol/m²
    pub site_concentration_mol_per_m2: f64,
    pub surface_complex: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentDef {
    pub name: String,
    #[serde(default = "default_phase")]
    pub phase: Phase,
    /// mol/l for aqueous components, fraction of sites for mineral ones.
    #[serde(default)]
    pub total_concentration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReactionDef {
    pub name: String,
    pub log_k: f64,
    pub reagents: Vec<ReagentDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReagentDef {
    pub name: String,
    pub coefficient: i32,
    #[serde(default = "default_phase")]
    pub phase: Phase,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeciesDef {
    pub name: String,
    #[serde(default = "default_phase")]
    pub phase: Phase,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum FixedActivityDef {
    Ph {
        value: f64,
        #[serde(default = "default_h_component")]
        component: String,
    },
    Concentration {
        component: String,
        value: f64,
    },
}

impl FixedActivityDef {
    pub fn component(&self) -> &str {
        match self {
            FixedActivityDef::Ph { component, .. } => component,
            FixedActivityDef::Concentration { component, .. } => component,
        }
    }
}

fn default_phase() -> Phase {
    Phase::Aqueous
}

fn default_h_component() -> String {
    "H+".to_string()
}
