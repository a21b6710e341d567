//! Result data types.

use cm_core::Phase;
use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    pub system_id: String,
    pub timestamp: String,
    pub run_type: RunType,
    pub solver_version: String,
}

impl RunManifest {
    /// Manifest stamped with the current UTC time.
    pub fn now(
        run_id: RunId,
        system_id: impl Into<String>,
        run_type: RunType,
        solver_version: impl Into<String>,
    ) -> Self {
        Self {
            run_id,
            system_id: system_id.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            run_type,
            solver_version: solver_version.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum RunType {
    /// Single equilibrium, optionally overriding the pH of the definition.
    Equilibrium {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ph: Option<f64>,
    },
    PhSweep {
        from: f64,
        to: f64,
        points: usize,
    },
}

/// State of a system at equilibrium.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EquilibriumRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
    pub iterations: usize,
    pub residual_norm: f64,
    pub species: Vec<SpeciesValue>,
    pub components: Vec<ComponentValue>,
    #[serde(default)]
    pub reactions: Vec<ReactionValue>,
}

impl EquilibriumRecord {
    pub fn concentration(&self, species: &str) -> Option<f64> {
        self.species
            .iter()
            .find(|s| s.name == species)
            .map(|s| s.concentration)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeciesValue {
    pub name: String,
    pub phase: Phase,
    /// mol/l, or fraction of sites for mineral species
    pub concentration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentValue {
    pub name: String,
    pub total_concentration: f64,
    pub fixed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReactionValue {
    pub name: String,
    pub log_k: f64,
    pub log_quotient: f64,
}
