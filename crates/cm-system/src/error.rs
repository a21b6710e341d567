//! Error types for chemical system operations.

use cm_core::CoreError;
use cm_solver::SolverError;
use thiserror::Error;

/// Errors raised while building or solving a chemical system.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChemmisolError {
    #[error("Missing produced species in reaction {reaction}: every reagent is a component")]
    MissingProducedSpeciesInReaction { reaction: String },

    #[error("Too many produced species in reaction {reaction}: {species:?} are not components")]
    TooManyProducedSpeciesInReaction {
        reaction: String,
        species: Vec<String>,
    },

    #[error("Mineral species {species} used in a system without a sites quantity")]
    InvalidMineralSpeciesWithUndefinedSitesCount { species: String },

    #[error("Species {species} is produced by both {first} and {second}")]
    SpeciesProducedTwice {
        species: String,
        first: String,
        second: String,
    },

    #[error("Species {species} produced by {reaction} cannot be a solvent")]
    SolventProducedSpecies { species: String, reaction: String },

    #[error("Invalid reagent {reagent} in reaction {reaction}: {reason}")]
    InvalidReagent {
        reaction: String,
        reagent: String,
        reason: String,
    },

    #[error("Tracked species {species} is neither a component nor produced by a reaction")]
    UntrackedSpecies { species: String },

    #[error("Duplicate component: {name}")]
    DuplicateComponent { name: String },

    #[error("Duplicate reaction: {name}")]
    DuplicateReaction { name: String },

    #[error("Component not found: {name}")]
    ComponentNotFound { name: String },

    #[error("Species not found: {name}")]
    SpeciesNotFound { name: String },

    #[error("Reaction not found: {name}")]
    ReactionNotFound { name: String },

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl ChemmisolError {
    /// Whether the error belongs to the chemistry core (invalid reactions or
    /// phases) rather than to lookups or numerics.
    pub fn is_core_error(&self) -> bool {
        matches!(
            self,
            ChemmisolError::MissingProducedSpeciesInReaction { .. }
                | ChemmisolError::TooManyProducedSpeciesInReaction { .. }
                | ChemmisolError::InvalidMineralSpeciesWithUndefinedSitesCount { .. }
                | ChemmisolError::SpeciesProducedTwice { .. }
                | ChemmisolError::SolventProducedSpecies { .. }
                | ChemmisolError::InvalidReagent { .. }
        )
    }
}

pub type ChemmisolResult<T> = Result<T, ChemmisolError>;
