//! Shared application service layer for chemmisol.
//!
//! This crate provides the interface used by the CLI, centralizing project
//! loading, system construction, equilibrium runs, pH sweeps and run caching.

pub mod build;
pub mod error;
pub mod progress;
pub mod project_service;
pub mod record;
pub mod run_service;
pub mod sweep;

pub use build::{build_system, build_system_with_ph};
pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage, SolveProgress};
pub use project_service::{
    SystemSummary, get_system, list_systems, load_project, save_project, validate_project,
};
pub use record::record_equilibrium;
pub use run_service::{
    RunMode, RunOptions, RunRequest, RunResponse, ensure_run, ensure_run_with_progress,
    list_runs, load_run,
};
pub use sweep::PhSweep;
