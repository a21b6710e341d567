//! Chemical equilibrium solver.
//!
//! This crate provides a Newton-based nonlinear solver for speciation
//! problems where the unknowns are the natural log activities of the free
//! components. Species activities follow from mass action and the residuals
//! are the component mass balances.

pub mod equilibrium;
pub mod error;
pub mod jacobian;
pub mod newton;
pub mod problem;
pub mod solve;

pub use equilibrium::EquilibriumSolution;
pub use error::{SolverError, SolverResult};
pub use newton::{NewtonConfig, NewtonProgress, NewtonResult};
pub use problem::{ComponentTerm, EquilibriumProblem, SpeciesTerm};
pub use solve::{JacobianMode, SolveProgressEvent, SolverConfig, solve, solve_with_progress};
