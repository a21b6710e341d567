//! cm-core: stable foundation for chemmisol.
//!
//! Contains:
//! - phase (physical state of chemical entities)
//! - units (uom SI types + constructors, surface site quantities)
//! - numeric (Real + tolerances + pH helpers)
//! - ids (stable compact IDs for components, species and reactions)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod phase;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use phase::Phase;
pub use units::*;
