//! Common identity of named chemical entities.

use cm_core::Phase;

/// Anything identified by a name and living in a phase.
pub trait ChemicalEntity {
    fn name(&self) -> &str;

    fn phase(&self) -> Phase;
}
