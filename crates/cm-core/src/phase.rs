//! Physical state of chemical entities.

use core::fmt;
use core::str::FromStr;

/// Phase of a chemical entity.
///
/// The phase drives how a concentration is interpreted: mol/l for aqueous
/// species, fraction of surface sites for mineral species, and a fixed unit
/// activity for the solvent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Phase {
    Solvent,
    Aqueous,
    Mineral,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Solvent, Phase::Aqueous, Phase::Mineral];

    pub fn key(&self) -> &'static str {
        match self {
            Phase::Solvent => "SOLVENT",
            Phase::Aqueous => "AQUEOUS",
            Phase::Mineral => "MINERAL",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Phase {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SOLVENT" => Ok(Phase::Solvent),
            "AQUEOUS" | "AQ" => Ok(Phase::Aqueous),
            "MINERAL" | "S" => Ok(Phase::Mineral),
            _ => Err("unknown phase (expected SOLVENT, AQUEOUS or MINERAL)"),
        }
    }
}
