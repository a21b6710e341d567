// cm-core/src/units.rs

use uom::si::f64::MolarConcentration as UomMolarConcentration;

// Public canonical unit type (SI, f64)
pub type MolarConcentration = UomMolarConcentration;

#[inline]
pub fn mol_per_l(v: f64) -> MolarConcentration {
    use uom::si::molar_concentration::mole_per_liter;
    MolarConcentration::new::<mole_per_liter>(v)
}

#[inline]
pub fn as_mol_per_l(c: MolarConcentration) -> f64 {
    use uom::si::molar_concentration::mole_per_liter;
    c.get::<mole_per_liter>()
}

/// Quantity of adsorption sites (mol/l) offered by a suspended mineral.
///
/// All arguments are in core units, so the product is already in mol/l:
/// - `solid_concentration`: g/l of solid in suspension
/// - `specific_surface_area`: m²/g
/// - `site_concentration`: mol/m²
pub fn surface_sites(
    solid_concentration: f64,
    specific_surface_area: f64,
    site_concentration: f64,
) -> MolarConcentration {
    mol_per_l(solid_concentration * specific_surface_area * site_concentration)
}

/// Site density in sites/nm² converted to the core unit mol/m².
pub fn sites_per_nm2_to_mol_per_m2(sites_per_nm2: f64) -> f64 {
    sites_per_nm2 * constants::NM2_PER_M2 / constants::AVOGADRO
}

pub mod constants {
    /// Avogadro constant (1/mol), exact since the 2019 SI redefinition.
    pub const AVOGADRO: f64 = 6.022_140_76e23;

    pub const NM2_PER_M2: f64 = 1e18;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let c = mol_per_l(0.1);
        assert!((as_mol_per_l(c) - 0.1).abs() < 1e-15);
    }

    #[test]
    fn surface_sites_is_the_core_unit_product() {
        // 2.5 g/l, 24.2 m2/g, 1.33e-6 mol/m2
        let sites = as_mol_per_l(surface_sites(2.5, 24.2, 1.33e-6));
        assert!((sites - 8.0465e-5).abs() < 1e-15);
    }

    #[test]
    fn site_density_conversion() {
        // 0.8 sites/nm2 is about 1.33e-6 mol/m2
        let density = sites_per_nm2_to_mol_per_m2(0.8);
        assert!((density - 0.8e18 / constants::AVOGADRO).abs() < 1e-20);
        assert!(density > 1.32e-6 && density < 1.34e-6);

        let sites = as_mol_per_l(surface_sites(2.5, 24.2, density));
        assert!(sites > 8.0e-5 && sites < 8.1e-5);
    }
}
