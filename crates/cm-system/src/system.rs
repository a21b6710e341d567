//! The chemical system aggregate.

use crate::error::{ChemmisolError, ChemmisolResult};
use crate::setup::{CompiledSystem, ComponentInput, compile};
use cm_core::{
    ComponentId, CoreError, activity_to_ph, as_mol_per_l, ensure_finite, ph_to_activity,
    surface_sites,
};
use cm_model::{ChemicalComponent, ChemicalEntity, ChemicalSpecies, Phase, Reaction};
use cm_solver::{EquilibriumSolution, SolveProgressEvent, SolverConfig};

/// Iteration budget of [`ChemicalSystem::solve`] unless overridden.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Component targeted by [`ChemicalSystem::fix_ph`].
pub const DEFAULT_H_COMPONENT: &str = "H+";

#[derive(Debug, Clone)]
struct ComponentEntry {
    component: ChemicalComponent,
    fixed: bool,
}

/// A set of components, reactions and tracked species solved for chemical
/// equilibrium.
///
/// Structural changes (new components, reactions or species) invalidate the
/// set-up, which is rebuilt lazily by the next [`solve`](Self::solve).
/// Fixing an activity or changing a total keeps the set-up and the last
/// solution, which seeds the next solve.
#[derive(Debug)]
pub struct ChemicalSystem {
    components: Vec<ComponentEntry>,
    reactions: Vec<Reaction>,
    species: Vec<ChemicalSpecies>,
    sites_quantity: Option<f64>,
    surface_complex: Option<String>,
    /// Component whose activity was last fixed through a pH
    ph_component: Option<String>,
    config: SolverConfig,
    compiled: Option<CompiledSystem>,
    last_solution: Option<EquilibriumSolution>,
}

impl Default for ChemicalSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ChemicalSystem {
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
            reactions: Vec::new(),
            species: Vec::new(),
            sites_quantity: None,
            surface_complex: None,
            ph_component: None,
            config: SolverConfig::default().with_max_iterations(DEFAULT_MAX_ITERATIONS),
            compiled: None,
            last_solution: None,
        }
    }

    /// System with a suspended mineral offering adsorption sites.
    ///
    /// - `solid_concentration`: g/l
    /// - `specific_surface_area`: m²/g
    /// - `site_concentration`: mol/m²
    ///
    /// The product of the three is the site quantity in mol/l. Densities in
    /// sites/nm² convert with [`cm_core::sites_per_nm2_to_mol_per_m2`].
    ///
    /// The `surface_complex` is registered as a mineral component whose total
    /// is the whole set of sites.
    pub fn with_mineral(
        solid_concentration: f64,
        specific_surface_area: f64,
        site_concentration: f64,
        surface_complex: impl Into<String>,
    ) -> ChemmisolResult<Self> {
        for (value, what) in [
            (solid_concentration, "solid concentration"),
            (specific_surface_area, "specific surface area"),
            (site_concentration, "site concentration"),
        ] {
            ensure_finite(value, what)?;
            if value <= 0.0 {
                return Err(CoreError::InvalidArg { what }.into());
            }
        }

        let sites = as_mol_per_l(surface_sites(
            solid_concentration,
            specific_surface_area,
            site_concentration,
        ));
        let surface_complex = surface_complex.into();
        tracing::info!(sites, surface_complex = surface_complex.as_str(), "Mineral system");

        let mut system = Self::new();
        system.sites_quantity = Some(sites);
        system.surface_complex = Some(surface_complex.clone());
        system.add_component(ChemicalComponent::from_name(
            surface_complex,
            Phase::Mineral,
            1.0,
        ))?;
        Ok(system)
    }

    pub fn add_reaction(&mut self, reaction: Reaction) -> ChemmisolResult<()> {
        if self.reaction(reaction.name()).is_some() {
            return Err(ChemmisolError::DuplicateReaction {
                name: reaction.name().to_string(),
            });
        }
        tracing::info!(reaction = reaction.name(), log_k = reaction.log_k(), "Adding reaction");
        for reagent in reaction.reagents() {
            tracing::debug!(
                reagent = reagent.name(),
                coefficient = reagent.coefficient(),
                phase = %reagent.phase(),
                "Reagent"
            );
        }
        self.reactions.push(reaction);
        self.invalidate();
        Ok(())
    }

    pub fn add_component(
        &mut self,
        component: impl Into<ChemicalComponent>,
    ) -> ChemmisolResult<ComponentId> {
        let component = component.into();
        if self.component(component.name()).is_some() {
            return Err(ChemmisolError::DuplicateComponent {
                name: component.name().to_string(),
            });
        }
        if component.phase() == Phase::Mineral && self.sites_quantity.is_none() {
            return Err(ChemmisolError::InvalidMineralSpeciesWithUndefinedSitesCount {
                species: component.name().to_string(),
            });
        }
        let id = ComponentId::from_position(self.components.len()).ok_or(
            CoreError::Invariant {
                what: "component count overflow",
            },
        )?;

        tracing::info!(
            component = component.name(),
            phase = %component.phase(),
            total = component.total_concentration(),
            "Adding component"
        );
        // A component supersedes a tracked species of the same name
        self.species.retain(|s| s.name() != component.name());
        self.components.push(ComponentEntry {
            fixed: component.phase() == Phase::Solvent,
            component,
        });
        self.invalidate();
        Ok(id)
    }

    /// Track a species so that its concentration is available after solve.
    ///
    /// The species must be a component or be produced by a reaction once the
    /// system is set up.
    pub fn add_species(&mut self, species: ChemicalSpecies) -> ChemmisolResult<()> {
        if self.component(species.name()).is_some() {
            return Ok(());
        }
        tracing::debug!(species = species.name(), "Tracking species");
        match self.species.iter_mut().find(|s| s.name() == species.name()) {
            Some(existing) => *existing = species,
            None => self.species.push(species),
        }
        self.invalidate();
        Ok(())
    }

    /// Fix the pH through the [`DEFAULT_H_COMPONENT`] component.
    pub fn fix_ph(&mut self, ph: f64) -> ChemmisolResult<()> {
        self.fix_ph_in(ph, DEFAULT_H_COMPONENT)
    }

    /// Fix the pH through the given component, created if missing.
    pub fn fix_ph_in(&mut self, ph: f64, component: &str) -> ChemmisolResult<()> {
        tracing::info!(ph, component, "Fixing pH");
        let activity = ph_to_activity(ph)?;
        self.fix_concentration(component, activity)?;
        self.ph_component = Some(component.to_string());
        Ok(())
    }

    /// Component carrying the pH: the one given to the last
    /// [`fix_ph_in`](Self::fix_ph_in), [`DEFAULT_H_COMPONENT`] otherwise.
    pub fn ph_component(&self) -> &str {
        self.ph_component.as_deref().unwrap_or(DEFAULT_H_COMPONENT)
    }

    /// Current pH, if the pH component exists and has a positive activity.
    pub fn ph(&self) -> Option<f64> {
        self.concentration(self.ph_component())
            .ok()
            .and_then(|activity| activity_to_ph(activity).ok())
    }

    /// Fix the activity of a component, removing it from the unknowns.
    ///
    /// A missing component is created as an aqueous component.
    pub fn fix_concentration(&mut self, component: &str, activity: f64) -> ChemmisolResult<()> {
        ensure_finite(activity, "fixed concentration")?;
        if activity <= 0.0 {
            return Err(CoreError::InvalidArg {
                what: "fixed concentration must be positive",
            }
            .into());
        }

        let position = match self.component_position(component) {
            Some(position) => position,
            None => {
                self.add_component(ChemicalComponent::from_name(
                    component,
                    Phase::Aqueous,
                    0.0,
                ))?
                .position()
            }
        };

        let entry = &mut self.components[position];
        if entry.component.phase() == Phase::Solvent {
            return Err(CoreError::InvalidArg {
                what: "solvent activity cannot be fixed",
            }
            .into());
        }
        entry.fixed = true;
        entry.component.species_mut().set_concentration(activity);

        if let Some(compiled) = self.compiled.as_mut()
            && let Some(id) = compiled.problem.component_id(component)
        {
            compiled.problem.fix_activity(id, activity)?;
        }
        Ok(())
    }

    pub fn set_total_concentration(&mut self, component: &str, total: f64) -> ChemmisolResult<()> {
        ensure_finite(total, "total concentration")?;
        let position = self
            .component_position(component)
            .ok_or_else(|| ChemmisolError::ComponentNotFound {
                name: component.to_string(),
            })?;
        tracing::info!(component, total, "Setting total concentration");
        self.components[position]
            .component
            .set_total_concentration(total);

        if let Some(compiled) = self.compiled.as_mut()
            && let Some(id) = compiled.problem.component_id(component)
        {
            compiled.problem.set_total(id, total)?;
        }
        Ok(())
    }

    /// Check every reaction and compile the system into an equilibrium
    /// problem.
    pub fn set_up(&mut self) -> ChemmisolResult<()> {
        let tracked: Vec<&str> = self.species.iter().map(|s| s.name()).collect();
        let compiled = compile(
            self.components.iter().map(|entry| ComponentInput {
                component: &entry.component,
                fixed_activity: entry
                    .fixed
                    .then(|| entry.component.species().concentration()),
            }),
            &self.reactions,
            &tracked,
            self.sites_quantity,
        )?;

        for produced in &compiled.produced {
            if !self.species.iter().any(|s| s.name() == produced.name) {
                self.species
                    .push(ChemicalSpecies::new(produced.name.clone(), produced.phase));
            }
        }

        tracing::info!(
            components = self.components.len(),
            reactions = self.reactions.len(),
            species = compiled.problem.species.len(),
            "System set up"
        );
        if self
            .last_solution
            .as_ref()
            .is_some_and(|s| s.activities.len() != compiled.problem.species.len())
        {
            self.last_solution = None;
        }
        self.compiled = Some(compiled);
        Ok(())
    }

    /// Solve the system for equilibrium and update every concentration.
    pub fn solve(&mut self) -> ChemmisolResult<()> {
        self.solve_inner(None)
    }

    /// Same as [`solve`](Self::solve), streaming solver progress.
    pub fn solve_with_progress(
        &mut self,
        progress: &mut dyn FnMut(SolveProgressEvent),
    ) -> ChemmisolResult<()> {
        self.solve_inner(Some(progress))
    }

    fn solve_inner(
        &mut self,
        progress: Option<&mut dyn FnMut(SolveProgressEvent)>,
    ) -> ChemmisolResult<()> {
        if self.compiled.is_none() {
            self.set_up()?;
        }
        let compiled = self.compiled.as_ref().ok_or(CoreError::Invariant {
            what: "system not set up",
        })?;

        tracing::info!(
            max_iterations = self.config.newton.max_iterations,
            "Solving system"
        );
        let warm_start = self.last_solution.as_ref();
        let solution = match progress {
            Some(cb) => cm_solver::solve_with_progress(
                &compiled.problem,
                Some(self.config),
                warm_start,
                cb,
            )?,
            None => cm_solver::solve(&compiled.problem, Some(self.config), warm_start)?,
        };
        tracing::info!(
            iterations = solution.iterations,
            residual = solution.residual_norm,
            "System solved"
        );

        for (position, entry) in self.components.iter_mut().enumerate() {
            let species_position = compiled.problem.component_species[position];
            entry
                .component
                .species_mut()
                .set_concentration(solution.activities[species_position]);
            if entry.fixed && entry.component.phase() != Phase::Solvent {
                entry
                    .component
                    .set_total_concentration(solution.totals[position]);
            }
        }
        for species in &mut self.species {
            if let Some(position) = compiled.species_position(species.name()) {
                species.set_concentration(solution.activities[position]);
            }
        }

        self.last_solution = Some(solution);
        Ok(())
    }

    /// Concentration of a component or tracked species.
    ///
    /// Mineral species report their fraction of the sites.
    pub fn concentration(&self, name: &str) -> ChemmisolResult<f64> {
        if let Some(component) = self.component(name) {
            return Ok(component.species().concentration());
        }
        self.species(name)
            .map(ChemicalSpecies::concentration)
            .ok_or_else(|| ChemmisolError::SpeciesNotFound {
                name: name.to_string(),
            })
    }

    /// Activity entering mass action: 1 for the solvent, the concentration
    /// otherwise.
    pub fn activity(&self, name: &str) -> ChemmisolResult<f64> {
        match self.component(name) {
            Some(component) if component.phase() == Phase::Solvent => Ok(1.0),
            _ => self.concentration(name),
        }
    }

    /// Reaction quotient `Q = Π a_i^(-c_i)` from the current concentrations.
    ///
    /// At equilibrium `Q` equals the equilibrium constant of the reaction.
    /// Produced species are only tracked once the system is set up, so before
    /// [`set_up`](Self::set_up) or [`solve`](Self::solve) this fails with
    /// [`ChemmisolError::SpeciesNotFound`].
    pub fn reaction_quotient(&self, reaction: &str) -> ChemmisolResult<f64> {
        let reaction = self
            .reaction(reaction)
            .ok_or_else(|| ChemmisolError::ReactionNotFound {
                name: reaction.to_string(),
            })?;
        let mut quotient = 1.0;
        for reagent in reaction.reagents() {
            quotient *= self.activity(reagent.name())?.powi(-reagent.coefficient());
        }
        Ok(quotient)
    }

    pub fn log_reaction_quotient(&self, reaction: &str) -> ChemmisolResult<f64> {
        Ok(self.reaction_quotient(reaction)?.log10())
    }

    pub fn component(&self, name: &str) -> Option<&ChemicalComponent> {
        self.components
            .iter()
            .map(|entry| &entry.component)
            .find(|c| c.name() == name)
    }

    pub fn components(&self) -> impl Iterator<Item = &ChemicalComponent> {
        self.components.iter().map(|entry| &entry.component)
    }

    pub fn is_fixed(&self, component: &str) -> bool {
        self.components
            .iter()
            .any(|entry| entry.fixed && entry.component.name() == component)
    }

    /// Tracked species that are not components.
    pub fn species(&self, name: &str) -> Option<&ChemicalSpecies> {
        self.species.iter().find(|s| s.name() == name)
    }

    pub fn tracked_species(&self) -> &[ChemicalSpecies] {
        &self.species
    }

    pub fn reaction(&self, name: &str) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.name() == name)
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    /// Quantity of surface sites in mol/l, if the system holds a mineral.
    pub fn sites_quantity(&self) -> Option<f64> {
        self.sites_quantity
    }

    pub fn surface_complex(&self) -> Option<&str> {
        self.surface_complex.as_deref()
    }

    pub fn max_iterations(&self) -> usize {
        self.config.newton.max_iterations
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.config.newton.max_iterations = max_iterations;
    }

    pub fn solver_config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn set_solver_config(&mut self, config: SolverConfig) {
        self.config = config;
    }

    pub fn is_set_up(&self) -> bool {
        self.compiled.is_some()
    }

    /// Solution of the last successful solve.
    pub fn last_solution(&self) -> Option<&EquilibriumSolution> {
        self.last_solution.as_ref()
    }

    /// Release the system.
    pub fn close(self) {
        drop(self);
    }

    fn component_position(&self, name: &str) -> Option<usize> {
        self.components
            .iter()
            .position(|entry| entry.component.name() == name)
    }

    fn invalidate(&mut self) {
        self.compiled = None;
    }
}

impl Drop for ChemicalSystem {
    fn drop(&mut self) {
        tracing::debug!(
            components = self.components.len(),
            reactions = self.reactions.len(),
            "Releasing chemical system"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solvent_components_are_fixed() {
        let mut system = ChemicalSystem::new();
        system.add_component(cm_model::Solvent::new("H2O")).unwrap();
        assert!(system.is_fixed("H2O"));
        assert!(system.fix_concentration("H2O", 0.5).is_err());
    }

    #[test]
    fn fixing_keeps_setup() {
        let mut system = ChemicalSystem::new();
        system
            .add_component(ChemicalComponent::from_name("H+", Phase::Aqueous, 0.0))
            .unwrap();
        system.set_up().unwrap();
        system.fix_ph(7.0).unwrap();
        assert!(system.is_set_up());

        // Creating the target component is a structural change
        system.fix_ph_in(8.0, "D+").unwrap();
        assert!(!system.is_set_up());
    }

    #[test]
    fn ph_follows_the_fixed_component() {
        let mut system = ChemicalSystem::new();
        assert_eq!(system.ph_component(), DEFAULT_H_COMPONENT);
        assert_eq!(system.ph(), None);

        system.fix_ph_in(7.5, "H").unwrap();
        assert_eq!(system.ph_component(), "H");
        assert!((system.ph().unwrap() - 7.5).abs() < 1e-12);
        assert!(system.component(DEFAULT_H_COMPONENT).is_none());
    }

    #[test]
    fn component_replaces_tracked_species() {
        let mut system = ChemicalSystem::new();
        system
            .add_species(ChemicalSpecies::new("Na+", Phase::Aqueous))
            .unwrap();
        system
            .add_component(ChemicalComponent::from_name("Na+", Phase::Aqueous, 0.1))
            .unwrap();
        assert!(system.species("Na+").is_none());
        assert_eq!(system.concentration("Na+").unwrap(), 0.1);
    }

    #[test]
    fn invalid_mineral_parameters() {
        assert!(ChemicalSystem::with_mineral(0.0, 1.0, 1.0, "=SOH").is_err());
        assert!(ChemicalSystem::with_mineral(1.0, f64::NAN, 1.0, "=SOH").is_err());
    }
}
