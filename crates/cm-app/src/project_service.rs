//! Project loading, saving, validation, and introspection.

use cm_project::schema::{Project, SystemDef};
use cm_project::{Chemmisol, DefinitionSource};
use std::path::Path;

use crate::error::{AppError, AppResult};

/// Summary of a system for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSummary {
    pub id: String,
    pub name: String,
    pub component_count: usize,
    pub reaction_count: usize,
    pub has_mineral: bool,
    /// Components whose activity is fixed by the definition
    pub fixed: Vec<String>,
}

/// Load, migrate and validate definitions from any source.
pub fn load_project(source: &DefinitionSource) -> AppResult<Project> {
    let project = Chemmisol::load(source)?;
    validate_project(&project)?;
    Ok(project)
}

/// Save definitions, in YAML or JSON depending on the extension.
pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    validate_project(project)?;
    cm_project::save_path(path, project)?;
    Ok(())
}

/// Validate project structure.
pub fn validate_project(project: &Project) -> AppResult<()> {
    cm_project::validate_project(project).map_err(|e| AppError::Validation(e.to_string()))?;
    if project.systems.is_empty() {
        return Err(AppError::Validation(
            "Project must have at least one system".to_string(),
        ));
    }
    Ok(())
}

/// List all systems in the project with summaries.
pub fn list_systems(project: &Project) -> Vec<SystemSummary> {
    project
        .systems
        .iter()
        .map(|system| SystemSummary {
            id: system.id.clone(),
            name: system.name.clone(),
            component_count: system.components.len() + usize::from(system.mineral.is_some()),
            reaction_count: system.reactions.len(),
            has_mineral: system.mineral.is_some(),
            fixed: system
                .fixed
                .iter()
                .map(|f| f.component().to_string())
                .collect(),
        })
        .collect()
}

/// Get a specific system by ID.
pub fn get_system<'a>(project: &'a Project, system_id: &str) -> AppResult<&'a SystemDef> {
    project
        .systems
        .iter()
        .find(|s| s.id == system_id)
        .ok_or_else(|| AppError::SystemNotFound(system_id.to_string()))
}
