//! Schema migration framework.

use crate::ProjectError;
use crate::schema::{FixedActivityDef, Project};

pub const LATEST_VERSION: u32 = 2;

pub fn migrate_to_latest(mut project: Project) -> Result<Project, ProjectError> {
    while project.version < LATEST_VERSION {
        project = migrate_one_version(project)?;
    }
    Ok(project)
}

fn migrate_one_version(project: Project) -> Result<Project, ProjectError> {
    match project.version {
        0 => migrate_v0_to_v1(project),
        1 => migrate_v1_to_v2(project),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

fn migrate_v0_to_v1(mut project: Project) -> Result<Project, ProjectError> {
    project.version = 1;
    Ok(project)
}

/// Version 1 stored a single pH per system. Version 2 lists every fixed
/// activity.
fn migrate_v1_to_v2(mut project: Project) -> Result<Project, ProjectError> {
    for system in &mut project.systems {
        let Some(ph) = system.ph.take() else {
            continue;
        };
        let already_fixed = system
            .fixed
            .iter()
            .any(|f| matches!(f, FixedActivityDef::Ph { .. }));
        if already_fixed {
            return Err(ProjectError::Migration {
                what: format!("System '{}' fixes the pH twice", system.id),
            });
        }
        tracing::debug!(system = system.id.as_str(), ph, "Migrating legacy pH");
        system.fixed.insert(
            0,
            FixedActivityDef::Ph {
                value: ph,
                component: "H+".to_string(),
            },
        );
    }

    project.version = 2;
    Ok(project)
}
