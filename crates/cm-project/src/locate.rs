//! Locating definition files.
//!
//! Definitions are found from an explicit path, from a resource directory
//! and a definition name, or through a properties file whose entry names the
//! resource directory.

use crate::{Project, ProjectError, ProjectResult, load_path};
use std::path::{Path, PathBuf};

/// Extensions tried, in order, when resolving a definition by name.
pub const DEFINITION_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Where a definition file lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionSource {
    /// Explicit path to a definition file.
    File(PathBuf),
    /// `<directory>/<name>.{yaml,yml,json}`.
    Resource { directory: PathBuf, name: String },
    /// A `key=value` properties file whose `property` entry names the
    /// resource directory. Relative directories are resolved against the
    /// properties file.
    Properties {
        file: PathBuf,
        property: String,
        name: String,
    },
}

impl DefinitionSource {
    /// Resolve the source to an existing definition file.
    pub fn resolve(&self) -> ProjectResult<PathBuf> {
        match self {
            DefinitionSource::File(path) => {
                if path.is_file() {
                    Ok(path.clone())
                } else {
                    Err(ProjectError::Locate {
                        what: format!("{} is not a file", path.display()),
                    })
                }
            }
            DefinitionSource::Resource { directory, name } => resolve_resource(directory, name),
            DefinitionSource::Properties {
                file,
                property,
                name,
            } => {
                let directory = read_property(file, property)?;
                let directory = PathBuf::from(directory);
                let directory = if directory.is_relative() {
                    file.parent()
                        .map(|parent| parent.join(&directory))
                        .unwrap_or(directory)
                } else {
                    directory
                };
                resolve_resource(&directory, name)
            }
        }
    }
}

impl From<PathBuf> for DefinitionSource {
    fn from(path: PathBuf) -> Self {
        DefinitionSource::File(path)
    }
}

impl From<&Path> for DefinitionSource {
    fn from(path: &Path) -> Self {
        DefinitionSource::File(path.to_path_buf())
    }
}

fn resolve_resource(directory: &Path, name: &str) -> ProjectResult<PathBuf> {
    DEFINITION_EXTENSIONS
        .iter()
        .map(|ext| directory.join(format!("{}.{}", name, ext)))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| ProjectError::Locate {
            what: format!(
                "no {} definition ({}) in {}",
                name,
                DEFINITION_EXTENSIONS.join(", "),
                directory.display()
            ),
        })
}

fn read_property(file: &Path, property: &str) -> ProjectResult<String> {
    let entries = dotenvy::from_path_iter(file).map_err(|e| ProjectError::Locate {
        what: format!("cannot read properties {}: {}", file.display(), e),
    })?;
    for entry in entries {
        let (key, value) = entry.map_err(|e| ProjectError::Locate {
            what: format!("invalid properties {}: {}", file.display(), e),
        })?;
        if key == property {
            return Ok(value);
        }
    }
    Err(ProjectError::Locate {
        what: format!("property {} not found in {}", property, file.display()),
    })
}

/// Entry point for loading chemical system definitions.
pub struct Chemmisol;

impl Chemmisol {
    /// Load definitions from any source.
    pub fn load(source: &DefinitionSource) -> ProjectResult<Project> {
        let path = source.resolve()?;
        tracing::info!(path = %path.display(), "Loading definitions");
        load_path(&path)
    }

    pub fn load_from_file(path: impl Into<PathBuf>) -> ProjectResult<Project> {
        Self::load(&DefinitionSource::File(path.into()))
    }

    pub fn load_from_resource(
        directory: impl Into<PathBuf>,
        name: impl Into<String>,
    ) -> ProjectResult<Project> {
        Self::load(&DefinitionSource::Resource {
            directory: directory.into(),
            name: name.into(),
        })
    }

    pub fn load_from_properties(
        file: impl Into<PathBuf>,
        property: impl Into<String>,
        name: impl Into<String>,
    ) -> ProjectResult<Project> {
        Self::load(&DefinitionSource::Properties {
            file: file.into(),
            property: property.into(),
            name: name.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cm_project_locate_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn resource_prefers_yaml_then_yml_then_json() {
        let dir = scratch_dir("ext_order");
        std::fs::write(dir.join("water.json"), "{}").unwrap();
        let source = DefinitionSource::Resource {
            directory: dir.clone(),
            name: "water".to_string(),
        };
        assert_eq!(source.resolve().unwrap(), dir.join("water.json"));

        std::fs::write(dir.join("water.yml"), "").unwrap();
        assert_eq!(source.resolve().unwrap(), dir.join("water.yml"));

        std::fs::write(dir.join("water.yaml"), "").unwrap();
        assert_eq!(source.resolve().unwrap(), dir.join("water.yaml"));
    }

    #[test]
    fn missing_resource_is_a_locate_error() {
        let dir = scratch_dir("missing");
        let err = DefinitionSource::Resource {
            directory: dir,
            name: "nothing_here".to_string(),
        }
        .resolve()
        .unwrap_err();
        assert!(matches!(err, ProjectError::Locate { .. }));
    }

    #[test]
    fn properties_name_the_directory() {
        let dir = scratch_dir("properties");
        let defs = dir.join("defs");
        std::fs::create_dir_all(&defs).unwrap();
        std::fs::write(defs.join("soil.yaml"), "").unwrap();
        std::fs::write(
            dir.join("project.properties"),
            "# definitions\nchemmisol_dir=defs\nother=1\n",
        )
        .unwrap();

        let source = DefinitionSource::Properties {
            file: dir.join("project.properties"),
            property: "chemmisol_dir".to_string(),
            name: "soil".to_string(),
        };
        assert_eq!(source.resolve().unwrap(), defs.join("soil.yaml"));

        let missing = DefinitionSource::Properties {
            file: dir.join("project.properties"),
            property: "unknown".to_string(),
            name: "soil".to_string(),
        };
        assert!(matches!(
            missing.resolve(),
            Err(ProjectError::Locate { .. })
        ));
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = scratch_dir("explicit");
        let source = DefinitionSource::from(dir.join("absent.yaml"));
        assert!(matches!(source.resolve(), Err(ProjectError::Locate { .. })));
    }
}
