use cm_project::{Chemmisol, DefinitionSource, FixedActivityDef, LATEST_VERSION};
use std::path::{Path, PathBuf};

fn systems_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../systems")
}

#[test]
fn bundled_definitions_load_and_validate() {
    for name in ["phosphate.yaml", "goethite.yaml", "acetic.json"] {
        let path = systems_dir().join(name);
        let project = cm_project::load_path(&path)
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        assert_eq!(project.version, LATEST_VERSION);
        cm_project::validate_project(&project)
            .unwrap_or_else(|e| panic!("Failed to validate {}: {}", name, e));
    }
}

#[test]
fn resource_lookup_by_name() {
    let project = Chemmisol::load_from_resource(systems_dir(), "phosphate").unwrap();
    let system = &project.systems[0];
    assert_eq!(system.id, "phosphate");
    assert_eq!(system.reactions.len(), 4);
    assert_eq!(
        system.fixed,
        vec![FixedActivityDef::Ph {
            value: 7.5,
            component: "H+".to_string()
        }]
    );

    // No yaml or yml: falls back to json
    let acetic = Chemmisol::load(&DefinitionSource::Resource {
        directory: systems_dir(),
        name: "acetic".to_string(),
    })
    .unwrap();
    assert_eq!(acetic.systems[0].max_iterations, Some(200));
}

#[test]
fn mineral_definition_parsed() {
    let project = Chemmisol::load_from_file(systems_dir().join("goethite.yaml")).unwrap();
    let mineral = project.systems[0].mineral.as_ref().unwrap();
    assert_eq!(mineral.surface_complex, "=SOH");
    assert_eq!(mineral.site_concentration_mol_per_m2, 3.82e-6);
}
