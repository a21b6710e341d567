use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use cm_core::Phase;
use cm_results::{
    ComponentValue, EquilibriumRecord, ReactionValue, ResultsError, RunManifest, RunStore,
    RunType, SpeciesValue,
};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn record(ph: f64) -> EquilibriumRecord {
    EquilibriumRecord {
        ph: Some(ph),
        iterations: 7,
        residual_norm: 1e-14,
        species: vec![SpeciesValue {
            name: "H+".to_string(),
            phase: Phase::Aqueous,
            concentration: 10f64.powf(-ph),
        }],
        components: vec![ComponentValue {
            name: "H+".to_string(),
            total_concentration: 10f64.powf(-ph),
            fixed: true,
        }],
        reactions: vec![ReactionValue {
            name: "OH-".to_string(),
            log_k: -14.0,
            log_quotient: -14.0,
        }],
    }
}

#[test]
fn save_list_load_roundtrip() {
    let project_dir = unique_temp_dir("cm_results_project");
    fs::create_dir_all(&project_dir).expect("failed to create temp project dir");
    let project_path = project_dir.join("water.yaml");
    fs::write(&project_path, "version: 2\nname: test\n").expect("failed to write project file");

    let store = RunStore::for_project(&project_path).expect("failed to create run store");
    assert!(store.root_dir().ends_with(".chemmisol/runs"));

    let manifest = RunManifest::now(
        "run-123".to_string(),
        "water",
        RunType::PhSweep {
            from: 4.0,
            to: 5.0,
            points: 2,
        },
        "0.1.0",
    );
    let records = vec![record(4.0), record(5.0)];

    assert!(!store.has_run("run-123"));
    store
        .save_run(&manifest, &records)
        .expect("failed to save run");
    assert!(store.has_run("run-123"));

    let runs = store.list_runs("water").expect("failed to list runs");
    assert_eq!(runs, vec![manifest.clone()]);
    assert!(store.list_runs("other").unwrap().is_empty());

    let loaded = store.load_records("run-123").expect("failed to load records");
    assert_eq!(loaded, records);
    assert_eq!(loaded[1].concentration("H+"), Some(10f64.powf(-5.0)));

    store.delete_run("run-123").unwrap();
    assert!(matches!(
        store.load_manifest("run-123"),
        Err(ResultsError::RunNotFound { .. })
    ));
}
