use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use cm_app::{PhSweep, RunMode, RunOptions, RunRequest, RunStage, run_service};
use cm_results::RunStore;

/// Copy a bundled definition into a fresh directory so runs land there.
fn scratch_definition(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("cm_app_{}_{}", name, nanos));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    let source = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../systems")
        .join(name);
    let target = dir.join(name);
    fs::copy(source, &target).expect("failed to copy definition");
    target
}

fn request<'a>(path: &'a Path, system_id: &'static str, mode: RunMode) -> RunRequest<'a> {
    RunRequest {
        project_path: path,
        system_id,
        mode,
        options: RunOptions::default(),
    }
}

#[test]
fn equilibrium_run_is_cached() {
    let path = scratch_definition("phosphate.yaml");
    let req = request(&path, "phosphate", RunMode::Equilibrium { ph: None });

    let first = run_service::ensure_run(&req).expect("equilibrium run failed");
    assert!(!first.loaded_from_cache);
    assert_eq!(first.records.len(), 1);

    let record = &first.records[0];
    assert!((record.ph.unwrap() - 7.5).abs() < 1e-9);
    let total: f64 = ["PO4-3", "HPO4-2", "H2PO4-", "H3PO4"]
        .iter()
        .map(|s| record.concentration(s).unwrap())
        .sum();
    assert!((total - 0.1).abs() / 0.1 < 1e-9);
    for reaction in &record.reactions {
        assert!((reaction.log_quotient - reaction.log_k).abs() < 1e-9);
    }

    let second = run_service::ensure_run(&req).expect("cached run failed");
    assert!(second.loaded_from_cache);
    assert_eq!(second.run_id, first.run_id);
    assert_eq!(second.records, first.records);

    let store = RunStore::for_project(&path).unwrap();
    assert!(store.has_run(&first.run_id));
}

#[test]
fn ph_override_changes_run_id() {
    let path = scratch_definition("phosphate.yaml");
    let default = run_service::ensure_run(&request(
        &path,
        "phosphate",
        RunMode::Equilibrium { ph: None },
    ))
    .unwrap();
    let acidic = run_service::ensure_run(&request(
        &path,
        "phosphate",
        RunMode::Equilibrium { ph: Some(4.0) },
    ))
    .unwrap();

    assert_ne!(default.run_id, acidic.run_id);
    assert!((acidic.records[0].ph.unwrap() - 4.0).abs() < 1e-9);

    let runs = run_service::list_runs(&path, "phosphate").unwrap();
    assert_eq!(runs.len(), 2);
}

#[test]
fn ph_sweep_runs_in_order() {
    let path = scratch_definition("goethite.yaml");
    let sweep = PhSweep::new(4.0, 10.0, 7).unwrap();
    let response =
        run_service::ensure_run(&request(&path, "goethite", RunMode::PhSweep(sweep))).unwrap();

    let phs: Vec<f64> = response.records.iter().map(|r| r.ph.unwrap()).collect();
    assert_eq!(phs, sweep.generate_points());

    // Protonated sites decrease as the pH rises
    let protonated: Vec<f64> = response
        .records
        .iter()
        .map(|r| r.concentration("=SOH2+").unwrap())
        .collect();
    assert!(protonated.windows(2).all(|w| w[0] > w[1]));

    for record in &response.records {
        let sites: f64 = ["=SOH", "=SOH2+", "=SO-"]
            .iter()
            .map(|s| record.concentration(s).unwrap())
            .sum();
        assert!((sites - 1.0).abs() < 1e-9);
    }

    let (manifest, records) = run_service::load_run(&path, &response.run_id).unwrap();
    assert_eq!(manifest.system_id, "goethite");
    assert_eq!(records, response.records);
}

#[test]
fn progress_reaches_completion() {
    let path = scratch_definition("acetic.json");
    let req = RunRequest {
        options: RunOptions {
            use_cache: false,
            ..RunOptions::default()
        },
        ..request(&path, "acetic", RunMode::Equilibrium { ph: None })
    };

    let mut stages = Vec::new();
    let mut iterations = 0;
    let response = run_service::ensure_run_with_progress(
        &req,
        Some(&mut |event| {
            if event.stage == RunStage::Solving {
                iterations += 1;
            }
            stages.push(event.stage);
        }),
    )
    .unwrap();

    assert_eq!(stages.first(), Some(&RunStage::LoadingProject));
    assert_eq!(stages.last(), Some(&RunStage::Completed));
    assert!(iterations > 0);

    // Free H+ in 0.1 mol/l acetic acid
    let ph = response.records[0].ph.unwrap();
    assert!((ph - 2.883).abs() < 0.01, "pH = {ph}");
}

#[test]
fn unknown_system_rejected() {
    let path = scratch_definition("phosphate.yaml");
    let err = run_service::ensure_run(&request(
        &path,
        "nothing",
        RunMode::Equilibrium { ph: None },
    ))
    .unwrap_err();
    assert!(matches!(err, cm_app::AppError::SystemNotFound(_)));
}
