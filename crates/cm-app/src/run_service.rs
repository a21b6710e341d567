//! Run execution and caching service.

use std::path::Path;
use std::time::Instant;

use cm_project::DefinitionSource;
use cm_project::schema::SystemDef;
use cm_results::{EquilibriumRecord, RunManifest, RunStore, RunType};
use cm_solver::SolveProgressEvent;
use rayon::prelude::*;

use crate::build::build_system_with_ph;
use crate::error::AppResult;
use crate::progress::{RunProgressEvent, RunStage, SolveProgress};
use crate::project_service;
use crate::record::record_equilibrium;
use crate::sweep::PhSweep;

/// Run mode specification.
#[derive(Debug, Clone, PartialEq)]
pub enum RunMode {
    /// Single equilibrium, with an optional pH override.
    Equilibrium { ph: Option<f64> },
    PhSweep(PhSweep),
}

impl RunMode {
    fn run_type(&self) -> RunType {
        match self {
            RunMode::Equilibrium { ph } => RunType::Equilibrium { ph: *ph },
            RunMode::PhSweep(sweep) => RunType::PhSweep {
                from: sweep.from,
                to: sweep.to,
                points: sweep.points,
            },
        }
    }
}

/// Options for running equilibria.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub solver_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            solver_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub project_path: &'a Path,
    pub system_id: &'a str,
    pub mode: RunMode,
    pub options: RunOptions,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub records: Vec<EquilibriumRecord>,
    pub loaded_from_cache: bool,
    pub elapsed_wall_s: f64,
}

type ProgressCallback<'a> = Option<&'a mut dyn FnMut(RunProgressEvent)>;

fn emit_progress(
    progress_cb: &mut ProgressCallback<'_>,
    mode: &RunMode,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
    solve: Option<SolveProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            mode: mode.clone(),
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
            solve,
        });
    }
}

/// Execute or load a run based on request.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute or load a run and stream progress events.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: ProgressCallback<'_>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mode = &request.mode;

    emit_progress(
        &mut progress_cb,
        mode,
        RunStage::LoadingProject,
        started,
        Some("Loading project".to_string()),
        None,
    );
    let project = project_service::load_project(&DefinitionSource::File(
        request.project_path.to_path_buf(),
    ))?;
    let system = project_service::get_system(&project, request.system_id)?;

    emit_progress(
        &mut progress_cb,
        mode,
        RunStage::CheckingCache,
        started,
        Some("Checking run cache".to_string()),
        None,
    );
    let run_type = mode.run_type();
    let run_id =
        cm_results::compute_run_id(system, &run_type, &request.options.solver_version)?;
    let store = RunStore::for_project(request.project_path)?;

    if request.options.use_cache && store.has_run(&run_id) {
        emit_progress(
            &mut progress_cb,
            mode,
            RunStage::LoadingCachedResult,
            started,
            Some("Loading cached run".to_string()),
            None,
        );
        let manifest = store.load_manifest(&run_id)?;
        let records = store.load_records(&run_id)?;
        tracing::info!(run_id = run_id.as_str(), "Loaded cached run");

        emit_progress(
            &mut progress_cb,
            mode,
            RunStage::Completed,
            started,
            Some("Loaded cached run".to_string()),
            None,
        );
        return Ok(RunResponse {
            run_id,
            manifest,
            records,
            loaded_from_cache: true,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
        });
    }

    let records = match mode {
        RunMode::Equilibrium { ph } => vec![execute_equilibrium(
            system,
            *ph,
            mode,
            &mut progress_cb,
            started,
        )?],
        RunMode::PhSweep(sweep) => execute_sweep(system, sweep, mode, &mut progress_cb, started)?,
    };

    emit_progress(
        &mut progress_cb,
        mode,
        RunStage::SavingResults,
        started,
        Some("Saving results".to_string()),
        None,
    );
    let manifest = RunManifest::now(
        run_id.clone(),
        system.id.clone(),
        run_type,
        request.options.solver_version.clone(),
    );
    store.save_run(&manifest, &records)?;

    emit_progress(
        &mut progress_cb,
        mode,
        RunStage::Completed,
        started,
        Some("Run completed".to_string()),
        None,
    );
    tracing::info!(
        run_id = run_id.as_str(),
        records = records.len(),
        "Run completed"
    );

    Ok(RunResponse {
        run_id,
        manifest,
        records,
        loaded_from_cache: false,
        elapsed_wall_s: started.elapsed().as_secs_f64(),
    })
}

fn execute_equilibrium(
    def: &SystemDef,
    ph: Option<f64>,
    mode: &RunMode,
    progress_cb: &mut ProgressCallback<'_>,
    started: Instant,
) -> AppResult<EquilibriumRecord> {
    emit_progress(
        progress_cb,
        mode,
        RunStage::BuildingSystem,
        started,
        Some(format!("Building system '{}'", def.id)),
        None,
    );
    let mut system = build_system_with_ph(def, ph)?;

    system.solve_with_progress(&mut |event| {
        if let SolveProgressEvent::NewtonIteration {
            iteration,
            max_iterations,
            residual_norm,
            ..
        } = event
        {
            emit_progress(
                progress_cb,
                mode,
                RunStage::Solving,
                started,
                None,
                Some(SolveProgress {
                    iteration: Some(iteration),
                    max_iterations: Some(max_iterations),
                    residual_norm: Some(residual_norm),
                    points: None,
                }),
            );
        }
    })?;

    let record = record_equilibrium(&system)?;
    system.close();
    Ok(record)
}

/// Solve every pH of the sweep in parallel, each point from a fresh system.
fn execute_sweep(
    def: &SystemDef,
    sweep: &PhSweep,
    mode: &RunMode,
    progress_cb: &mut ProgressCallback<'_>,
    started: Instant,
) -> AppResult<Vec<EquilibriumRecord>> {
    let points = sweep.generate_points();
    emit_progress(
        progress_cb,
        mode,
        RunStage::Solving,
        started,
        Some(format!("Solving {} pH points", points.len())),
        Some(SolveProgress {
            points: Some((0, points.len())),
            ..SolveProgress::default()
        }),
    );

    let records = points
        .par_iter()
        .map(|&ph| solve_point(def, ph))
        .collect::<AppResult<Vec<_>>>()?;

    emit_progress(
        progress_cb,
        mode,
        RunStage::Solving,
        started,
        None,
        Some(SolveProgress {
            points: Some((records.len(), points.len())),
            ..SolveProgress::default()
        }),
    );
    Ok(records)
}

fn solve_point(def: &SystemDef, ph: f64) -> AppResult<EquilibriumRecord> {
    let mut system = build_system_with_ph(def, Some(ph))?;
    system.solve()?;
    let mut record = record_equilibrium(&system)?;
    record.ph = Some(ph);
    tracing::debug!(ph, iterations = record.iterations, "Sweep point solved");
    Ok(record)
}

/// List runs for a system, most recent first.
pub fn list_runs(project_path: &Path, system_id: &str) -> AppResult<Vec<RunManifest>> {
    let store = RunStore::for_project(project_path)?;
    let mut runs = store.list_runs(system_id)?;
    runs.reverse();
    Ok(runs)
}

/// Load a specific run.
pub fn load_run(
    project_path: &Path,
    run_id: &str,
) -> AppResult<(RunManifest, Vec<EquilibriumRecord>)> {
    let store = RunStore::for_project(project_path)?;
    let manifest = store.load_manifest(run_id)?;
    let records = store.load_records(run_id)?;
    Ok((manifest, records))
}
