use clap::{Parser, Subcommand};
use cm_app::{
    AppError, AppResult, PhSweep, RunMode, RunOptions, RunProgressEvent, RunRequest,
    RunResponse, project_service, run_service,
};
use cm_project::DefinitionSource;
use cm_results::EquilibriumRecord;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "chemmisol")]
#[command(about = "Chemmisol CLI - Chemical equilibrium of aqueous and mineral systems", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate definition file syntax and structure
    Validate {
        /// Path to the definition file (YAML or JSON)
        project_path: PathBuf,
    },
    /// Resolve a definition from a resource directory or a properties file
    Locate {
        /// Definition name, without extension
        name: String,
        /// Directory holding the definition files
        #[arg(long, conflicts_with = "properties")]
        dir: Option<PathBuf>,
        /// Properties file naming the definition directory
        #[arg(long)]
        properties: Option<PathBuf>,
        /// Property holding the directory
        #[arg(long, default_value = "chemmisol_dir")]
        property: String,
    },
    /// List systems in a definition file
    Systems {
        /// Path to the definition file
        project_path: PathBuf,
    },
    /// Solve the equilibrium of a system
    Solve {
        /// Path to the definition file
        project_path: PathBuf,
        /// System ID to solve
        system_id: String,
        /// Override the fixed pH of the system
        #[arg(long)]
        ph: Option<f64>,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// Solve a system over a range of pH values
    Sweep {
        /// Path to the definition file
        project_path: PathBuf,
        /// System ID to solve
        system_id: String,
        /// First pH of the sweep
        #[arg(long)]
        from: f64,
        /// Last pH of the sweep
        #[arg(long)]
        to: f64,
        /// Number of pH points, both ends included
        #[arg(long, default_value_t = 11)]
        points: usize,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// List cached runs for a system
    Runs {
        /// Path to the definition file
        project_path: PathBuf,
        /// System ID to list runs for
        system_id: String,
    },
    /// Show details of a cached run
    ShowRun {
        /// Path to the definition file
        project_path: PathBuf,
        /// Run ID to display
        run_id: String,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Locate {
            name,
            dir,
            properties,
            property,
        } => cmd_locate(name, dir, properties, property),
        Commands::Systems { project_path } => cmd_systems(&project_path),
        Commands::Solve {
            project_path,
            system_id,
            ph,
            no_cache,
        } => cmd_solve(&project_path, &system_id, ph, !no_cache),
        Commands::Sweep {
            project_path,
            system_id,
            from,
            to,
            points,
            no_cache,
        } => cmd_sweep(&project_path, &system_id, from, to, points, !no_cache),
        Commands::Runs {
            project_path,
            system_id,
        } => cmd_runs(&project_path, &system_id),
        Commands::ShowRun {
            project_path,
            run_id,
        } => cmd_show_run(&project_path, &run_id),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating definitions: {}", project_path.display());
    let project = project_service::load_project(&DefinitionSource::from(project_path))?;
    project_service::validate_project(&project)?;
    println!("✓ Definitions are valid (version {})", project.version);
    Ok(())
}

fn cmd_locate(
    name: String,
    dir: Option<PathBuf>,
    properties: Option<PathBuf>,
    property: String,
) -> AppResult<()> {
    let source = match (dir, properties) {
        (Some(directory), _) => DefinitionSource::Resource { directory, name },
        (None, Some(file)) => DefinitionSource::Properties {
            file,
            property,
            name,
        },
        (None, None) => {
            return Err(AppError::InvalidInput(
                "Either --dir or --properties is required".to_string(),
            ));
        }
    };
    let path = source.resolve()?;
    let project = project_service::load_project(&source)?;
    println!("✓ {} ({} systems)", path.display(), project.systems.len());
    Ok(())
}

fn cmd_systems(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(&DefinitionSource::from(project_path))?;
    let systems = project_service::list_systems(&project);

    if systems.is_empty() {
        println!("No systems found");
    } else {
        println!("Systems in {}:", project.name);
        for sys in systems {
            let mut line = format!(
                "  {} - {} ({} components, {} reactions)",
                sys.id, sys.name, sys.component_count, sys.reaction_count
            );
            if sys.has_mineral {
                line.push_str("  mineral");
            }
            if !sys.fixed.is_empty() {
                line.push_str(&format!("  fixed: {}", sys.fixed.join(", ")));
            }
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_solve(
    project_path: &Path,
    system_id: &str,
    ph: Option<f64>,
    use_cache: bool,
) -> AppResult<()> {
    println!("Solving equilibrium of system: {}", system_id);

    let request = RunRequest {
        project_path,
        system_id,
        mode: RunMode::Equilibrium { ph },
        options: RunOptions {
            use_cache,
            ..RunOptions::default()
        },
    };
    let response = run_with_progress(&request)?;

    if let Some(record) = response.records.first() {
        print_record(record);
    }
    Ok(())
}

fn cmd_sweep(
    project_path: &Path,
    system_id: &str,
    from: f64,
    to: f64,
    points: usize,
    use_cache: bool,
) -> AppResult<()> {
    let sweep = PhSweep::new(from, to, points)?;
    println!(
        "Sweeping pH {:.2} to {:.2} ({} points) for system: {}",
        from, to, points, system_id
    );

    let request = RunRequest {
        project_path,
        system_id,
        mode: RunMode::PhSweep(sweep),
        options: RunOptions {
            use_cache,
            ..RunOptions::default()
        },
    };
    let response = run_with_progress(&request)?;
    print_sweep_table(&response.records);
    Ok(())
}

fn run_with_progress(request: &RunRequest) -> AppResult<RunResponse> {
    let mut last_emit = Instant::now();
    let mut last_stage = String::new();
    let response = run_service::ensure_run_with_progress(
        request,
        Some(&mut |event| {
            let stage_key = format!("{:?}", event.stage);
            let emit_now = stage_key != last_stage || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = stage_key;
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Run completed: {}", response.run_id);
    }
    tracing::debug!(elapsed_s = response.elapsed_wall_s, "Run finished");
    println!("  Elapsed: {:.3}s", response.elapsed_wall_s);
    Ok(response)
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    let spinner = ['|', '/', '-', '\\'];
    let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
    let mut line = format!(
        "\r{} {}  elapsed={:.2}s",
        spinner[spin_idx],
        event.stage.label(),
        event.elapsed_wall_s
    );
    if let Some(s) = &event.solve {
        if let Some(iter) = s.iteration {
            line.push_str(&format!("  iter={}", iter));
        }
        if let Some(residual) = s.residual_norm {
            line.push_str(&format!("  residual={:.3e}", residual));
        }
        if let Some((done, total)) = s.points {
            line.push_str(&format!("  points={}/{}", done, total));
        }
    }
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    print!("{}", line);
    let _ = io::stdout().flush();
}

fn print_record(record: &EquilibriumRecord) {
    if let Some(ph) = record.ph {
        println!("\npH: {:.3}", ph);
    }
    println!(
        "Iterations: {}  (residual {:.3e})",
        record.iterations, record.residual_norm
    );

    println!("\nSpecies:");
    for species in &record.species {
        println!(
            "  {:<16} {:<8} {:.6e}",
            species.name,
            species.phase.to_string(),
            species.concentration
        );
    }

    println!("\nComponents:");
    for component in &record.components {
        let marker = if component.fixed { "  fixed" } else { "" };
        println!(
            "  {:<16} total={:.6e}{}",
            component.name, component.total_concentration, marker
        );
    }

    if !record.reactions.is_empty() {
        println!("\nReactions:");
        for reaction in &record.reactions {
            println!(
                "  {:<16} log K={:>8.3}  log Q={:>8.3}",
                reaction.name, reaction.log_k, reaction.log_quotient
            );
        }
    }
}

fn print_sweep_table(records: &[EquilibriumRecord]) {
    let Some(first) = records.first() else {
        return;
    };
    let mut header = format!("\n{:>8}", "pH");
    for species in &first.species {
        header.push_str(&format!(" {:>14}", species.name));
    }
    println!("{}", header);

    for record in records {
        let mut row = match record.ph {
            Some(ph) => format!("{:>8.3}", ph),
            None => format!("{:>8}", "-"),
        };
        for species in &record.species {
            row.push_str(&format!(" {:>14.6e}", species.concentration));
        }
        println!("{}", row);
    }
}

fn cmd_runs(project_path: &Path, system_id: &str) -> AppResult<()> {
    let runs = run_service::list_runs(project_path, system_id)?;

    if runs.is_empty() {
        println!("No cached runs found for system: {}", system_id);
    } else {
        println!("Cached runs for system '{}':", system_id);
        for manifest in runs {
            println!(
                "  {} ({}) {:?}",
                manifest.run_id, manifest.timestamp, manifest.run_type
            );
        }
    }
    Ok(())
}

fn cmd_show_run(project_path: &Path, run_id: &str) -> AppResult<()> {
    println!("Loading run: {}", run_id);

    let (manifest, records) = run_service::load_run(project_path, run_id)?;
    println!("\nRun Summary:");
    println!("  System: {}", manifest.system_id);
    println!("  Type: {:?}", manifest.run_type);
    println!("  Solver version: {}", manifest.solver_version);
    println!("  Records: {}", records.len());

    match records.as_slice() {
        [record] => print_record(record),
        _ => print_sweep_table(&records),
    }
    Ok(())
}
