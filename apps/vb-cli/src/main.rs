use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vb_compose::{ComposeError, ComposeResult, build_engine, load_experiment};
use vb_core::Process;
use vb_flux::FluxBoundsConverter;
use vb_project::ProcessKind;
use vb_sim::{BackendRegistry, SimulatorProcess};

#[derive(Parser)]
#[command(name = "vb-cli")]
#[command(about = "vivbridge CLI - compose simulator processes and run experiments", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an experiment file
    Validate {
        /// Path to the experiment YAML or JSON file
        experiment: PathBuf,
    },
    /// Show the port assignment and initial snapshot of one process
    Ports {
        /// Path to the experiment YAML or JSON file
        experiment: PathBuf,
        /// Process ID within the experiment
        process: String,
    },
    /// Run an experiment
    Run {
        /// Path to the experiment YAML or JSON file
        experiment: PathBuf,
        /// Simulated time to run (defaults to the file's total_time)
        #[arg(long)]
        total_time: Option<f64>,
        /// Output file for the emitted series (.json or .csv, defaults to CSV on stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ComposeResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = vb_backends::reference_registry();

    match cli.command {
        Commands::Validate { experiment } => cmd_validate(&experiment),
        Commands::Ports {
            experiment,
            process,
        } => cmd_ports(&experiment, &process, &registry),
        Commands::Run {
            experiment,
            total_time,
            output,
        } => cmd_run(&experiment, total_time, output.as_deref(), &registry),
    }
}

fn cmd_validate(path: &Path) -> ComposeResult<()> {
    println!("Validating experiment: {}", path.display());
    let experiment = load_experiment(path)?;
    println!(
        "✓ Experiment '{}' is valid ({} processes, {} wiring entries)",
        experiment.name,
        experiment.processes.len(),
        experiment.topology.len()
    );
    Ok(())
}

fn cmd_ports(path: &Path, process_id: &str, registry: &BackendRegistry) -> ComposeResult<()> {
    let experiment = load_experiment(path)?;
    let def = experiment
        .process(process_id)
        .ok_or_else(|| ComposeError::UnknownProcess(process_id.to_string()))?;

    let snapshot = match &def.kind {
        ProcessKind::Simulator { config } => {
            let process = SimulatorProcess::new(&def.id, config.clone(), registry)?;
            print_ports(&process);
            process.initial_state()
        }
        ProcessKind::FluxBounds { producer, bounds } => {
            let producer = SimulatorProcess::new(&def.id, producer.clone(), registry)?;
            print_ports(&producer);
            let converter = FluxBoundsConverter::new(producer, bounds.clone())?;
            println!("  bounds port '{}' (set):", bounds.bounds_port);
            for id in bounds.bound_ids() {
                println!("    {id}");
            }
            converter.initial_state()
        }
    };

    println!("Initial snapshot:");
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn print_ports(process: &SimulatorProcess) {
    println!(
        "Process '{}' ({} via {}):",
        process.name(),
        process.config().simulation,
        process.runner().backend_name()
    );
    for (direction, ports) in [("input", process.input_ports()), ("output", process.output_ports())] {
        for (port, variables) in ports.iter() {
            println!("  {direction} port '{port}' ({} variables):", variables.len());
            for id in variables {
                println!("    {id}");
            }
        }
    }
}

fn cmd_run(
    path: &Path,
    total_time: Option<f64>,
    output: Option<&Path>,
    registry: &BackendRegistry,
) -> ComposeResult<()> {
    let experiment = load_experiment(path)?;
    let total_time = total_time.unwrap_or(experiment.total_time);
    println!(
        "Running '{}' for {} (time step {})",
        experiment.name, total_time, experiment.time_step
    );

    let start = Instant::now();
    let mut engine = build_engine(&experiment, registry)?;
    let series = engine.run(total_time)?;
    let elapsed = start.elapsed().as_secs_f64();
    println!(
        "✓ Completed {} records, {} series in {:.3}s",
        series.len(),
        series.columns.len(),
        elapsed
    );

    match output {
        Some(file) => {
            let writer = BufWriter::new(File::create(file)?);
            match file.extension().and_then(|e| e.to_str()) {
                Some("json") => series.write_json(writer)?,
                _ => series.write_csv(writer)?,
            }
            println!("Wrote {}", file.display());
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            series.write_csv(&mut lock)?;
            lock.flush()?;
        }
    }
    Ok(())
}
