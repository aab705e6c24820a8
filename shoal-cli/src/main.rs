use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shoal_cli::{load_scene, run, RunOptions};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless flocking simulation runner", long_about = None)]
struct Args {
    /// Scene file (JSON). Runs the default scene when omitted
    #[arg(short, long)]
    scene: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    /// Fixed time step in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Write a frame every N ticks (0: only the final frame)
    #[arg(short, long, default_value_t = 1)]
    every: u64,

    /// Use a spatial grid for neighbor queries
    #[arg(short, long)]
    grid: bool,

    /// Include avoidance probe rays in each frame
    #[arg(long)]
    probes: bool,

    /// Output file for JSON-lines frames (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    log::info!("Shoal runner starting...");

    let scene = load_scene(args.scene.as_deref())?;
    let options = RunOptions {
        ticks: args.ticks,
        dt: args.dt,
        every: args.every,
        use_grid: args.grid,
        probes: args.probes,
    };

    let mut rng = match args.seed {
        Some(seed) => {
            log::info!("Seed: {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let summary = run(&scene, &options, &mut rng, &mut out).context("Simulation error")?;

    log::info!(
        "Finished {} ticks ({:.2}s simulated), {} frames written",
        summary.ticks,
        summary.sim_time,
        summary.frames
    );
    log::debug!("Summary: {}", serde_json::to_string(&summary)?);

    Ok(())
}
