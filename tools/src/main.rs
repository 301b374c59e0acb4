use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use deltasnap_tools::{
    builtin_manager, format_inspect_pretty, inspect_frame, run_simulation, InspectReport,
    SimulationConfig,
};
use serde::Serialize;
use snapshot::{SnapshotConfig, SnapshotLimits};

#[derive(Parser)]
#[command(
    name = "deltasnap-tools",
    version,
    about = "deltasnap frame inspection and simulation tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode snapshot frames and summarize their slices.
    Inspect {
        /// A frame file, a directory of frames, or a glob pattern.
        path: String,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
    /// Run a server and client over the loopback transport and print statistics as JSON.
    Simulate {
        /// Number of replicated entities.
        #[arg(long, default_value_t = 64)]
        entities: usize,
        /// Number of ticks to simulate.
        #[arg(long, default_value_t = 300)]
        ticks: u32,
        /// RNG seed for deterministic results.
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Chance, in percent, that an entity moves on a tick.
        #[arg(long, default_value_t = 25)]
        move_percent: u32,
        /// Optional snapshot config JSON.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write every frame to this directory.
        #[arg(long)]
        dump_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Serialize)]
struct InspectedFrame {
    path: PathBuf,
    report: InspectReport,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match cli.command {
        Command::Inspect { path, format } => {
            let paths = collect_frame_paths(&path)?;
            let catalog = builtin_manager()?;
            let wire_limits = wire::Limits::default();
            let limits = SnapshotLimits::default();
            let mut frames = Vec::with_capacity(paths.len());
            for path in paths {
                let bytes =
                    fs::read(&path).with_context(|| format!("read frame {}", path.display()))?;
                let report = inspect_frame(&bytes, &wire_limits, &limits, &catalog)
                    .with_context(|| format!("inspect {}", path.display()))?;
                frames.push(InspectedFrame { path, report });
            }
            match format {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&frames).context("serialize json")?;
                    println!("{json}");
                }
                OutputFormat::Pretty => {
                    for frame in &frames {
                        println!(
                            "== {} ({} bytes) ==",
                            frame.path.display(),
                            frame.report.frame.wire_bytes
                        );
                        print!("{}", format_inspect_pretty(&frame.report));
                    }
                }
            }
        }
        Command::Simulate {
            entities,
            ticks,
            seed,
            move_percent,
            config,
            dump_dir,
        } => {
            let snapshot = config
                .as_deref()
                .map(load_config)
                .transpose()
                .context("load snapshot config")?
                .unwrap_or_default();
            let config = SimulationConfig {
                entities,
                ticks,
                seed,
                move_percent,
                snapshot,
            };
            let summary = run_simulation(&config, dump_dir.as_deref())?;
            let json = serde_json::to_string_pretty(&summary).context("serialize summary")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<SnapshotConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    serde_json::from_str(&contents).context("parse config json")
}

/// Resolves a file, a directory (sorted by name) or a glob pattern.
fn collect_frame_paths(input: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(input);
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut paths = Vec::new();
    if path.is_dir() {
        for entry in fs::read_dir(path).with_context(|| format!("read dir {}", path.display()))? {
            let entry_path = entry?.path();
            if entry_path.is_file() {
                paths.push(entry_path);
            }
        }
    } else {
        for entry in glob::glob(input).context("invalid glob pattern")? {
            let entry_path = entry.context("read glob entry")?;
            if entry_path.is_file() {
                paths.push(entry_path);
            }
        }
    }
    paths.sort();
    if paths.is_empty() {
        anyhow::bail!("no frames found at {input}");
    }
    Ok(paths)
}
