//! Galvana command-line interface.
//!
//! Drive coupling runs from TOML configuration files:
//! ```sh
//! galvana run job.toml
//! galvana validate job.toml --analytic
//! galvana inspect profile exported.txt
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "galvana")]
#[command(about = "Galvana: field-transfer bridge for hybrid nerve-stimulation models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a mapping job from a TOML configuration file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Also sample the field on the configured `[plane]` and write it as CSV.
        #[arg(long)]
        emit_plane: bool,
    },
    /// Check a job's inputs and coverage without writing any outputs.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Cross-check the interpolant against an analytic point source.
        #[arg(long)]
        analytic: bool,
    },
    /// Summarise a bridge file without running anything.
    Inspect {
        #[command(subcommand)]
        target: InspectTarget,
    },
}

#[derive(Subcommand)]
enum InspectTarget {
    /// An exported field profile.
    Profile {
        /// Path to the profile file.
        path: PathBuf,
    },
    /// A positional resistance store.
    Store {
        /// Path to the store file.
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, emit_plane } => {
            println!("Galvana field-transfer bridge");
            println!("=============================");
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());

            runner::run(&job, emit_plane)?;

            println!("Mapping complete.");
            Ok(())
        }
        Commands::Validate { config, analytic } => {
            let job = config::load_config(&config)?;
            runner::validate(&job, analytic)
        }
        Commands::Inspect { target } => match target {
            InspectTarget::Profile { path } => runner::inspect_profile(&path),
            InspectTarget::Store { path } => runner::inspect_store(&path),
        },
    }
}
