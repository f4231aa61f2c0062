//! Ember CLI - Run and check particle effects without a renderer

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{path, simulate, validate};

#[derive(Parser)]
#[command(name = "ember")]
#[command(about = "Headless driver for Ember particle effects", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an emitter for a number of frames and report statistics
    Simulate {
        /// Path to emitter config (.toml or .json)
        config: String,

        /// Number of frames to simulate
        #[arg(long, default_value = "300")]
        frames: u32,

        /// Seconds per frame
        #[arg(long, default_value = "0.016666668")]
        dt: f32,

        /// Override the config's random seed
        #[arg(long)]
        seed: Option<u32>,

        /// Print a JSON snapshot of the live particles
        #[arg(long)]
        json: bool,
    },

    /// Check that a config builds an emitter and list its behaviors
    Validate {
        /// Path to emitter config (.toml or .json)
        config: String,
    },

    /// Compile a path expression and tabulate it
    Path {
        /// Expression in x, e.g. "sin(x / 25) * 40"
        expression: String,

        /// First x value
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        from: f64,

        /// Last x value
        #[arg(long, default_value = "100", allow_hyphen_values = true)]
        to: f64,

        /// Number of intervals between --from and --to
        #[arg(long, default_value = "10")]
        steps: u32,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if cli.verbose > 0 {
        log::set_max_level(match cli.verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    }

    match cli.command {
        Commands::Simulate {
            config,
            frames,
            dt,
            seed,
            json,
        } => simulate::run(simulate::SimulateArgs {
            config,
            frames,
            dt,
            seed,
            json,
        }),
        Commands::Validate { config } => validate::run(&config),
        Commands::Path {
            expression,
            from,
            to,
            steps,
        } => path::run(path::PathArgs {
            expression,
            from,
            to,
            steps,
        }),
    }
}
