//! fdmux CLI - frequency-division multiplexing over audio files
//!
//! This binary runs the modulate / multiplex / demodulate chain on a set of
//! WAV inputs and provides helpers for checking configurations and filters.

use clap::{ArgAction, Parser, Subcommand};
use std::process::ExitCode;

// Use modules from the library crate
use fdmux_cli::commands;

/// fdmux - FDM Multiplexing Simulator
#[derive(Parser)]
#[command(name = "fdmux")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Multiplex the inputs, recover every channel, and write the results
    Run {
        /// Path to the JSON run configuration (default: built-in defaults)
        #[arg(short, long)]
        config: Option<String>,

        /// Input WAV file; repeat once per channel to override the configured inputs
        #[arg(short, long = "input")]
        inputs: Vec<String>,

        /// Output directory
        #[arg(short, long, default_value = "out")]
        out_dir: String,

        /// Skip diagnostic plots
        #[arg(long)]
        no_plots: bool,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Validate a run configuration without processing any audio
    Validate {
        /// Path to the JSON run configuration
        #[arg(short, long)]
        config: String,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Print Butterworth low-pass coefficients and response
    Design {
        /// Filter order
        #[arg(long, default_value_t = fdmux_spec::DEFAULT_FILTER_ORDER)]
        order: usize,

        /// Cutoff frequency in Hz
        #[arg(long, default_value_t = fdmux_spec::DEFAULT_FILTER_CUTOFF_HZ)]
        cutoff: f64,

        /// Sample rate in Hz
        #[arg(long, default_value_t = fdmux_spec::DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            inputs,
            out_dir,
            no_plots,
            json,
        } => commands::run::run(config.as_deref(), &inputs, &out_dir, no_plots, json),
        Commands::Validate { config, json } => commands::validate::run(&config, json),
        Commands::Design {
            order,
            cutoff,
            sample_rate,
            json,
        } => commands::design::run(order, cutoff, sample_rate, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
