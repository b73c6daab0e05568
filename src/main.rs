//! Command line front end.
//!
//! - `train`: build a network, train it on CSV data, optionally hold out a
//!   validation split and save the result as JSON.
//! - `validate`: load a saved network and report metrics on CSV data.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use rust_bpnn::{
    Dataset, Metric, Network, NetworkBuilder, Rows, Shuffle, TracingObserver, TrainConfig,
    TrainContext, Trainer, ValidationReport,
};

#[derive(Parser)]
#[command(name = "rust-bpnn")]
#[command(version)]
#[command(about = "Train and validate backpropagation networks", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new network
    Train {
        /// Layer sizes, input layer first (e.g. 2,3,1)
        #[arg(short, long, value_delimiter = ',', required = true)]
        layers: Vec<usize>,

        /// CSV file with one input row per pattern
        #[arg(short, long)]
        inputs: PathBuf,

        /// CSV file with one target row per pattern
        #[arg(short, long)]
        targets: PathBuf,

        /// JSON training config; missing fields take defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the config's epoch limit
        #[arg(long)]
        max_epochs: Option<usize>,

        /// Override the config's convergence threshold
        #[arg(long)]
        target_mse: Option<f64>,

        /// Percentage of patterns kept for training; the rest is validated
        #[arg(long)]
        train_percent: Option<u32>,

        /// Seed for weight initialisation and the split
        #[arg(long)]
        seed: Option<u64>,

        /// Z-score input columns before training
        #[arg(long)]
        normalize: bool,

        /// Write the trained network here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a saved network
    Validate {
        /// Network JSON written by `train`
        #[arg(short, long)]
        model: PathBuf,

        /// CSV file with one input row per pattern
        #[arg(short, long)]
        inputs: PathBuf,

        /// CSV file with one target row per pattern
        #[arg(short, long)]
        targets: PathBuf,

        /// Z-score input columns before validating
        #[arg(long)]
        normalize: bool,
    },
}

fn setup_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init()
        .context("installing log subscriber")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level)?;

    match cli.command {
        Commands::Train {
            layers,
            inputs,
            targets,
            config,
            max_epochs,
            target_mse,
            train_percent,
            seed,
            normalize,
            output,
        } => {
            let mut cfg = match config {
                Some(path) => TrainConfig::from_json_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => TrainConfig::default(),
            };
            if let Some(n) = max_epochs {
                cfg.max_epochs = n;
            }
            if let Some(mse) = target_mse {
                cfg.target_mse = mse;
            }
            if let (Some(seed), Shuffle::Random) = (seed, cfg.shuffle) {
                cfg.shuffle = Shuffle::Seeded(seed);
            }

            let data = load_dataset(&inputs, &targets, normalize)?;
            let (train, validation) = match train_percent {
                Some(p) => {
                    let mut rng = match seed {
                        Some(s) => StdRng::seed_from_u64(s),
                        None => StdRng::from_entropy(),
                    };
                    let (train, validation) = data.split(p, &mut rng)?;
                    (train, Some(validation))
                }
                None => (data, None),
            };

            let builder = NetworkBuilder::new(&layers)?;
            let mut network = match seed {
                Some(s) => builder.build_with_seed(s),
                None => builder.build(),
            };

            let mut trainer = Trainer::new();
            trainer.subscribe(Box::new(TracingObserver));
            let ctx = TrainContext::new(cfg);

            let report = trainer.train(&mut network, &train, &ctx)?;
            println!(
                "{:?} after {} epochs, error {:.6}",
                report.outcome, report.epochs, report.final_error
            );

            if let Some(validation) = validation.filter(|v| !v.is_empty()) {
                let report = trainer.validate(&mut network, &validation, &ctx)?;
                print_metrics(&report);
            }

            if let Some(path) = output {
                network
                    .save_json(&path)
                    .with_context(|| format!("saving network to {}", path.display()))?;
                info!(path = %path.display(), "network saved");
            }
        }

        Commands::Validate {
            model,
            inputs,
            targets,
            normalize,
        } => {
            let mut network = Network::load_json(&model)
                .with_context(|| format!("loading network {}", model.display()))?;
            let data = load_dataset(&inputs, &targets, normalize)?;

            let mut trainer = Trainer::new();
            trainer.subscribe(Box::new(TracingObserver));
            let report = trainer.validate(&mut network, &data, &TrainContext::default())?;
            print_metrics(&report);
        }
    }

    Ok(())
}

fn load_dataset(inputs: &Path, targets: &Path, normalize: bool) -> Result<Dataset> {
    let mut xs = Rows::load_csv(inputs).with_context(|| format!("reading {}", inputs.display()))?;
    if normalize {
        xs = xs.normalized()?;
    }
    let ys = Rows::load_csv(targets).with_context(|| format!("reading {}", targets.display()))?;
    Ok(Dataset::new(xs, ys)?)
}

fn print_metrics(report: &ValidationReport) {
    println!("validated {} patterns", report.results.len());
    for metric in [Metric::Mse, Metric::Mae, Metric::BinaryAccuracy] {
        match metric.evaluate(&report.results) {
            Some(v) => println!("{:>16}: {v:.6}", metric.name()),
            None => println!("{:>16}: n/a", metric.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn every_subcommand_argument_has_help() {
        let cmd = Cli::command();
        for sub in cmd.get_subcommands() {
            for arg in sub.get_arguments() {
                if matches!(arg.get_id().as_str(), "help" | "version") {
                    continue;
                }
                assert!(
                    arg.get_help().is_some(),
                    "{} --{} has no help",
                    sub.get_name(),
                    arg.get_id()
                );
            }
        }
    }

    #[test]
    fn second_logging_setup_is_an_error() {
        let _ = setup_logging("warn");
        assert!(setup_logging("warn").is_err());
    }
}
