//! Load Forecast CLI
//!
//! A command-line tool for training, serving, and evaluating the
//! load forecasting pipeline on historical CSV data.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use load_forecast::data::load_records;
use load_forecast::model::{ForecastConfig, IntervalPolicy};
use load_forecast::ModelArtifact;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "load_forecast")]
#[command(about = "Electrical load forecasting with prediction intervals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model artifact on historical CSV data
    Train {
        /// Input CSV with Date, Load, Temperature, Hour columns
        #[arg(short, long)]
        file: PathBuf,

        /// Directory to write the trained artifact into
        #[arg(short, long, default_value = "models/latest")]
        out: PathBuf,

        /// Training epochs
        #[arg(long, default_value = "50")]
        epochs: usize,

        /// Mini-batch size
        #[arg(long, default_value = "32")]
        batch_size: usize,

        /// RNG seed for reproducible training
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Forecast a single future point from a saved artifact
    Predict {
        /// Directory holding the trained artifact
        #[arg(short, long, default_value = "models/latest")]
        model: PathBuf,

        /// Ambient temperature in Celsius
        #[arg(short, long)]
        temperature: f64,

        /// Hour of day (0-23)
        #[arg(long)]
        hour: u32,

        /// Forecast date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Collapse inverted intervals onto the point estimate
        #[arg(long)]
        clamp: bool,
    },

    /// Evaluate a saved artifact against historical CSV data
    Evaluate {
        /// Directory holding the trained artifact
        #[arg(short, long, default_value = "models/latest")]
        model: PathBuf,

        /// Input CSV with observed loads
        #[arg(short, long)]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Train {
            file,
            out,
            epochs,
            batch_size,
            seed,
        } => {
            println!("{}", "=".repeat(60).blue());
            println!("{}", "Load Forecast Training".bold().blue());
            println!("{}", "=".repeat(60).blue());

            let records = load_records(&file)
                .with_context(|| format!("failed to load {}", file.display()))?;
            info!(rows = records.len(), "historical records loaded");

            let mut config = ForecastConfig {
                epochs,
                batch_size,
                ..ForecastConfig::default()
            };
            if let Some(seed) = seed {
                config.lstm = config.lstm.clone().with_seed(seed);
            }

            let (artifact, history) = ModelArtifact::train(&records, &config)?;
            artifact.save(&out)?;

            println!("\n{}", "Training complete".green());
            if let Some(loss) = history.final_loss() {
                println!("  Final train loss (scaled): {:.6}", loss);
            }
            if let Some(val) = history.val_loss.last() {
                println!("  Final validation loss (scaled): {:.6}", val);
            }
            println!("  Artifact written to: {}", out.display());
        }

        Commands::Predict {
            model,
            temperature,
            hour,
            date,
            clamp,
        } => {
            let policy = if clamp {
                IntervalPolicy::Clamp
            } else {
                IntervalPolicy::Flag
            };
            let artifact = ModelArtifact::load(&model, policy)
                .with_context(|| format!("failed to load artifact from {}", model.display()))?;

            let forecast = artifact.predict_single(temperature, hour, &date)?;

            println!("{}", "Load Forecast".bold().blue());
            println!("{:-<40}", "");
            println!("  Date:            {}", date);
            println!("  Hour:            {}", hour);
            println!("  Temperature:     {:.1} C", temperature);
            println!(
                "  Predicted load:  {}",
                format!("{:.2}", forecast.predicted_load).green()
            );
            println!("  Interval:        {}", forecast.confidence_interval());
            if forecast.interval_inverted {
                println!("  {}", "Warning: interval bounds were inverted".yellow());
            }
        }

        Commands::Evaluate { model, file } => {
            let artifact = ModelArtifact::load(&model, IntervalPolicy::Flag)
                .with_context(|| format!("failed to load artifact from {}", model.display()))?;
            let records = load_records(&file)
                .with_context(|| format!("failed to load {}", file.display()))?;

            let report = artifact.evaluate_records(&records)?;

            println!("{}", "Evaluation Report".bold().blue());
            println!("{:-<40}", "");
            for (name, value) in report.to_map() {
                println!("  {:<20} {:>12.4}", name, value);
            }
            for anomaly in &report.anomalies {
                println!("  {}", anomaly.yellow());
            }
            println!("\n{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
