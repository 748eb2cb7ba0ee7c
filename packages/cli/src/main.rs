#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for scoring civic issue reports.

use std::path::{Path, PathBuf};

use civic_triage_cli::{RawReport, resolve_config, score_batch, score_report};
use civic_triage_severity::{SeverityFusionEngine, summarize};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "civic_triage", about = "Civic issue severity scoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    /// TOML engine config (`use_trained_model`, `model_path`)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Predictor artifact, overriding the config file
    #[arg(long)]
    model_path: Option<PathBuf>,
    /// Never consult the trained predictor
    #[arg(long)]
    rule_based_only: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single report JSON file
    Score {
        /// Path to the report JSON
        report: PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Score a JSON array of reports and print a summary
    Batch {
        /// Path to the JSON array of reports
        reports: PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Show whether a trained predictor is loaded and what it expects
    ModelInfo {
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Run the text analyzer on a description
    Text {
        /// Report description
        description: String,
    },
}

#[derive(Serialize)]
struct BatchOutput<T, S> {
    results: Vec<T>,
    summary: S,
}

fn build_engine(args: EngineArgs) -> Result<SeverityFusionEngine, Box<dyn std::error::Error>> {
    let config = resolve_config(args.config.as_deref(), args.model_path, args.rule_based_only)?;
    log::debug!(
        "Engine config: use_trained_model={} model_path={}",
        config.use_trained_model,
        config.model_path.display()
    );
    Ok(SeverityFusionEngine::new(config)?)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse {}: {e}", path.display()))?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Score { report, engine } => {
            let engine = build_engine(engine)?;
            let report: RawReport = read_json(&report)?;
            let result = score_report(&engine, report)?;
            log::info!(
                "Scored report: {} ({}) via {}",
                result.score,
                result.category,
                result.prediction_method
            );
            print_json(&result)?;
        }
        Commands::Batch { reports, engine } => {
            let engine = build_engine(engine)?;
            let reports: Vec<RawReport> = read_json(&reports)?;
            let total = reports.len();
            let scored = score_batch(&engine, reports);
            let results: Vec<_> = scored.iter().filter_map(|s| s.result.clone()).collect();
            log::info!("Scored {}/{total} reports", results.len());
            print_json(&BatchOutput {
                summary: summarize(&results),
                results: scored,
            })?;
        }
        Commands::ModelInfo { engine } => {
            let engine = build_engine(engine)?;
            print_json(&engine.model_info())?;
        }
        Commands::Text { description } => {
            print_json(&civic_triage_text::analyze(Some(&description)))?;
        }
    }

    Ok(())
}
