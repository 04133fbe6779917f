use clap::{Parser, ValueEnum};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use labtrack::{import, registry, report};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Json,
    Text,
}

/// Import lab inventory dumps and report per-pod address usage
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Lab dump to import (JSON or YAML); may be repeated
    #[arg(short, long, required = true)]
    input: Vec<PathBuf>,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Json)]
    format: ReportFormat,

    /// Seed for reproducible pod and device ids
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!("Starting labtrack with {} dump(s)", args.input.len());

    let labs = registry::in_memory(args.seed);
    for path in &args.input {
        let lab = import::import_file(&labs, path)?;
        info!("Imported lab {} from {:?}", lab.id, path);
    }

    let inventory = report::build_report(&labs).wrap_err("Failed to build address report")?;

    match (args.format, &args.output) {
        (ReportFormat::Json, Some(path)) => report::generate_json_report(&inventory, path)?,
        (ReportFormat::Json, None) => {
            let json = serde_json::to_string_pretty(&inventory)
                .wrap_err("Failed to serialize report to JSON")?;
            println!("{}", json);
        }
        (ReportFormat::Text, Some(path)) => {
            std::fs::write(path, report::render_text_report(&inventory))
                .wrap_err_with(|| format!("Failed to write text report to {}", path.display()))?;
            info!("Text report written to {}", path.display());
        }
        (ReportFormat::Text, None) => println!("{}", report::render_text_report(&inventory)),
    }

    info!("Report covers {} lab(s)", inventory.labs.len());
    Ok(())
}
