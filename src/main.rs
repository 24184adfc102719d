//! Command-line front end: analyze one assembly listing and write its IR.

use anyhow::{Context, Result};
use asmir::config::AnalyzerConfig;
use asmir::logging::{init_tracing, init_tracing_json};
use asmir::pipeline::{self, DEFAULT_OUTPUT};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "asmir")]
#[command(about = "Turn an assembly listing into a JSON feature IR")]
struct Args {
    /// Assembly listing to analyze
    input: PathBuf,

    /// Where to write the IR
    #[arg(default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// JSON file overriding thresholds, keyword sets and limits
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn execute(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => AnalyzerConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };

    let summary = pipeline::run(&args.input, &args.output, &config)
        .with_context(|| format!("Analysis of {} failed", args.input.display()))?;
    eprintln!("{}", summary);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    if args.log_json {
        init_tracing_json();
    } else {
        init_tracing();
    }

    match execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
