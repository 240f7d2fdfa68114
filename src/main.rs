//! # quality-unwrap CLI
//!
//! Command-line interface for the quality-unwrap library.
//! Reads a JSON phase field, unwraps it from a seed, writes the result as JSON.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info, LevelFilter};
use quality_unwrap::{PhaseField, QualityOrder, UnwrapConfig, UnwrappedField};

mod cli;

/// Command-line interface for quality-unwrap
#[derive(Parser)]
#[command(name = "quality-unwrap")]
#[command(about = "Quality-guided phase unwrapping of N-dimensional grids")]
#[command(long_about = "Unwraps a JSON phase field by region growing from a seed:
  quality-unwrap field.json                     # Write result to stdout
  quality-unwrap field.json out.json --seed 3,4 # Seed at x=3, y=4
  quality-unwrap field.json - --order higher    # Quality is a reliability score

Input format:
  {\"extent\": [nx, ny], \"phase\": [...], \"quality\": [...], \"seed\": [x, y]}
  Samples are stored with the first axis varying fastest.")]
#[command(version = env!("QUALITY_UNWRAP_VERSION"))]
struct Cli {
    /// Input phase field (JSON)
    #[arg(value_name = "INPUT_FILE")]
    input: PathBuf,

    /// Output file path, or "-" for stdout
    #[arg(default_value = "")]
    output: String,

    /// Seed coordinates, comma separated; overrides the seed in the input
    #[arg(long, value_name = "X,Y,..")]
    seed: Option<String>,

    /// Quality convention: "lower" (variance-like) or "higher" (score-like)
    #[arg(long)]
    order: Option<QualityOrder>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Wrap the input phase into [0, 2π) before unwrapping
    #[arg(long)]
    wrap_input: bool,

    /// Wrap the resolved phase into [0, 2π) afterwards
    #[arg(long)]
    wrap_output: bool,

    /// Include the extraction order in the output
    #[arg(long)]
    record_order: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Exit with status 2 unless every sample was resolved
    #[arg(long)]
    require_full: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Parse "x,y,z" into coordinates
fn parse_seed(s: &str) -> std::result::Result<Vec<usize>, String> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .map_err(|e| format!("invalid seed coordinate '{}': {e}", part.trim()))
        })
        .collect()
}

/// Output destination types
#[derive(Debug, PartialEq)]
enum OutputDestination {
    File(PathBuf),
    Stdout,
}

fn resolve_output(output: &str) -> OutputDestination {
    if output.is_empty() || output == "-" {
        OutputDestination::Stdout
    } else {
        OutputDestination::File(PathBuf::from(output))
    }
}

/// Merge the config file (if any) with command-line overrides
fn build_config(cli: &Cli) -> Result<UnwrapConfig> {
    let mut config = match &cli.config {
        Some(path) => UnwrapConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => UnwrapConfig::default(),
    };

    if let Some(order) = cli.order {
        config.quality_order = order;
    }
    config.wrap_input |= cli.wrap_input;
    config.wrap_output |= cli.wrap_output;
    config.record_order |= cli.record_order;
    if cli.no_progress {
        config.progress = false;
    }
    Ok(config)
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stderr);
    if cli.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            error!("❌ Error: {e:#}");
            std::process::exit(1);
        }
    }
}

/// Returns whether the result satisfies `--require-full`
fn run(cli: &Cli) -> Result<bool> {
    if cli.verbose {
        eprintln!("quality-unwrap v{} starting...", env!("QUALITY_UNWRAP_VERSION"));
    }

    let config = build_config(cli)?;
    let seed = match &cli.seed {
        Some(text) => Some(parse_seed(text).map_err(anyhow::Error::msg)?),
        None => None,
    };
    let field = read_field(&cli.input)?;
    let total = field.phase.len() as u64;

    let mut progress = if config.progress {
        cli::ProgressManager::new(total, &format!("🌀 Unwrapping {}", cli.input.display()))
    } else {
        cli::ProgressManager::hidden(total)
    };

    let outcome = quality_unwrap::unwrap_field(field, seed.as_deref(), &config, &mut progress)
        .context("unwrapping failed")?;

    let complete = outcome.is_complete();
    let summary = if complete {
        "✅ Unwrapping completed!".to_string()
    } else {
        format!("⚠️ {} samples unreachable from the seed", outcome.unresolved_count())
    };
    progress.finish(summary, complete);

    info!(
        "Resolved {}/{} samples ({} unreachable)",
        outcome.resolved_count,
        outcome.resolved.len(),
        outcome.unresolved_count()
    );

    let result = UnwrappedField::from(outcome);
    match resolve_output(&cli.output) {
        OutputDestination::File(path) => {
            result
                .write_to_path(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            if cli.verbose {
                eprintln!("📁 Saved to: {}", path.display());
            }
        }
        OutputDestination::Stdout => {
            result.write(std::io::stdout().lock())?;
        }
    }

    if cli.require_full && !complete {
        error!("Result does not cover the whole grid");
        return Ok(false);
    }
    Ok(true)
}

fn read_field(path: &Path) -> Result<PhaseField> {
    if !path.exists() {
        bail!("Input file not found: {}", path.display());
    }
    PhaseField::read(path).with_context(|| format!("reading {}", path.display()))
}
