//! CLI entry point for the preparation pipeline.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use frame_prep::{
    ApplyOutcome, Operation, PipelineConfig, PipelineState, export::write_csv, io::read_table,
};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Tabular data preparation pipeline",
    long_about = "Loads a CSV or Parquet file, applies a JSON list of preparation steps \
                  in order and writes the result as CSV.\n\n\
                  EXAMPLES:\n  \
                  # Apply steps and export\n  \
                  frame-prep -i data.csv --ops ops.json -o cleaned.csv\n\n  \
                  # Custom outlier thresholds\n  \
                  frame-prep -i data.parquet --ops ops.json -o cleaned.csv --config prep.json\n\n\
                  STEP FORMAT:\n  \
                  [{\"op\": \"impute\", \"columns\": [\"age\"], \"method\": \"median\"},\n   \
                  {\"op\": \"handle_outliers\", \"column\": \"fare\", \"method\": \"iqr\", \"treatment\": \"transform\"}]"
)]
struct Args {
    /// Path to the CSV or Parquet file to process
    #[arg(short, long)]
    input: PathBuf,

    /// JSON file with the list of steps to apply
    #[arg(long)]
    ops: PathBuf,

    /// Path of the CSV file to write
    #[arg(short, long)]
    output: PathBuf,

    /// Optional JSON pipeline configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and the summary)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DetectionChoice {
    Iqr,
    Zscore,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TreatmentChoice {
    Remove,
    Transform,
}

/// Detect then treat with the index set just produced.
#[derive(Debug, Deserialize)]
struct HandleOutliers {
    column: String,
    method: DetectionChoice,
    treatment: TreatmentChoice,
}

#[derive(Debug)]
enum Step {
    Apply(Operation),
    HandleOutliers(HandleOutliers),
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet);

    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    let config = load_config(args.config.as_deref())?;
    let steps = load_steps(&args.ops)?;
    info!("Loaded {} steps from {}", steps.len(), args.ops.display());

    let mut state = PipelineState::with_config(config)?;
    state.load(read_table(&args.input)?);

    for (index, step) in steps.iter().enumerate() {
        let summary = run_step(&mut state, step)
            .with_context(|| format!("Step {} failed", index + 1))
            .inspect_err(|e| error!("{:#}", e))?;
        println!("[{}/{}] {}", index + 1, steps.len(), summary);
    }

    let table = state.current()?;
    write_csv(table, &args.output)?;
    println!(
        "Wrote {} rows x {} columns to {} ({} operations applied)",
        table.height(),
        table.width(),
        args.output.display(),
        state.operations_applied()
    );

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read config {}", path.display()))?;
    let config: PipelineConfig = serde_json::from_str(&text)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    debug!("Using config: {:?}", config);
    Ok(config)
}

fn load_steps(path: &Path) -> Result<Vec<Step>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read steps {}", path.display()))?;
    let values: Vec<Value> = serde_json::from_str(&text)
        .with_context(|| format!("{} must contain a JSON array of steps", path.display()))?;

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let step = if value.get("op").and_then(Value::as_str) == Some("handle_outliers") {
                serde_json::from_value(value).map(Step::HandleOutliers)
            } else {
                serde_json::from_value(value).map(Step::Apply)
            };
            step.with_context(|| format!("Invalid step {}", index + 1))
        })
        .collect()
}

fn run_step(state: &mut PipelineState, step: &Step) -> Result<String> {
    match step {
        Step::Apply(operation) => {
            let outcome = state.apply(operation)?;
            Ok(describe(operation, &outcome))
        }
        Step::HandleOutliers(handle) => {
            let detect = match handle.method {
                DetectionChoice::Iqr => Operation::DetectOutliersIqr {
                    column: handle.column.clone(),
                },
                DetectionChoice::Zscore => Operation::DetectOutliersZscore {
                    column: handle.column.clone(),
                },
            };
            let Some(outliers) = state.apply(&detect)?.outliers().cloned() else {
                bail!("Detection on '{}' returned no index set", handle.column);
            };
            let found = outliers.len();

            let treat = match handle.treatment {
                TreatmentChoice::Remove => Operation::RemoveOutliers {
                    column: handle.column.clone(),
                    outliers,
                },
                TreatmentChoice::Transform => Operation::TransformOutliers {
                    column: handle.column.clone(),
                    outliers,
                },
            };
            let outcome = state.apply(&treat)?;
            Ok(format!(
                "{} outliers detected in '{}' with {}; {}",
                found,
                handle.column,
                detect.name(),
                describe(&treat, &outcome)
            ))
        }
    }
}

fn describe(operation: &Operation, outcome: &ApplyOutcome) -> String {
    match outcome {
        ApplyOutcome::Table(table) => format!(
            "{}: {} rows x {} columns",
            operation.name(),
            table.height(),
            table.width()
        ),
        ApplyOutcome::Outliers(set) => format!(
            "{}: {} outliers in '{}' at rows {:?}",
            operation.name(),
            set.len(),
            set.column(),
            set.positions()
        ),
    }
}
