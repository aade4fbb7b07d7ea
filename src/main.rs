//! CLI entry point for the house price prediction pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use prices_predictor::{
    DataIngestor, FeatureEngineeringStrategy, LogTracker, MissingValueStrategy, OutlierStrategy,
    Pipeline, PipelineConfig, PipelineRunResult,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// CLI-compatible missing value strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMissingStrategy {
    /// Drop rows containing missing values
    Drop,
    /// Fill numeric nulls with the column mean
    Mean,
    /// Fill numeric nulls with the column median
    Median,
    /// Fill numeric nulls with the column mode
    Mode,
}

impl From<CliMissingStrategy> for MissingValueStrategy {
    fn from(cli: CliMissingStrategy) -> Self {
        match cli {
            CliMissingStrategy::Drop => {
                MissingValueStrategy::drop(prices_predictor::DropAxis::Rows, None)
            }
            CliMissingStrategy::Mean => MissingValueStrategy::fill("mean"),
            CliMissingStrategy::Median => MissingValueStrategy::fill("median"),
            CliMissingStrategy::Mode => MissingValueStrategy::fill("mode"),
        }
    }
}

/// CLI-compatible outlier detection strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierDetection {
    /// Flag values beyond the z-score threshold
    Zscore,
    /// Flag values outside the IQR bounds
    Iqr,
}

impl From<CliOutlierDetection> for OutlierStrategy {
    fn from(cli: CliOutlierDetection) -> Self {
        match cli {
            CliOutlierDetection::Zscore => OutlierStrategy::default(),
            CliOutlierDetection::Iqr => OutlierStrategy::Iqr,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "House price prediction pipeline",
    long_about = "A strategy-driven data preprocessing and regression pipeline.\n\n\
                  EXAMPLES:\n  \
                  # Train on an archived dataset\n  \
                  prices-predictor -i archive.zip --target SalePrice\n\n  \
                  # Log-transform skewed columns before fitting\n  \
                  prices-predictor -i data.csv --target SalePrice --log-features SalePrice,Gr_Liv_Area\n\n  \
                  # Cap outliers instead of removing rows\n  \
                  prices-predictor -i data.csv --target SalePrice --outlier-method cap"
)]
struct Args {
    /// Path to the input file (.zip archive with one CSV, or a bare .csv)
    #[arg(short, long)]
    input: String,

    /// Target column for the regression
    #[arg(short, long, default_value = "SalePrice")]
    target: String,

    /// Missing value handling strategy
    #[arg(long, value_enum, default_value = "mean")]
    missing_strategy: CliMissingStrategy,

    /// Outlier detection strategy
    #[arg(long, value_enum, default_value = "iqr")]
    outlier_detection: CliOutlierDetection,

    /// Outlier handling method (remove, cap; anything else is a logged no-op)
    #[arg(long, default_value = "remove")]
    outlier_method: String,

    /// Comma-separated columns to log-transform before splitting
    #[arg(long, value_delimiter = ',')]
    log_features: Vec<String>,

    /// Fraction of rows assigned to the test partition
    #[arg(long, default_value = "0.2")]
    test_fraction: f64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and the final summary)
    #[arg(short, long)]
    quiet: bool,
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

    let path = Path::new(&args.input);
    if !path.exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    info!("Loading dataset from: {}", args.input);
    let data = DataIngestor::for_path(path)?.ingest(path)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    let mut config_builder = PipelineConfig::builder()
        .target_column(&args.target)
        .missing_values(args.missing_strategy.into())
        .outlier_detection(args.outlier_detection.into())
        .outlier_method(&args.outlier_method)
        .test_fraction(args.test_fraction);

    if !args.log_features.is_empty() {
        config_builder = config_builder
            .feature_engineering(FeatureEngineeringStrategy::log(args.log_features.clone()));
    }

    let config = config_builder.build()?;

    let mut builder = Pipeline::builder().config(config).tracker(Arc::new(LogTracker));
    if !args.quiet {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    let result = builder.build()?.run(data)?;
    print_summary(&result, &args);
    Ok(())
}

/// Print a human-readable summary of the run.
///
/// Uses `println!` intentionally: this is the primary output of the
/// program and should be visible regardless of log level.
fn print_summary(result: &PipelineRunResult, args: &Args) {
    let summary = &result.summary;
    let model = &result.model;

    println!();
    println!("{}", "=".repeat(72));
    println!("TRAINING COMPLETE");
    println!("{}", "=".repeat(72));
    println!();
    println!("Input:  {} ({} rows)", args.input, summary.rows_before);
    println!(
        "Rows after cleaning: {} ({} train / {} test)",
        summary.rows_after, summary.train_rows, summary.test_rows
    );
    println!("Target: {}", args.target);
    println!("Duration: {}ms", summary.duration_ms);
    println!();
    println!("Model:");
    println!("  Intercept: {:.4}", model.intercept());
    println!("  Coefficients: {}", model.coefficients().len());
    println!("  Expected columns: {:?}", model.expected_columns());
    println!();

    if !summary.steps.is_empty() {
        println!("Actions taken:");
        for step in &summary.steps {
            println!("  - {}", step);
        }
        println!();
    }

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("{}", "=".repeat(72));
}
