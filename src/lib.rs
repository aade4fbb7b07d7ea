//! House Price Prediction Pipeline Library
//!
//! A strategy-driven tabular data pipeline built with Rust and Polars:
//! ingest a dataset, clean it, engineer features, split it, and fit a
//! linear regression model.
//!
//! # Overview
//!
//! Each processing stage is a family of interchangeable strategies behind a
//! uniform contract, held by a per-family context:
//!
//! - **Missing values**: drop sparse rows/columns, or fill numeric nulls
//!   from a statistic or constant ([`MissingValueStrategy`] /
//!   [`MissingValueHandler`])
//! - **Outliers**: z-score or IQR detection with remove/cap handling
//!   ([`OutlierStrategy`] / [`OutlierDetector`])
//! - **Feature engineering**: log transform, standard scaling, min-max
//!   scaling, one-hot encoding ([`FeatureEngineeringStrategy`] /
//!   [`FeatureEngineer`])
//! - **Splitting**: seeded shuffled train/test partition
//!   ([`SplitStrategy`] / [`DataSplitter`])
//! - **Model building**: mean/mode imputation, standardization, one-hot
//!   encoding and an ordinary least squares fit
//!   ([`ModelBuildingStrategy`] / [`ModelBuilder`])
//!
//! The [`Pipeline`] chains the five contexts in order and returns the
//! fitted [`RegressionModel`] together with a [`RunSummary`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use prices_predictor::{DataIngestor, Pipeline, PipelineConfig};
//! use std::path::Path;
//!
//! let path = Path::new("archive.zip");
//! let df = DataIngestor::for_path(path)?.ingest(path)?;
//!
//! let result = Pipeline::builder()
//!     .config(
//!         PipelineConfig::builder()
//!             .target_column("SalePrice")
//!             .log_transform(["SalePrice"])
//!             .build()?,
//!     )
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run(df)?;
//!
//! println!("Model expects: {:?}", result.model.expected_columns());
//! ```
//!
//! # Error policy
//!
//! Invalid configuration and unknown strategy names fail fast. Unknown
//! *method* options inside a valid strategy (a fill method, an outlier
//! handling method) log a warning and pass the data through unchanged.
//! See [`error::PipelineError`] for the distinction.

pub mod config;
pub mod error;
pub mod features;
pub mod ingest;
pub mod missing;
pub mod model;
pub mod outliers;
pub mod pipeline;
pub mod split;
pub mod utils;

// Re-exports for convenient access
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::{PipelineError, Result as PipelineResult, ResultExt};
pub use features::{FeatureEngineer, FeatureEngineeringStrategy};
pub use ingest::DataIngestor;
pub use missing::{
    DropAxis, MissingValueHandler, MissingValueStrategy, missing_value_strategy_from_name,
};
pub use model::{ModelBuilder, ModelBuildingStrategy, RegressionModel};
pub use outliers::{DEFAULT_ZSCORE_THRESHOLD, OutlierDetector, OutlierStrategy};
pub use pipeline::{
    ClosureProgressReporter, ExperimentTracker, LogTracker, Pipeline, PipelineBuilder,
    PipelineRunResult, PipelineStage, ProgressReporter, ProgressUpdate, RunSummary,
};
pub use split::{
    DEFAULT_TEST_FRACTION, DataSplitter, SplitStrategy, TRAIN_TEST_SEED, TrainTestSplit,
};
