//! The prediction pipeline and its builder.
//!
//! [`Pipeline::run`] chains the five strategy contexts in a fixed order:
//! missing value handling, outlier handling, feature engineering,
//! splitting, and model building. Each stage fully consumes its input and
//! produces a new frame before the next begins; a failure in any stage
//! aborts the run.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::features::FeatureEngineer;
use crate::missing::MissingValueHandler;
use crate::model::{ModelBuilder, RegressionModel};
use crate::outliers::OutlierDetector;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::pipeline::tracking::ExperimentTracker;
use crate::split::DataSplitter;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Name reported to the experiment tracker for every run.
const RUN_NAME: &str = "prices_prediction";

/// Summary of what a pipeline run did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,
    /// Rows in the raw input frame.
    pub rows_before: usize,
    /// Rows remaining after cleaning, before the split.
    pub rows_after: usize,
    /// Rows in the training partition.
    pub train_rows: usize,
    /// Rows in the test partition.
    pub test_rows: usize,
    /// Human-readable record of each stage's action.
    pub steps: Vec<String>,
    /// Non-fatal warnings generated during the run.
    pub warnings: Vec<String>,
}

impl RunSummary {
    /// Percentage of input rows removed by cleaning.
    pub fn rows_removed_percentage(&self) -> f64 {
        if self.rows_before == 0 {
            return 0.0;
        }
        let removed = self.rows_before.saturating_sub(self.rows_after);
        removed as f64 / self.rows_before as f64 * 100.0
    }
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    /// The fitted model.
    pub model: RegressionModel,
    /// Summary of the run.
    pub summary: RunSummary,
}

/// The prediction pipeline.
///
/// Use [`Pipeline::builder()`] to create a pipeline with custom
/// configuration, progress reporting and experiment tracking.
///
/// # Example
///
/// ```rust,ignore
/// use prices_predictor::{Pipeline, PipelineConfig};
///
/// let result = Pipeline::builder()
///     .config(
///         PipelineConfig::builder()
///             .target_column("SalePrice")
///             .log_transform(["SalePrice"])
///             .build()?,
///     )
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run(df)?;
///
/// println!("Model expects: {:?}", result.model.expected_columns());
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    tracker: Option<Arc<dyn ExperimentTracker>>,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Run the pipeline on a raw frame, producing a fitted model.
    pub fn run(&self, df: DataFrame) -> Result<PipelineRunResult> {
        if let Some(tracker) = &self.tracker {
            tracker.run_started(RUN_NAME);
        }
        match self.run_internal(df) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                if let Some(tracker) = &self.tracker {
                    tracker.run_finished(&result.model, &result.summary);
                }
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn stage_start(&self, stage: PipelineStage, message: &str) {
        info!("{}", message);
        self.report_progress(ProgressUpdate::new(stage, 0.0, message));
    }

    fn stage_done(&self, stage: PipelineStage, message: impl Into<String>) {
        self.report_progress(ProgressUpdate::new(stage, 1.0, message));
    }

    fn run_internal(&self, df: DataFrame) -> Result<PipelineRunResult> {
        let start_time = Instant::now();

        info!("Starting prediction pipeline...");
        let mut summary = RunSummary {
            rows_before: df.height(),
            ..RunSummary::default()
        };

        // Step 1: missing values
        self.stage_start(PipelineStage::MissingValues, "Handling missing values...");
        let handler = MissingValueHandler::new(self.config.missing_values.clone());
        let df = handler.handle_missing_values(&df)?;
        summary
            .steps
            .push(format!("Handled missing values ({} rows remain)", df.height()));
        self.stage_done(PipelineStage::MissingValues, "Missing values handled");

        // Step 2: outliers
        self.stage_start(PipelineStage::OutlierHandling, "Handling outliers...");
        let detector = OutlierDetector::new(self.config.outlier_detection.clone());
        let df = detector.handle_outliers(&df, &self.config.outlier_method)?;
        summary.steps.push(format!(
            "Handled outliers with method '{}' ({} rows remain)",
            self.config.outlier_method,
            df.height()
        ));
        self.stage_done(PipelineStage::OutlierHandling, "Outliers handled");

        // Step 3: feature engineering, in configured order
        self.stage_start(
            PipelineStage::FeatureEngineering,
            "Applying feature engineering...",
        );
        let mut df = df;
        let total = self.config.feature_engineering.len();
        for (idx, strategy) in self.config.feature_engineering.iter().enumerate() {
            let engineer = FeatureEngineer::new(strategy.clone());
            df = engineer.apply_feature_engineering(&df)?;
            self.report_progress(ProgressUpdate::new(
                PipelineStage::FeatureEngineering,
                (idx + 1) as f32 / total.max(1) as f32,
                format!("Applied transformation {}/{}", idx + 1, total),
            ));
        }
        summary.steps.push(format!(
            "Applied {} feature engineering transformation(s)",
            total
        ));
        self.stage_done(PipelineStage::FeatureEngineering, "Features engineered");

        summary.rows_after = df.height();
        if summary.rows_removed_percentage() > 30.0 {
            let warning = format!(
                "High data loss: {:.1}% of rows were removed before the split",
                summary.rows_removed_percentage()
            );
            warn!("{}", warning);
            summary.warnings.push(warning);
        }

        // Step 4: split
        self.stage_start(PipelineStage::Splitting, "Splitting data...");
        let splitter = DataSplitter::new(self.config.split.clone());
        let split = splitter.apply_split(&df, &self.config.target_column)?;
        summary.train_rows = split.x_train.height();
        summary.test_rows = split.x_test.height();
        summary.steps.push(format!(
            "Split into {} train / {} test rows on target '{}'",
            summary.train_rows, summary.test_rows, self.config.target_column
        ));
        self.stage_done(PipelineStage::Splitting, "Data split");

        // Step 5: model building
        self.stage_start(PipelineStage::ModelBuilding, "Building model...");
        let builder = ModelBuilder::new(self.config.model);
        let model = builder.build_model(&split.x_train, &split.y_train)?;
        summary.steps.push(format!(
            "Fitted model over {} input columns",
            model.expected_columns().len()
        ));
        self.stage_done(PipelineStage::ModelBuilding, "Model built");

        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Pipeline finished in {}ms ({} -> {} rows)",
            summary.duration_ms, summary.rows_before, summary.rows_after
        );

        Ok(PipelineRunResult { model, summary })
    }
}

/// Builder for creating a [`Pipeline`] instance.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    tracker: Option<Arc<dyn ExperimentTracker>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration. Required.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during the run.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// Convenience over [`progress_reporter`](Self::progress_reporter) for
    /// simple handlers.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Set an experiment tracker receiving start/end-of-run notifications.
    pub fn tracker(mut self, tracker: Arc<dyn ExperimentTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if no configuration was provided or the
    /// configuration is invalid.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.ok_or_else(|| {
            crate::error::PipelineError::InvalidConfig(
                "Pipeline configuration is required".to_string(),
            )
        })?;
        config.validate()?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
            tracker: self.tracker,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_frame() -> DataFrame {
        let areas: Vec<f64> = (1..=50).map(|v| 800.0 + 10.0 * v as f64).collect();
        let prices: Vec<f64> = areas.iter().map(|a| 150.0 * a + 5000.0).collect();
        let zones: Vec<&str> = (0..50).map(|v| if v % 2 == 0 { "A" } else { "B" }).collect();
        df![
            "area" => areas,
            "zone" => zones,
            "price" => prices,
        ]
        .unwrap()
    }

    fn sample_config() -> PipelineConfig {
        PipelineConfig::builder()
            .target_column("price")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_config() {
        let result = Pipeline::builder().build();
        assert!(result.is_err());
    }

    #[test]
    fn test_run_produces_model_and_summary() {
        let pipeline = Pipeline::builder()
            .config(sample_config())
            .build()
            .unwrap();

        let result = pipeline.run(sample_frame()).unwrap();
        assert_eq!(result.summary.rows_before, 50);
        assert_eq!(result.summary.train_rows, 40);
        assert_eq!(result.summary.test_rows, 10);
        assert_eq!(result.model.expected_columns(), &["area", "zone_B"]);
    }

    #[test]
    fn test_run_emits_progress() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let pipeline = Pipeline::builder()
            .config(sample_config())
            .on_progress(move |_update| {
                call_count_clone.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();

        pipeline.run(sample_frame()).unwrap();
        assert!(call_count.load(Ordering::SeqCst) >= 10);
    }

    #[test]
    fn test_run_fails_on_missing_target() {
        let config = PipelineConfig::builder()
            .target_column("SalePrice")
            .build()
            .unwrap();
        let pipeline = Pipeline::builder().config(config).build().unwrap();

        let result = pipeline.run(sample_frame());
        assert!(result.is_err());
    }

    #[test]
    fn test_run_reports_failure_progress() {
        let failed = Arc::new(AtomicUsize::new(0));
        let failed_clone = failed.clone();

        let config = PipelineConfig::builder()
            .target_column("missing_target")
            .build()
            .unwrap();
        let pipeline = Pipeline::builder()
            .config(config)
            .on_progress(move |update| {
                if update.stage == PipelineStage::Failed {
                    failed_clone.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build()
            .unwrap();

        let _ = pipeline.run(sample_frame());
        assert_eq!(failed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rows_removed_percentage() {
        let summary = RunSummary {
            rows_before: 100,
            rows_after: 60,
            ..RunSummary::default()
        };
        assert!((summary.rows_removed_percentage() - 40.0).abs() < 1e-9);
    }
}
