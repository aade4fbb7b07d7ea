//! Progress reporting for the prediction pipeline.
//!
//! The pipeline is synchronous and runs to completion or failure; progress
//! updates exist so a caller (CLI, embedding application) can surface what
//! the run is currently doing.

use serde::{Deserialize, Serialize};

/// Stages of the prediction pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Handling missing values
    MissingValues,
    /// Detecting and handling outliers
    OutlierHandling,
    /// Applying feature engineering transformations
    FeatureEngineering,
    /// Splitting into train/test partitions
    Splitting,
    /// Fitting the model
    ModelBuilding,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PipelineStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MissingValues => "Handling Missing Values",
            Self::OutlierHandling => "Handling Outliers",
            Self::FeatureEngineering => "Engineering Features",
            Self::Splitting => "Splitting Data",
            Self::ModelBuilding => "Building Model",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Typical weight of this stage in the overall run (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::MissingValues => 0.20,
            Self::OutlierHandling => 0.20,
            Self::FeatureEngineering => 0.20,
            Self::Splitting => 0.10,
            Self::ModelBuilding => 0.30,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::MissingValues => 0.0,
            Self::OutlierHandling => 0.20,
            Self::FeatureEngineering => 0.40,
            Self::Splitting => 0.60,
            Self::ModelBuilding => 0.70,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A progress update emitted while the pipeline runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: PipelineStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within the current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage.
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + stage.weight() * stage_progress;
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    /// Creates a completion update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    /// Creates a failure update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }
}

/// Trait for receiving progress updates during a pipeline run.
///
/// Implementations must be `Send + Sync` so the pipeline can run on a
/// background thread while the reporter lives with the caller.
pub trait ProgressReporter: Send + Sync {
    /// Called when progress is made during the run.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_progress_update_new() {
        let update = ProgressUpdate::new(PipelineStage::Splitting, 0.5, "Splitting...");
        assert_eq!(update.stage, PipelineStage::Splitting);
        assert_eq!(update.stage_progress, 0.5);
        assert!((update.progress - 0.65).abs() < 1e-6);
    }

    #[test]
    fn test_progress_update_complete() {
        let update = ProgressUpdate::complete("Done");
        assert_eq!(update.stage, PipelineStage::Complete);
        assert_eq!(update.progress, 1.0);
    }

    #[test]
    fn test_stage_weights_sum() {
        let stages = [
            PipelineStage::MissingValues,
            PipelineStage::OutlierHandling,
            PipelineStage::FeatureEngineering,
            PipelineStage::Splitting,
            PipelineStage::ModelBuilding,
        ];
        let total: f32 = stages.iter().map(|s| s.weight()).sum();
        assert!((total - 1.0).abs() < 0.01, "Weights should sum to ~1.0");
    }

    #[test]
    fn test_stage_json_values() {
        let json = serde_json::to_string(&PipelineStage::MissingValues).unwrap();
        assert_eq!(json, "\"missing_values\"");
        let json = serde_json::to_string(&PipelineStage::ModelBuilding).unwrap();
        assert_eq!(json, "\"model_building\"");
    }

    #[test]
    fn test_closure_progress_reporter() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = ClosureProgressReporter::new(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        reporter.report(ProgressUpdate::new(
            PipelineStage::MissingValues,
            0.5,
            "Test",
        ));
        reporter.report(ProgressUpdate::complete("Done"));

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }
}
