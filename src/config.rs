//! Configuration types for the prediction pipeline.
//!
//! [`PipelineConfig`] gathers the strategy selections for every stage and
//! is built through a validating builder.

use crate::error::{PipelineError, Result};
use crate::features::FeatureEngineeringStrategy;
use crate::missing::MissingValueStrategy;
use crate::model::ModelBuildingStrategy;
use crate::outliers::OutlierStrategy;
use crate::split::{DEFAULT_TEST_FRACTION, SplitStrategy};
use serde::{Deserialize, Serialize};

/// Configuration for one pipeline run.
///
/// Use [`PipelineConfig::builder()`] to create a configuration with a
/// fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use prices_predictor::{MissingValueStrategy, OutlierStrategy, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .target_column("SalePrice")
///     .missing_values(MissingValueStrategy::fill("mean"))
///     .outlier_detection(OutlierStrategy::Iqr)
///     .log_transform(["SalePrice"])
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the column the model predicts.
    pub target_column: String,

    /// How missing values are handled before anything else runs.
    pub missing_values: MissingValueStrategy,

    /// How outliers are detected.
    pub outlier_detection: OutlierStrategy,

    /// Outlier handling method (`"remove"`, `"cap"`; anything else is a
    /// logged no-op).
    pub outlier_method: String,

    /// Feature engineering strategies, applied in order.
    pub feature_engineering: Vec<FeatureEngineeringStrategy>,

    /// Train/test splitting strategy.
    pub split: SplitStrategy,

    /// Model building strategy.
    pub model: ModelBuildingStrategy,
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "Target column must not be empty".to_string(),
            ));
        }
        let SplitStrategy::TrainTest { test_fraction } = self.split;
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "Invalid test fraction {test_fraction}: must be in (0, 1)"
            )));
        }
        Ok(())
    }
}

/// Builder for [`PipelineConfig`] with a fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    target_column: Option<String>,
    missing_values: Option<MissingValueStrategy>,
    outlier_detection: Option<OutlierStrategy>,
    outlier_method: Option<String>,
    feature_engineering: Vec<FeatureEngineeringStrategy>,
    split: Option<SplitStrategy>,
    model: Option<ModelBuildingStrategy>,
}

impl PipelineConfigBuilder {
    /// Set the target column. Required.
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    /// Set the missing value strategy. Default: fill with the mean.
    pub fn missing_values(mut self, strategy: MissingValueStrategy) -> Self {
        self.missing_values = Some(strategy);
        self
    }

    /// Set the outlier detection strategy. Default: IQR.
    pub fn outlier_detection(mut self, strategy: OutlierStrategy) -> Self {
        self.outlier_detection = Some(strategy);
        self
    }

    /// Set the outlier handling method. Default: `"remove"`.
    pub fn outlier_method(mut self, method: impl Into<String>) -> Self {
        self.outlier_method = Some(method.into());
        self
    }

    /// Append a feature engineering strategy.
    pub fn feature_engineering(mut self, strategy: FeatureEngineeringStrategy) -> Self {
        self.feature_engineering.push(strategy);
        self
    }

    /// Append a log transformation over the given features.
    pub fn log_transform<I, S>(self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let features = features.into_iter().map(Into::into).collect();
        self.feature_engineering(FeatureEngineeringStrategy::log(features))
    }

    /// Set the test fraction for the default train/test split.
    pub fn test_fraction(mut self, test_fraction: f64) -> Self {
        self.split = Some(SplitStrategy::TrainTest { test_fraction });
        self
    }

    /// Set the splitting strategy explicitly.
    pub fn split(mut self, strategy: SplitStrategy) -> Self {
        self.split = Some(strategy);
        self
    }

    /// Set the model building strategy. Default: linear regression.
    pub fn model(mut self, strategy: ModelBuildingStrategy) -> Self {
        self.model = Some(strategy);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<PipelineConfig> {
        let config = PipelineConfig {
            target_column: self.target_column.ok_or_else(|| {
                PipelineError::InvalidConfig("Target column is required".to_string())
            })?,
            missing_values: self
                .missing_values
                .unwrap_or_else(|| MissingValueStrategy::fill("mean")),
            outlier_detection: self.outlier_detection.unwrap_or(OutlierStrategy::Iqr),
            outlier_method: self.outlier_method.unwrap_or_else(|| "remove".to_string()),
            feature_engineering: self.feature_engineering,
            split: self.split.unwrap_or(SplitStrategy::TrainTest {
                test_fraction: DEFAULT_TEST_FRACTION,
            }),
            model: self.model.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
