//! Feature engineering strategies.
//!
//! Log transform, standard scaling, min-max scaling and one-hot encoding
//! over a configured set of target columns. Scaling parameters are fitted
//! from the same frame being transformed; when a strategy is applied
//! separately to train and test data this leaks statistics across the
//! split. That is the documented behavior of this stage, carried over
//! deliberately (the model-building stage fits its own preprocessing on
//! training data only).

use crate::error::{PipelineError, Result};
use crate::utils::{is_categorical_dtype, is_numeric_dtype, series_std, sorted_categories};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A feature engineering strategy over a set of target columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureEngineeringStrategy {
    /// Replace each target column with `ln(1 + x)`.
    Log { features: Vec<String> },
    /// Rescale each target column to zero mean and unit variance.
    StandardScale { features: Vec<String> },
    /// Rescale each target column linearly into `range`.
    MinMaxScale {
        features: Vec<String>,
        range: (f64, f64),
    },
    /// Replace each target categorical column with drop-first indicator
    /// columns named `<column>_<category>`.
    OneHot { features: Vec<String> },
}

impl FeatureEngineeringStrategy {
    pub fn log(features: Vec<String>) -> Self {
        Self::Log { features }
    }

    pub fn standard_scale(features: Vec<String>) -> Self {
        Self::StandardScale { features }
    }

    /// Min-max scaling into the default (0, 1) range.
    pub fn min_max_scale(features: Vec<String>) -> Self {
        Self::MinMaxScale {
            features,
            range: (0.0, 1.0),
        }
    }

    pub fn min_max_scale_with_range(features: Vec<String>, range: (f64, f64)) -> Self {
        Self::MinMaxScale { features, range }
    }

    pub fn one_hot(features: Vec<String>) -> Self {
        Self::OneHot { features }
    }

    /// Select a strategy by its orchestration-layer name.
    pub fn from_name(name: &str, features: Vec<String>) -> Result<Self> {
        match name {
            "log" => Ok(Self::log(features)),
            "standard_scalar" => Ok(Self::standard_scale(features)),
            "min_max_scalar" => Ok(Self::min_max_scale(features)),
            "one_hot_encoding" => Ok(Self::one_hot(features)),
            other => Err(PipelineError::UnsupportedStrategy(format!(
                "Unsupported feature engineering strategy '{other}'"
            ))),
        }
    }

    /// Apply the transformation, producing a new frame with the same row
    /// count.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        match self {
            Self::Log { features } => {
                info!("Applying log transformation to features {:?}", features);
                let out = log_transform(df, features)?;
                info!("Log transformation completed");
                Ok(out)
            }
            Self::StandardScale { features } => {
                info!("Applying standard scaling to features {:?}", features);
                let out = standard_scale(df, features)?;
                info!("Standard scaling completed");
                Ok(out)
            }
            Self::MinMaxScale { features, range } => {
                info!(
                    "Applying min-max scaling to features {:?} with range {:?}",
                    features, range
                );
                let out = min_max_scale(df, features, *range)?;
                info!("Min-max scaling completed");
                Ok(out)
            }
            Self::OneHot { features } => {
                info!("Applying one-hot encoding to features {:?}", features);
                let out = one_hot_encode(df, features)?;
                info!("One-hot encoding completed");
                Ok(out)
            }
        }
    }
}

fn numeric_target(df: &DataFrame, name: &str) -> Result<Series> {
    let col = df
        .column(name)
        .map_err(|_| PipelineError::ColumnNotFound(name.to_string()))?;
    if !is_numeric_dtype(col.dtype()) {
        return Err(PipelineError::TypeMismatch {
            expected: "numeric column".to_string(),
            actual: format!("{} ({})", name, col.dtype()),
        });
    }
    Ok(col.as_materialized_series().clone())
}

fn log_transform(df: &DataFrame, features: &[String]) -> Result<DataFrame> {
    let mut transformed = df.clone();
    for name in features {
        let series = numeric_target(df, name)?;
        let cast = series.cast(&DataType::Float64)?;
        let values = cast.f64()?;

        let mut out = Vec::with_capacity(values.len());
        for v in values {
            match v {
                Some(val) if val <= -1.0 => {
                    return Err(PipelineError::Transform {
                        column: name.clone(),
                        reason: format!("log1p undefined for value {val}"),
                    });
                }
                Some(val) => out.push(Some(val.ln_1p())),
                None => out.push(None),
            }
        }
        transformed.replace(name, Series::new(series.name().clone(), out))?;
    }
    Ok(transformed)
}

fn standard_scale(df: &DataFrame, features: &[String]) -> Result<DataFrame> {
    let mut transformed = df.clone();
    for name in features {
        let series = numeric_target(df, name)?;
        let mean = series
            .mean()
            .ok_or_else(|| PipelineError::NoValidValues(format!("column '{name}'")))?;
        // Population std, with a constant column scaling by 1.
        let std = series_std(&series, 0)?.filter(|s| *s > 0.0).unwrap_or(1.0);

        let cast = series.cast(&DataType::Float64)?;
        let scaled = cast.f64()?.apply(|v| v.map(|val| (val - mean) / std));
        transformed.replace(name, scaled.into_series())?;
    }
    Ok(transformed)
}

fn min_max_scale(df: &DataFrame, features: &[String], range: (f64, f64)) -> Result<DataFrame> {
    let (lo, hi) = range;
    if lo >= hi {
        return Err(PipelineError::InvalidConfig(format!(
            "Invalid min-max range ({lo}, {hi}): lower bound must be below upper bound"
        )));
    }

    let mut transformed = df.clone();
    for name in features {
        let series = numeric_target(df, name)?;
        let min = series
            .min::<f64>()?
            .ok_or_else(|| PipelineError::NoValidValues(format!("column '{name}'")))?;
        let max = series.max::<f64>()?.unwrap_or(min);
        let span = max - min;

        let cast = series.cast(&DataType::Float64)?;
        let scaled = cast.f64()?.apply(|v| {
            v.map(|val| {
                if span == 0.0 {
                    lo
                } else {
                    (val - min) / span * (hi - lo) + lo
                }
            })
        });
        transformed.replace(name, scaled.into_series())?;
    }
    Ok(transformed)
}

fn one_hot_encode(df: &DataFrame, features: &[String]) -> Result<DataFrame> {
    let mut transformed = df.clone();
    for name in features {
        let col = df
            .column(name)
            .map_err(|_| PipelineError::ColumnNotFound(name.to_string()))?;
        if !is_categorical_dtype(col.dtype()) {
            return Err(PipelineError::TypeMismatch {
                expected: "categorical column".to_string(),
                actual: format!("{} ({})", name, col.dtype()),
            });
        }

        let series = col.as_materialized_series();
        let categories = sorted_categories(series)?;
        let values = series.str()?;

        transformed = transformed.drop(name)?;
        // Drop the first category to avoid collinearity.
        for category in categories.iter().skip(1) {
            let indicator: Vec<f64> = values
                .into_iter()
                .map(|v| if v == Some(category.as_str()) { 1.0 } else { 0.0 })
                .collect();
            let indicator_name = format!("{name}_{category}");
            transformed.with_column(Series::new(indicator_name.into(), indicator))?;
        }
    }
    Ok(transformed)
}

/// Context holding the currently selected feature engineering strategy.
pub struct FeatureEngineer {
    strategy: FeatureEngineeringStrategy,
}

impl FeatureEngineer {
    pub fn new(strategy: FeatureEngineeringStrategy) -> Self {
        Self { strategy }
    }

    pub fn set_strategy(&mut self, strategy: FeatureEngineeringStrategy) {
        self.strategy = strategy;
    }

    /// Execute the held strategy against the frame.
    pub fn apply_feature_engineering(&self, df: &DataFrame) -> Result<DataFrame> {
        self.strategy.transform(df)
    }
}
