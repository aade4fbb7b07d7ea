//! Outlier detection and handling strategies.
//!
//! Detection produces a boolean mask frame with the input's shape; handling
//! either removes rows containing flagged values or caps values at the
//! 1st/99th percentiles. The [`OutlierDetector`] context holds the currently
//! selected detection strategy.

use crate::error::{PipelineError, Result};
use crate::utils::{is_numeric_dtype, series_std, sorted_quantile};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Default z-score threshold.
pub const DEFAULT_ZSCORE_THRESHOLD: f64 = 3.0;

/// An outlier detection strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutlierStrategy {
    /// Flag values whose absolute z-score exceeds `threshold`.
    ///
    /// A column with zero (or undefined) standard deviation contributes
    /// no outliers.
    ZScore { threshold: f64 },
    /// Flag values outside `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]` where
    /// `IQR = Q3 - Q1`.
    Iqr,
}

impl Default for OutlierStrategy {
    fn default() -> Self {
        Self::ZScore {
            threshold: DEFAULT_ZSCORE_THRESHOLD,
        }
    }
}

impl OutlierStrategy {
    /// Z-score detection with the given threshold.
    pub fn z_score(threshold: f64) -> Self {
        Self::ZScore { threshold }
    }

    /// IQR detection.
    pub fn iqr() -> Self {
        Self::Iqr
    }

    /// Select a detection strategy by its orchestration-layer name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "zscore" => Ok(Self::default()),
            "iqr" => Ok(Self::Iqr),
            other => Err(PipelineError::UnsupportedStrategy(format!(
                "Unsupported outlier detection strategy '{other}'"
            ))),
        }
    }

    /// Detect outliers, returning a boolean frame of the same shape.
    ///
    /// Non-numeric columns and null entries are never flagged.
    pub fn detect(&self, df: &DataFrame) -> Result<DataFrame> {
        match self {
            Self::ZScore { threshold } => {
                info!("Detecting outliers using the z-score method");
                let mask = detect_with(df, |series| zscore_mask(series, *threshold))?;
                info!("Outliers detected with z-score threshold {}", threshold);
                Ok(mask)
            }
            Self::Iqr => {
                info!("Detecting outliers using the IQR method");
                let mask = detect_with(df, iqr_mask)?;
                info!("Outliers detected with IQR bounds");
                Ok(mask)
            }
        }
    }
}

fn detect_with(
    df: &DataFrame,
    column_mask: impl Fn(&Series) -> Result<Vec<bool>>,
) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(df.width());
    for col in df.get_columns() {
        let series = col.as_materialized_series();
        let mask = if is_numeric_dtype(series.dtype()) {
            column_mask(series)?
        } else {
            vec![false; series.len()]
        };
        columns.push(Series::new(series.name().clone(), mask).into_column());
    }
    Ok(DataFrame::new(columns)?)
}

fn zscore_mask(series: &Series, threshold: f64) -> Result<Vec<bool>> {
    let mean = series.mean();
    let std = series_std(series, 1)?;

    let cast = series.cast(&DataType::Float64)?;
    let values = cast.f64()?;

    match (mean, std) {
        (Some(mean), Some(std)) if std > 0.0 => Ok(values
            .into_iter()
            .map(|v| {
                v.map(|val| ((val - mean) / std).abs() > threshold)
                    .unwrap_or(false)
            })
            .collect()),
        _ => Ok(vec![false; series.len()]),
    }
}

fn iqr_mask(series: &Series) -> Result<Vec<bool>> {
    let q1 = sorted_quantile(series, 0.25)?;
    let q3 = sorted_quantile(series, 0.75)?;

    let cast = series.cast(&DataType::Float64)?;
    let values = cast.f64()?;

    match (q1, q3) {
        (Some(q1), Some(q3)) => {
            let iqr = q3 - q1;
            let lower = q1 - 1.5 * iqr;
            let upper = q3 + 1.5 * iqr;
            Ok(values
                .into_iter()
                .map(|v| v.map(|val| val < lower || val > upper).unwrap_or(false))
                .collect())
        }
        _ => Ok(vec![false; series.len()]),
    }
}

/// Context holding the currently selected outlier detection strategy.
pub struct OutlierDetector {
    strategy: OutlierStrategy,
}

impl OutlierDetector {
    pub fn new(strategy: OutlierStrategy) -> Self {
        Self { strategy }
    }

    pub fn set_strategy(&mut self, strategy: OutlierStrategy) {
        self.strategy = strategy;
    }

    /// Detect outliers with the held strategy.
    pub fn detect_outliers(&self, df: &DataFrame) -> Result<DataFrame> {
        self.strategy.detect(df)
    }

    /// Detect and then handle outliers.
    ///
    /// `"remove"` drops every row containing at least one flagged value;
    /// `"cap"` clips numeric columns to their [1st, 99th] percentile range.
    /// An unrecognized method logs a warning and returns the input
    /// unchanged.
    pub fn handle_outliers(&self, df: &DataFrame, method: &str) -> Result<DataFrame> {
        let handled = match method {
            "remove" => {
                let outliers = self.detect_outliers(df)?;
                remove_flagged_rows(df, &outliers)?
            }
            "cap" => cap_at_percentiles(df)?,
            other => {
                warn!("Unknown method '{}' for outlier handling", other);
                return Ok(df.clone());
            }
        };

        info!("Outlier handling completed");
        Ok(handled)
    }
}

fn remove_flagged_rows(df: &DataFrame, outliers: &DataFrame) -> Result<DataFrame> {
    let height = df.height();
    let mut keep = vec![true; height];

    for col in outliers.get_columns() {
        let flags = col.as_materialized_series().bool()?.clone();
        for (row, keep_row) in keep.iter_mut().enumerate() {
            if flags.get(row).unwrap_or(false) {
                *keep_row = false;
            }
        }
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let cleaned = df.filter(&mask)?;
    debug!("Removed {} rows containing outliers", height - cleaned.height());
    Ok(cleaned)
}

fn cap_at_percentiles(df: &DataFrame) -> Result<DataFrame> {
    let mut capped = df.clone();

    for col in df.get_columns() {
        if !is_numeric_dtype(col.dtype()) {
            continue;
        }
        let series = col.as_materialized_series();
        let (lower, upper) = match (
            sorted_quantile(series, 0.01)?,
            sorted_quantile(series, 0.99)?,
        ) {
            (Some(lower), Some(upper)) => (lower, upper),
            _ => continue,
        };

        let cast = series.cast(&DataType::Float64)?;
        let clipped = cast
            .f64()?
            .apply(|v| v.map(|val| val.clamp(lower, upper)));
        capped.replace(series.name().as_str(), clipped.into_series())?;
        debug!(
            "Capped '{}' to [{:.2}, {:.2}]",
            series.name(),
            lower,
            upper
        );
    }

    Ok(capped)
}
