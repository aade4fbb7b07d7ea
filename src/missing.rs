//! Missing value handling strategies.
//!
//! Two strategies: dropping rows/columns that carry too many nulls, and
//! filling numeric nulls from a column statistic or a constant. The
//! [`MissingValueHandler`] context holds the currently selected strategy
//! and delegates to it.

use crate::error::{PipelineError, Result};
use crate::utils::{fill_numeric_nulls, is_numeric_dtype, numeric_mode};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Axis along which [`MissingValueStrategy::Drop`] operates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DropAxis {
    /// Drop rows that fail the threshold.
    #[default]
    Rows,
    /// Drop columns that fail the threshold.
    Columns,
}

impl DropAxis {
    /// Parse an axis from its textual form.
    ///
    /// Accepts `0`/`rows`/`index` and `1`/`columns`, mirroring the axis
    /// values the orchestration layer passes around.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "0" | "rows" | "index" => Ok(Self::Rows),
            "1" | "columns" => Ok(Self::Columns),
            other => Err(PipelineError::InvalidConfig(format!(
                "Invalid axis value: {other}. Must be 0, 1, 'rows', 'index', or 'columns'."
            ))),
        }
    }
}

/// A missing value handling strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MissingValueStrategy {
    /// Drop rows or columns whose non-null count is below `thresh`.
    /// With `thresh` unset, a single null is enough to drop.
    Drop {
        axis: DropAxis,
        thresh: Option<usize>,
    },
    /// Fill nulls in numeric columns using `method` (`mean`, `median`,
    /// `mode`, or `constant` with `fill_value`).
    ///
    /// An unrecognized method logs a warning and leaves the frame
    /// unchanged; this leniency is intentional and keeps a running
    /// pipeline alive.
    Fill {
        method: String,
        fill_value: Option<f64>,
    },
}

impl MissingValueStrategy {
    /// Drop strategy with the given axis and threshold.
    pub fn drop(axis: DropAxis, thresh: Option<usize>) -> Self {
        Self::Drop { axis, thresh }
    }

    /// Fill strategy with the given method.
    pub fn fill(method: impl Into<String>) -> Self {
        Self::Fill {
            method: method.into(),
            fill_value: None,
        }
    }

    /// Fill strategy with a caller-supplied constant.
    pub fn fill_constant(fill_value: f64) -> Self {
        Self::Fill {
            method: "constant".to_string(),
            fill_value: Some(fill_value),
        }
    }

    /// Apply the strategy, producing a new frame.
    pub fn handle(&self, df: &DataFrame) -> Result<DataFrame> {
        match self {
            Self::Drop { axis, thresh } => {
                info!(
                    "Dropping missing values with axis={:?} and thresh={:?}",
                    axis, thresh
                );
                let cleaned = match axis {
                    DropAxis::Rows => drop_rows(df, *thresh)?,
                    DropAxis::Columns => drop_columns(df, *thresh)?,
                };
                info!("Missing values dropped");
                Ok(cleaned)
            }
            Self::Fill { method, fill_value } => {
                info!("Filling missing values using the method '{}'", method);
                let filled = fill_missing(df, method, *fill_value)?;
                info!("Missing values filled");
                Ok(filled)
            }
        }
    }
}

/// Select a missing value strategy by its orchestration-layer name.
///
/// `"drop"` maps to row dropping; `"mean"`, `"median"`, `"mode"` and
/// `"constant"` map to filling. Anything else is fatal.
pub fn missing_value_strategy_from_name(
    name: &str,
    fill_value: Option<f64>,
) -> Result<MissingValueStrategy> {
    match name {
        "drop" => Ok(MissingValueStrategy::drop(DropAxis::Rows, None)),
        "mean" | "median" | "mode" | "constant" => Ok(MissingValueStrategy::Fill {
            method: name.to_string(),
            fill_value,
        }),
        other => Err(PipelineError::UnsupportedStrategy(format!(
            "Unsupported missing value handling strategy '{other}'"
        ))),
    }
}

fn drop_rows(df: &DataFrame, thresh: Option<usize>) -> Result<DataFrame> {
    let height = df.height();
    let width = df.width();
    let required = thresh.unwrap_or(width);

    let mut non_null_counts = vec![0usize; height];
    for col in df.get_columns() {
        let null_mask = col.as_materialized_series().is_null();
        for (row, count) in non_null_counts.iter_mut().enumerate() {
            if !null_mask.get(row).unwrap_or(false) {
                *count += 1;
            }
        }
    }

    let keep: Vec<bool> = non_null_counts
        .iter()
        .map(|&count| count >= required)
        .collect();
    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let cleaned = df.filter(&mask)?;
    debug!("Dropped {} rows", height - cleaned.height());
    Ok(cleaned)
}

fn drop_columns(df: &DataFrame, thresh: Option<usize>) -> Result<DataFrame> {
    let height = df.height();
    let keep: Vec<PlSmallStr> = df
        .get_columns()
        .iter()
        .filter(|col| {
            let non_null = height - col.null_count();
            match thresh {
                Some(required) => non_null >= required,
                None => col.null_count() == 0,
            }
        })
        .map(|col| col.name().clone())
        .collect();

    debug!("Keeping {} of {} columns", keep.len(), df.width());
    Ok(df.select(keep)?)
}

fn fill_missing(df: &DataFrame, method: &str, fill_value: Option<f64>) -> Result<DataFrame> {
    match method {
        "mean" | "median" | "mode" | "constant" => {}
        other => {
            warn!("Unknown method '{}', returning data unchanged", other);
            return Ok(df.clone());
        }
    }
    if method == "constant" && fill_value.is_none() {
        return Err(PipelineError::InvalidConfig(
            "Fill method 'constant' requires a fill value".to_string(),
        ));
    }

    let mut filled = df.clone();
    let numeric_names: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|col| is_numeric_dtype(col.dtype()) && col.null_count() > 0)
        .map(|col| col.name().to_string())
        .collect();

    for name in &numeric_names {
        let series = filled.column(name)?.as_materialized_series().clone();
        let value = match method {
            "mean" => series.mean(),
            "median" => series.median(),
            "mode" => numeric_mode(&series),
            _ => fill_value,
        };

        // All-null columns have no statistic to fill from; leave them alone.
        if let Some(value) = value {
            let replacement = fill_numeric_nulls(&series, value)?;
            filled.replace(name, replacement)?;
            debug!("Filled '{}' with {}: {:.2}", name, method, value);
        }
    }

    Ok(filled)
}

/// Context holding the currently selected missing value strategy.
pub struct MissingValueHandler {
    strategy: MissingValueStrategy,
}

impl MissingValueHandler {
    pub fn new(strategy: MissingValueStrategy) -> Self {
        Self { strategy }
    }

    pub fn set_strategy(&mut self, strategy: MissingValueStrategy) {
        self.strategy = strategy;
    }

    /// Execute the held strategy against the frame.
    pub fn handle_missing_values(&self, df: &DataFrame) -> Result<DataFrame> {
        info!("Executing missing value handling strategy");
        self.strategy.handle(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_nulls() -> DataFrame {
        df![
            "area" => [Some(1200.0), None, Some(1800.0), Some(900.0)],
            "price" => [Some(250_000.0), Some(310_000.0), None, Some(180_000.0)],
            "zone" => [Some("A"), Some("B"), Some("B"), None],
        ]
        .unwrap()
    }

    #[test]
    fn test_drop_axis_parse() {
        assert_eq!(DropAxis::parse("0").unwrap(), DropAxis::Rows);
        assert_eq!(DropAxis::parse("index").unwrap(), DropAxis::Rows);
        assert_eq!(DropAxis::parse("columns").unwrap(), DropAxis::Columns);
        assert!(matches!(
            DropAxis::parse("2"),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_drop_rows_any_null() {
        let df = frame_with_nulls();
        let strategy = MissingValueStrategy::drop(DropAxis::Rows, None);

        let cleaned = strategy.handle(&df).unwrap();

        assert_eq!(cleaned.height(), 1);
        let nulls: usize = cleaned.get_columns().iter().map(|c| c.null_count()).sum();
        assert_eq!(nulls, 0);
    }

    #[test]
    fn test_drop_rows_with_thresh() {
        let df = frame_with_nulls();
        // Every row has at least 2 non-null values out of 3.
        let strategy = MissingValueStrategy::drop(DropAxis::Rows, Some(2));

        let cleaned = strategy.handle(&df).unwrap();
        assert_eq!(cleaned.height(), 4);
    }

    #[test]
    fn test_drop_columns_any_null() {
        let df = df![
            "full" => [1.0, 2.0, 3.0],
            "holey" => [Some(1.0), None, Some(3.0)],
        ]
        .unwrap();
        let strategy = MissingValueStrategy::drop(DropAxis::Columns, None);

        let cleaned = strategy.handle(&df).unwrap();
        assert_eq!(cleaned.width(), 1);
        assert!(cleaned.column("full").is_ok());
    }

    #[test]
    fn test_fill_mean() {
        let df = df![
            "area" => [Some(10.0), None, Some(20.0)],
        ]
        .unwrap();
        let strategy = MissingValueStrategy::fill("mean");

        let filled = strategy.handle(&df).unwrap();
        let area = filled.column("area").unwrap();
        assert_eq!(area.null_count(), 0);
        assert_eq!(
            area.as_materialized_series().f64().unwrap().get(1),
            Some(15.0)
        );
    }

    #[test]
    fn test_fill_median() {
        let df = df![
            "area" => [Some(1.0), None, Some(3.0), Some(100.0)],
        ]
        .unwrap();
        let strategy = MissingValueStrategy::fill("median");

        let filled = strategy.handle(&df).unwrap();
        let area = filled.column("area").unwrap();
        assert_eq!(
            area.as_materialized_series().f64().unwrap().get(1),
            Some(3.0)
        );
    }

    #[test]
    fn test_fill_constant() {
        let df = df![
            "area" => [Some(1.0), None],
        ]
        .unwrap();
        let strategy = MissingValueStrategy::fill_constant(-1.0);

        let filled = strategy.handle(&df).unwrap();
        assert_eq!(
            filled
                .column("area")
                .unwrap()
                .as_materialized_series()
                .f64()
                .unwrap()
                .get(1),
            Some(-1.0)
        );
    }

    #[test]
    fn test_fill_constant_without_value_is_config_error() {
        let df = df!["area" => [Some(1.0), None]].unwrap();
        let strategy = MissingValueStrategy::fill("constant");

        let result = strategy.handle(&df);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_fill_unknown_method_is_lenient() {
        let df = frame_with_nulls();
        let strategy = MissingValueStrategy::fill("interpolate");

        let result = strategy.handle(&df).unwrap();
        assert_eq!(result.height(), df.height());
        // Nulls untouched.
        assert_eq!(result.column("area").unwrap().null_count(), 1);
    }

    #[test]
    fn test_fill_is_noop_without_nulls() {
        let df = df![
            "area" => [1.0, 2.0, 3.0],
            "zone" => ["A", "B", "C"],
        ]
        .unwrap();
        let strategy = MissingValueStrategy::fill("mean");

        let filled = strategy.handle(&df).unwrap();
        assert!(filled.equals(&df));
    }

    #[test]
    fn test_fill_skips_categorical_columns() {
        let df = frame_with_nulls();
        let strategy = MissingValueStrategy::fill("mean");

        let filled = strategy.handle(&df).unwrap();
        // String column keeps its null; numeric ones are filled.
        assert_eq!(filled.column("zone").unwrap().null_count(), 1);
        assert_eq!(filled.column("area").unwrap().null_count(), 0);
        assert_eq!(filled.column("price").unwrap().null_count(), 0);
    }

    #[test]
    fn test_fill_leaves_all_null_column() {
        let df = df![
            "empty" => [Option::<f64>::None, None],
            "area" => [Some(1.0), None],
        ]
        .unwrap();
        let strategy = MissingValueStrategy::fill("mean");

        let filled = strategy.handle(&df).unwrap();
        assert_eq!(filled.column("empty").unwrap().null_count(), 2);
        assert_eq!(filled.column("area").unwrap().null_count(), 0);
    }

    #[test]
    fn test_context_set_strategy() {
        let df = frame_with_nulls();
        let mut handler = MissingValueHandler::new(MissingValueStrategy::fill("mean"));

        let filled = handler.handle_missing_values(&df).unwrap();
        assert_eq!(filled.height(), 4);

        handler.set_strategy(MissingValueStrategy::drop(DropAxis::Rows, None));
        let dropped = handler.handle_missing_values(&df).unwrap();
        assert_eq!(dropped.height(), 1);
    }

    #[test]
    fn test_strategy_from_name() {
        assert!(missing_value_strategy_from_name("drop", None).is_ok());
        assert!(missing_value_strategy_from_name("median", None).is_ok());
        assert!(matches!(
            missing_value_strategy_from_name("impute_fancy", None),
            Err(PipelineError::UnsupportedStrategy(_))
        ));
    }
}
