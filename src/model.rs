//! Model building strategies.
//!
//! Fits an ordinary least squares regression over a preprocessed design
//! matrix: numeric features are mean-imputed and standardized, categorical
//! features are mode-imputed and one-hot encoded (drop-first, so the
//! intercept stays identifiable) over the categories seen at fit time.
//! The fitted [`RegressionModel`] records the exact ordered list of
//! post-encoding columns, since inference requires an identically aligned
//! matrix.

use crate::error::{PipelineError, Result};
use crate::utils::{
    categorical_column_names, fill_numeric_nulls, fill_string_nulls, is_categorical_dtype,
    is_numeric_dtype, numeric_column_names, series_std, sorted_categories, string_mode,
};
use linfa::Dataset;
use linfa::traits::Fit;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Fitted parameters of one standardized numeric feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NumericFeature {
    name: String,
    /// Mean of the training column, used both as the imputation value and
    /// as the centering term.
    mean: f64,
    /// Population standard deviation after imputation; 1.0 for constant
    /// columns.
    std: f64,
}

/// Fitted parameters of one one-hot encoded categorical feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CategoricalFeature {
    name: String,
    /// Mode of the training column, used as the imputation value.
    fill: String,
    /// Indicator categories: the sorted fit-time categories minus the
    /// first (baseline). Baseline and unseen categories encode as
    /// all-zeros at inference.
    categories: Vec<String>,
}

/// A fitted linear regression over a fixed, ordered set of input columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionModel {
    coefficients: Vec<f64>,
    intercept: f64,
    expected_columns: Vec<String>,
    numeric_features: Vec<NumericFeature>,
    categorical_features: Vec<CategoricalFeature>,
}

impl RegressionModel {
    /// The ordered post-encoding column list recorded at fit time.
    pub fn expected_columns(&self) -> &[String] {
        &self.expected_columns
    }

    /// Fitted coefficients, aligned with [`expected_columns`](Self::expected_columns).
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Predict target values for a feature frame.
    ///
    /// The frame must carry every column the model was fitted on; the
    /// stored imputation, scaling and encoding parameters rebuild a design
    /// matrix aligned with the fit-time columns.
    pub fn predict(&self, df: &DataFrame) -> Result<Vec<f64>> {
        let matrix = build_design_matrix(
            df,
            &self.numeric_features,
            &self.categorical_features,
        )?;

        let predictions = matrix
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .zip(&self.coefficients)
                    .map(|(x, beta)| x * beta)
                    .sum::<f64>()
                    + self.intercept
            })
            .collect();
        Ok(predictions)
    }
}

/// A model building strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ModelBuildingStrategy {
    /// Ordinary least squares linear regression.
    #[default]
    LinearRegression,
}

impl ModelBuildingStrategy {
    /// Select a model building strategy by its orchestration-layer name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "linear_regression" => Ok(Self::LinearRegression),
            other => Err(PipelineError::UnsupportedStrategy(format!(
                "Unsupported model building strategy '{other}'"
            ))),
        }
    }

    /// Fit the model on training features and target.
    pub fn build(&self, x_train: &DataFrame, y_train: &Series) -> Result<RegressionModel> {
        let Self::LinearRegression = self;

        if !is_numeric_dtype(y_train.dtype()) {
            return Err(PipelineError::TypeMismatch {
                expected: "numeric target series".to_string(),
                actual: format!("series of dtype {}", y_train.dtype()),
            });
        }
        if y_train.len() != x_train.height() {
            return Err(PipelineError::TypeMismatch {
                expected: format!("target with {} rows", x_train.height()),
                actual: format!("target with {} rows", y_train.len()),
            });
        }
        if y_train.null_count() > 0 {
            return Err(PipelineError::TypeMismatch {
                expected: "complete numeric target series".to_string(),
                actual: format!("target with {} missing values", y_train.null_count()),
            });
        }
        if x_train.height() == 0 || x_train.width() == 0 {
            return Err(PipelineError::NoValidValues(
                "training features".to_string(),
            ));
        }

        info!("Initializing linear regression model");
        let (numeric_features, categorical_features) = fit_preprocessor(x_train)?;

        let mut expected_columns: Vec<String> = numeric_features
            .iter()
            .map(|feature| feature.name.clone())
            .collect();
        for feature in &categorical_features {
            for category in &feature.categories {
                expected_columns.push(format!("{}_{}", feature.name, category));
            }
        }
        debug!("Model expects the following columns: {:?}", expected_columns);

        let matrix = build_design_matrix(x_train, &numeric_features, &categorical_features)?;
        let targets: Array1<f64> = y_train
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .flatten()
            .collect();

        info!("Training linear regression model");
        let dataset = Dataset::new(matrix, targets);
        let fitted = LinearRegression::default()
            .fit(&dataset)
            .map_err(|e| PipelineError::ModelBuilding(e.to_string()))?;
        info!("Model training completed");

        Ok(RegressionModel {
            coefficients: fitted.params().to_vec(),
            intercept: fitted.intercept(),
            expected_columns,
            numeric_features,
            categorical_features,
        })
    }
}

fn fit_preprocessor(
    x_train: &DataFrame,
) -> Result<(Vec<NumericFeature>, Vec<CategoricalFeature>)> {
    let numeric_names = numeric_column_names(x_train);
    let categorical_names = categorical_column_names(x_train);
    debug!("Numeric columns: {:?}", numeric_names);
    debug!("Categorical columns: {:?}", categorical_names);

    let mut numeric_features = Vec::with_capacity(numeric_names.len());
    for name in &numeric_names {
        let series = x_train.column(name)?.as_materialized_series().clone();
        let mean = series
            .mean()
            .ok_or_else(|| PipelineError::NoValidValues(format!("column '{name}'")))?;
        let filled = fill_numeric_nulls(&series, mean)?;
        let std = series_std(&filled, 0)?.filter(|s| *s > 0.0).unwrap_or(1.0);
        numeric_features.push(NumericFeature {
            name: name.clone(),
            mean,
            std,
        });
    }

    let mut categorical_features = Vec::with_capacity(categorical_names.len());
    for name in &categorical_names {
        let series = x_train.column(name)?.as_materialized_series().clone();
        let fill = string_mode(&series)
            .ok_or_else(|| PipelineError::NoValidValues(format!("column '{name}'")))?;
        let filled = fill_string_nulls(&series, &fill)?;
        let mut categories = sorted_categories(&filled)?;
        // The full indicator set is collinear with the intercept; drop the
        // baseline category.
        categories.remove(0);
        categorical_features.push(CategoricalFeature {
            name: name.clone(),
            fill,
            categories,
        });
    }

    Ok((numeric_features, categorical_features))
}

fn build_design_matrix(
    df: &DataFrame,
    numeric_features: &[NumericFeature],
    categorical_features: &[CategoricalFeature],
) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = numeric_features.len()
        + categorical_features
            .iter()
            .map(|feature| feature.categories.len())
            .sum::<usize>();
    let mut matrix = Array2::<f64>::zeros((n_rows, n_cols));
    let mut col_idx = 0;

    for feature in numeric_features {
        let col = df
            .column(&feature.name)
            .map_err(|_| PipelineError::ColumnNotFound(feature.name.clone()))?;
        if !is_numeric_dtype(col.dtype()) {
            return Err(PipelineError::TypeMismatch {
                expected: "numeric column".to_string(),
                actual: format!("{} ({})", feature.name, col.dtype()),
            });
        }
        let filled = fill_numeric_nulls(col.as_materialized_series(), feature.mean)?;
        for (row, value) in filled.f64()?.into_iter().enumerate() {
            let value = value.unwrap_or(feature.mean);
            matrix[[row, col_idx]] = (value - feature.mean) / feature.std;
        }
        col_idx += 1;
    }

    for feature in categorical_features {
        let col = df
            .column(&feature.name)
            .map_err(|_| PipelineError::ColumnNotFound(feature.name.clone()))?;
        if !is_categorical_dtype(col.dtype()) {
            return Err(PipelineError::TypeMismatch {
                expected: "categorical column".to_string(),
                actual: format!("{} ({})", feature.name, col.dtype()),
            });
        }
        let filled = fill_string_nulls(col.as_materialized_series(), &feature.fill)?;
        let values = filled.str()?;
        for (offset, category) in feature.categories.iter().enumerate() {
            for (row, value) in values.into_iter().enumerate() {
                if value == Some(category.as_str()) {
                    matrix[[row, col_idx + offset]] = 1.0;
                }
            }
        }
        col_idx += feature.categories.len();
    }

    Ok(matrix)
}

/// Context holding the currently selected model building strategy.
pub struct ModelBuilder {
    strategy: ModelBuildingStrategy,
}

impl ModelBuilder {
    pub fn new(strategy: ModelBuildingStrategy) -> Self {
        Self { strategy }
    }

    pub fn set_strategy(&mut self, strategy: ModelBuildingStrategy) {
        self.strategy = strategy;
    }

    /// Execute the held strategy against the training data.
    pub fn build_model(&self, x_train: &DataFrame, y_train: &Series) -> Result<RegressionModel> {
        self.strategy.build(x_train, y_train)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_frame() -> (DataFrame, Series) {
        // price = 100 * area + 10
        let areas: Vec<f64> = (1..=20).map(|v| v as f64).collect();
        let prices: Vec<f64> = areas.iter().map(|a| 100.0 * a + 10.0).collect();
        let x = df!["area" => areas].unwrap();
        let y = Series::new("price".into(), prices);
        (x, y)
    }

    #[test]
    fn test_build_recovers_linear_relation() {
        let (x, y) = linear_frame();
        let model = ModelBuildingStrategy::LinearRegression.build(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        for (pred, actual) in predictions.iter().zip(y.f64().unwrap().into_iter().flatten()) {
            assert!((pred - actual).abs() < 1e-6, "{pred} vs {actual}");
        }
    }

    #[test]
    fn test_expected_columns_numeric_then_encoded() {
        let areas: Vec<f64> = (1..=12).map(|v| 900.0 + 100.0 * v as f64).collect();
        let rooms: Vec<f64> = (1..=12).map(|v| 2.0 + (v % 4) as f64).collect();
        let zones: Vec<&str> = (0..12)
            .map(|v| match v % 3 {
                0 => "A",
                1 => "B",
                _ => "C",
            })
            .collect();
        let prices: Vec<f64> = areas.iter().map(|a| 90.0 * a).collect();

        let x = df![
            "area" => areas,
            "zone" => zones,
            "rooms" => rooms,
        ]
        .unwrap();
        let y = Series::new("price".into(), prices);

        let model = ModelBuildingStrategy::LinearRegression.build(&x, &y).unwrap();
        // Numeric columns in frame order, then drop-first indicators.
        assert_eq!(
            model.expected_columns(),
            &["area", "rooms", "zone_B", "zone_C"]
        );
        assert_eq!(model.coefficients().len(), 4);
    }

    #[test]
    fn test_build_imputes_missing_values() {
        let x = df![
            "area" => [Some(1000.0), None, Some(2000.0), Some(1500.0)],
            "zone" => [Some("A"), Some("A"), None, Some("B")],
        ]
        .unwrap();
        let y = Series::new("price".into(), &[100.0, 150.0, 300.0, 200.0]);

        let model = ModelBuildingStrategy::LinearRegression.build(&x, &y).unwrap();
        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions.len(), 4);
        assert!(predictions.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_build_rejects_non_numeric_target() {
        let x = df!["area" => [1.0, 2.0]].unwrap();
        let y = Series::new("price".into(), &["high", "low"]);

        let result = ModelBuildingStrategy::LinearRegression.build(&x, &y);
        assert!(matches!(result, Err(PipelineError::TypeMismatch { .. })));
    }

    #[test]
    fn test_build_rejects_length_mismatch() {
        let x = df!["area" => [1.0, 2.0, 3.0]].unwrap();
        let y = Series::new("price".into(), &[10.0, 20.0]);

        let result = ModelBuildingStrategy::LinearRegression.build(&x, &y);
        assert!(matches!(result, Err(PipelineError::TypeMismatch { .. })));
    }

    #[test]
    fn test_build_rejects_target_with_nulls() {
        let x = df!["area" => [1.0, 2.0]].unwrap();
        let y = Series::new("price".into(), &[Some(10.0), None]);

        let result = ModelBuildingStrategy::LinearRegression.build(&x, &y);
        assert!(matches!(result, Err(PipelineError::TypeMismatch { .. })));
    }

    #[test]
    fn test_predict_missing_column_fails() {
        let (x, y) = linear_frame();
        let model = ModelBuildingStrategy::LinearRegression.build(&x, &y).unwrap();

        let other = df!["size" => [1.0, 2.0]].unwrap();
        let result = model.predict(&other);
        assert!(matches!(result, Err(PipelineError::ColumnNotFound(_))));
    }

    #[test]
    fn test_predict_unseen_category_encodes_as_zeros() {
        let x = df![
            "area" => [1000.0, 1500.0, 2000.0],
            "zone" => ["A", "B", "A"],
        ]
        .unwrap();
        let y = Series::new("price".into(), &[100.0, 200.0, 300.0]);
        let model = ModelBuildingStrategy::LinearRegression.build(&x, &y).unwrap();

        let unseen = df![
            "area" => [1200.0],
            "zone" => ["Z"],
        ]
        .unwrap();
        let predictions = model.predict(&unseen).unwrap();
        assert_eq!(predictions.len(), 1);
        assert!(predictions[0].is_finite());
    }

    #[test]
    fn test_context_build_model() {
        let (x, y) = linear_frame();
        let builder = ModelBuilder::new(ModelBuildingStrategy::default());

        let model = builder.build_model(&x, &y).unwrap();
        assert_eq!(model.expected_columns(), &["area"]);
    }

    #[test]
    fn test_strategy_from_name() {
        assert_eq!(
            ModelBuildingStrategy::from_name("linear_regression").unwrap(),
            ModelBuildingStrategy::LinearRegression
        );
        assert!(matches!(
            ModelBuildingStrategy::from_name("xgboost"),
            Err(PipelineError::UnsupportedStrategy(_))
        ));
    }
}
