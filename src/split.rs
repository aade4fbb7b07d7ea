//! Train/test splitting strategies.
//!
//! A single concrete strategy: a seeded shuffled partition. The seed is a
//! documented constant rather than caller-configurable so that repeated
//! runs and test fixtures see the same partition.

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Seed for the shuffled train/test partition.
pub const TRAIN_TEST_SEED: u64 = 42;

/// Default fraction of rows assigned to the test partition.
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// The four outputs of a train/test split.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: DataFrame,
    pub x_test: DataFrame,
    pub y_train: Series,
    pub y_test: Series,
}

/// A data splitting strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SplitStrategy {
    /// Random shuffled partition with a fixed seed.
    TrainTest { test_fraction: f64 },
}

impl Default for SplitStrategy {
    fn default() -> Self {
        Self::TrainTest {
            test_fraction: DEFAULT_TEST_FRACTION,
        }
    }
}

impl SplitStrategy {
    /// Shuffled train/test split with the given test fraction.
    ///
    /// The fraction must lie strictly between 0 and 1.
    pub fn train_test(test_fraction: f64) -> Result<Self> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "Invalid test fraction {test_fraction}: must be in (0, 1)"
            )));
        }
        Ok(Self::TrainTest { test_fraction })
    }

    /// Select a splitting strategy by its orchestration-layer name.
    pub fn from_name(name: &str, test_fraction: f64) -> Result<Self> {
        match name {
            "train_test" | "simple" => Self::train_test(test_fraction),
            other => Err(PipelineError::UnsupportedStrategy(format!(
                "Unsupported data splitting strategy '{other}'"
            ))),
        }
    }

    /// Split the frame into train/test features and targets.
    ///
    /// The target column is removed from the feature frames. The test
    /// partition holds `ceil(n * test_fraction)` rows; the two partitions
    /// are disjoint and exhaustive.
    pub fn split(&self, df: &DataFrame, target: &str) -> Result<TrainTestSplit> {
        let Self::TrainTest { test_fraction } = self;

        // Construction validates, but a deserialized strategy may not have
        // gone through the constructor.
        if !(*test_fraction > 0.0 && *test_fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "Invalid test fraction {test_fraction}: must be in (0, 1)"
            )));
        }
        if df.column(target).is_err() {
            return Err(PipelineError::InvalidConfig(format!(
                "Target column '{target}' not found in dataset"
            )));
        }

        info!(
            "Splitting data with test fraction {} and target '{}'",
            test_fraction, target
        );

        let n = df.height();
        let test_len = ((n as f64) * test_fraction).ceil() as usize;
        if n == 0 || test_len == 0 || test_len >= n {
            return Err(PipelineError::InvalidConfig(format!(
                "Cannot split {n} rows with test fraction {test_fraction}: \
                 both partitions must be non-empty"
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(TRAIN_TEST_SEED);
        indices.shuffle(&mut rng);

        let mut in_test = vec![false; n];
        for &idx in indices.iter().take(test_len) {
            in_test[idx] = true;
        }
        let test_mask = BooleanChunked::from_slice("test".into(), &in_test);
        let train_flags: Vec<bool> = in_test.iter().map(|flag| !flag).collect();
        let train_mask = BooleanChunked::from_slice("train".into(), &train_flags);

        let features = df.drop(target)?;
        let y = df.column(target)?.as_materialized_series().clone();

        let split = TrainTestSplit {
            x_train: features.filter(&train_mask)?,
            x_test: features.filter(&test_mask)?,
            y_train: y.filter(&train_mask)?,
            y_test: y.filter(&test_mask)?,
        };

        info!(
            "Data splitting completed: {} train rows, {} test rows",
            split.x_train.height(),
            split.x_test.height()
        );
        Ok(split)
    }
}

/// Context holding the currently selected splitting strategy.
pub struct DataSplitter {
    strategy: SplitStrategy,
}

impl DataSplitter {
    pub fn new(strategy: SplitStrategy) -> Self {
        Self { strategy }
    }

    pub fn set_strategy(&mut self, strategy: SplitStrategy) {
        self.strategy = strategy;
    }

    /// Execute the held strategy against the frame.
    pub fn apply_split(&self, df: &DataFrame, target: &str) -> Result<TrainTestSplit> {
        self.strategy.split(df, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hundred_rows() -> DataFrame {
        let ids: Vec<f64> = (0..100).map(|v| v as f64).collect();
        let prices: Vec<f64> = (0..100).map(|v| 1000.0 + v as f64).collect();
        df![
            "area" => ids,
            "price" => prices,
        ]
        .unwrap()
    }

    #[test]
    fn test_split_sizes() {
        let df = hundred_rows();
        let strategy = SplitStrategy::train_test(0.2).unwrap();

        let split = strategy.split(&df, "price").unwrap();
        assert_eq!(split.x_train.height(), 80);
        assert_eq!(split.x_test.height(), 20);
        assert_eq!(split.y_train.len(), 80);
        assert_eq!(split.y_test.len(), 20);
    }

    #[test]
    fn test_split_partitions_are_disjoint() {
        let df = hundred_rows();
        let strategy = SplitStrategy::train_test(0.2).unwrap();

        let split = strategy.split(&df, "price").unwrap();

        // The "area" column is a unique row id here.
        let mut seen: Vec<i64> = split
            .x_train
            .column("area")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .map(|v| v as i64)
            .collect();
        seen.extend(
            split
                .x_test
                .column("area")
                .unwrap()
                .as_materialized_series()
                .f64()
                .unwrap()
                .into_iter()
                .flatten()
                .map(|v| v as i64),
        );
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 100);
    }

    #[test]
    fn test_split_removes_target_from_features() {
        let df = hundred_rows();
        let strategy = SplitStrategy::default();

        let split = strategy.split(&df, "price").unwrap();
        assert!(split.x_train.column("price").is_err());
        assert!(split.x_test.column("price").is_err());
    }

    #[test]
    fn test_split_is_deterministic() {
        let df = hundred_rows();
        let strategy = SplitStrategy::default();

        let first = strategy.split(&df, "price").unwrap();
        let second = strategy.split(&df, "price").unwrap();
        assert!(first.x_train.equals(&second.x_train));
        assert!(first.y_test.equals(&second.y_test));
    }

    #[test]
    fn test_split_missing_target() {
        let df = hundred_rows();
        let strategy = SplitStrategy::default();

        let result = strategy.split(&df, "SalePrice");
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_fraction_rejected_at_construction() {
        assert!(SplitStrategy::train_test(0.0).is_err());
        assert!(SplitStrategy::train_test(1.0).is_err());
        assert!(SplitStrategy::train_test(-0.5).is_err());
        assert!(SplitStrategy::train_test(0.5).is_ok());
    }

    #[test]
    fn test_context_apply_split() {
        let df = hundred_rows();
        let splitter = DataSplitter::new(SplitStrategy::train_test(0.5).unwrap());

        let split = splitter.apply_split(&df, "price").unwrap();
        assert_eq!(split.x_train.height(), 50);
        assert_eq!(split.x_test.height(), 50);
    }

    #[test]
    fn test_strategy_from_name() {
        assert!(SplitStrategy::from_name("train_test", 0.2).is_ok());
        assert!(matches!(
            SplitStrategy::from_name("kfold", 0.2),
            Err(PipelineError::UnsupportedStrategy(_))
        ));
    }
}
