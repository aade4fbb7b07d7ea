//! Experiment tracking hooks.
//!
//! The pipeline notifies a tracker at the start and end of a run; the
//! tracker receives the fitted model and run summary. [`LogTracker`]
//! records everything through `tracing`, which is enough for a
//! single-process setup; an embedding application can implement
//! [`ExperimentTracker`] to forward the same notifications elsewhere.

use crate::model::RegressionModel;
use crate::pipeline::runner::RunSummary;
use tracing::info;

/// Receiver of start/end-of-run notifications.
pub trait ExperimentTracker: Send + Sync {
    /// Called before the first stage executes.
    fn run_started(&self, run_name: &str);

    /// Called after the model has been fitted.
    fn run_finished(&self, model: &RegressionModel, summary: &RunSummary);
}

/// Tracker that logs run parameters through `tracing`.
pub struct LogTracker;

impl ExperimentTracker for LogTracker {
    fn run_started(&self, run_name: &str) {
        info!("Experiment run '{}' started", run_name);
    }

    fn run_finished(&self, model: &RegressionModel, summary: &RunSummary) {
        info!(
            "Experiment run finished in {}ms: {} train rows, {} test rows",
            summary.duration_ms, summary.train_rows, summary.test_rows
        );
        info!(
            "Fitted model: intercept {:.4}, {} coefficients over columns {:?}",
            model.intercept(),
            model.coefficients().len(),
            model.expected_columns()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingTracker {
        events: Mutex<Vec<String>>,
    }

    impl ExperimentTracker for RecordingTracker {
        fn run_started(&self, run_name: &str) {
            self.events.lock().unwrap().push(format!("start:{run_name}"));
        }

        fn run_finished(&self, model: &RegressionModel, _summary: &RunSummary) {
            self.events
                .lock()
                .unwrap()
                .push(format!("finish:{}", model.expected_columns().len()));
        }
    }

    #[test]
    fn test_custom_tracker_receives_events() {
        use crate::model::ModelBuildingStrategy;
        use polars::prelude::*;

        let x = df!["area" => [1.0, 2.0, 3.0]].unwrap();
        let y = Series::new("price".into(), &[10.0, 20.0, 30.0]);
        let model = ModelBuildingStrategy::LinearRegression.build(&x, &y).unwrap();

        let tracker = RecordingTracker {
            events: Mutex::new(Vec::new()),
        };
        tracker.run_started("test");
        tracker.run_finished(&model, &RunSummary::default());

        let events = tracker.events.lock().unwrap();
        assert_eq!(events.as_slice(), &["start:test", "finish:1"]);
    }
}
