//! Custom error types for the prediction pipeline.
//!
//! This module provides the error hierarchy used throughout the crate,
//! built on `thiserror`.
//!
//! Strategy *selection* errors (an unknown strategy name coming from the
//! orchestration layer) are fatal and surface as
//! [`PipelineError::UnsupportedStrategy`]. Unknown *method* options inside an
//! already-valid strategy (e.g. a fill method) are deliberately lenient:
//! the stage logs a warning and returns its input unchanged instead of
//! returning an error.

use thiserror::Error;

/// The main error type for the prediction pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid strategy or pipeline configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Wrong container or dtype handed to a stage.
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Unknown strategy name from the orchestration layer.
    #[error("Unsupported strategy: {0}")]
    UnsupportedStrategy(String),

    /// Data ingestion failed (bad archive, unsupported extension).
    #[error("Ingestion failed: {0}")]
    Ingest(String),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// No valid values found for a computation.
    #[error("No valid values found in {0}")]
    NoValidValues(String),

    /// A feature transformation failed on a specific column.
    #[error("Failed to transform column '{column}': {reason}")]
    Transform { column: String, reason: String },

    /// Model fitting failed.
    #[error("Model building failed: {0}")]
    ModelBuilding(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Zip archive error wrapper.
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this error came from invalid configuration.
    pub fn is_config_error(&self) -> bool {
        match self {
            Self::InvalidConfig(_) => true,
            Self::WithContext { source, .. } => source.is_config_error(),
            _ => false,
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_context_preserves_source() {
        let error = PipelineError::ColumnNotFound("SalePrice".to_string())
            .with_context("During split");
        assert!(error.to_string().contains("During split"));
        assert!(error.to_string().contains("SalePrice"));
    }

    #[test]
    fn test_is_config_error() {
        assert!(PipelineError::InvalidConfig("bad".into()).is_config_error());
        assert!(
            PipelineError::InvalidConfig("bad".into())
                .with_context("ctx")
                .is_config_error()
        );
        assert!(!PipelineError::NoValidValues("col".into()).is_config_error());
    }

    #[test]
    fn test_result_ext_on_polars_result() {
        let polars_err: std::result::Result<(), polars::error::PolarsError> = Err(
            polars::error::PolarsError::ComputeError("boom".into()),
        );
        let err = polars_err.context("While filtering").unwrap_err();
        assert!(err.to_string().contains("While filtering"));
    }
}
