//! Data ingestion.
//!
//! Ingestors are selected by file extension. The archive ingestor enforces
//! the input contract: a zip bundle must contain exactly one CSV file.

use crate::error::{PipelineError, Result};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, info};
use ::zip::ZipArchive;

/// A data ingestor, selected by input file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataIngestor {
    /// Zip archive containing exactly one CSV file.
    Zip,
    /// Bare CSV file.
    Csv,
}

impl DataIngestor {
    /// Select an ingestor for the given path by its extension.
    pub fn for_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("zip") => Ok(Self::Zip),
            Some("csv") => Ok(Self::Csv),
            other => Err(PipelineError::Ingest(format!(
                "'{}' is not a supported extension for data ingestion",
                other.unwrap_or("<none>")
            ))),
        }
    }

    /// Read the file at `path` into a frame.
    pub fn ingest(&self, path: &Path) -> Result<DataFrame> {
        match self {
            Self::Zip => ingest_zip(path),
            Self::Csv => ingest_csv(path),
        }
    }
}

fn ingest_zip(path: &Path) -> Result<DataFrame> {
    info!("Extracting archive {}", path.display());
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;

    let csv_names: Vec<String> = archive
        .file_names()
        .filter(|name| name.to_ascii_lowercase().ends_with(".csv"))
        .map(String::from)
        .collect();

    if csv_names.is_empty() {
        return Err(PipelineError::Ingest(
            "No CSV file found in the archive".to_string(),
        ));
    }
    if csv_names.len() > 1 {
        return Err(PipelineError::Ingest(format!(
            "More than one CSV file found in the archive: {csv_names:?}"
        )));
    }

    let mut entry = archive.by_name(&csv_names[0])?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut bytes)?;
    debug!("Reading '{}' ({} bytes)", csv_names[0], bytes.len());

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    info!("Dataset loaded: {:?}", df.shape());
    Ok(df)
}

/// Load a CSV with a fallback parse configuration.
fn ingest_csv(path: &Path) -> Result<DataFrame> {
    info!("Loading dataset from {}", path.display());

    let quoted = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish();

    match quoted {
        Ok(df) => {
            info!("Dataset loaded: {:?}", df.shape());
            Ok(df)
        }
        Err(e) => {
            debug!("Quoted parse failed ({}), retrying without quote handling", e);
            let df = CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(Some(100))
                .try_into_reader_with_file_path(Some(path.to_path_buf()))?
                .finish()?;
            info!("Dataset loaded: {:?}", df.shape());
            Ok(df)
        }
    }
}
