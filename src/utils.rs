//! Shared utilities for the prediction pipeline.
//!
//! Dtype predicates, null-filling helpers and the column statistics the
//! strategies share (mode, quantiles, standard deviation).

use polars::prelude::*;
use std::collections::HashMap;

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is treated as categorical by the pipeline.
#[inline]
pub fn is_categorical_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String | DataType::Categorical(_, _))
}

/// Names of all numeric columns, in frame order.
pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| is_numeric_dtype(col.dtype()))
        .map(|col| col.name().to_string())
        .collect()
}

/// Names of all categorical (string) columns, in frame order.
pub fn categorical_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| is_categorical_dtype(col.dtype()))
        .map(|col| col.name().to_string())
        .collect()
}

/// Fill null values in a numeric Series with a specific value.
///
/// The result is always Float64.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let cast = series.cast(&DataType::Float64)?;
    let filled: Vec<f64> = cast
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let filled: Vec<String> = series
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value).to_string())
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Most frequent value of a numeric Series.
///
/// Ties resolve to the smallest value; returns `None` for all-null input.
pub fn numeric_mode(series: &Series) -> Option<f64> {
    let cast = series.cast(&DataType::Float64).ok()?;
    let mut counts: HashMap<u64, (f64, usize)> = HashMap::new();
    for val in cast.f64().ok()?.into_iter().flatten() {
        let entry = counts.entry(val.to_bits()).or_insert((val, 0));
        entry.1 += 1;
    }
    counts
        .into_values()
        .max_by(|(a_val, a_count), (b_val, b_count)| {
            a_count
                .cmp(b_count)
                .then(b_val.partial_cmp(a_val).unwrap_or(std::cmp::Ordering::Equal))
        })
        .map(|(val, _)| val)
}

/// Most frequent value of a string Series.
///
/// Ties resolve to the lexicographically smallest value; returns `None`
/// for all-null input.
pub fn string_mode(series: &Series) -> Option<String> {
    let chunked = series.str().ok()?;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for val in chunked.into_iter().flatten() {
        *counts.entry(val).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(a_val, a_count), (b_val, b_count)| a_count.cmp(b_count).then(b_val.cmp(a_val)))
        .map(|(val, _)| val.to_string())
}

/// Quantile of a numeric Series computed over sorted non-null values.
///
/// Uses the sorted-index method: the value at index `floor(n * q)` of the
/// ascending non-null values. Returns `None` when the series has no
/// non-null values.
pub fn sorted_quantile(series: &Series, q: f64) -> PolarsResult<Option<f64>> {
    let non_null = series.drop_nulls();
    if non_null.is_empty() {
        return Ok(None);
    }
    let sorted = non_null.cast(&DataType::Float64)?.sort(SortOptions::default())?;
    let n = sorted.len();
    let idx = ((n as f64 * q) as usize).min(n - 1);
    Ok(sorted.f64()?.get(idx))
}

/// Standard deviation of a numeric Series with the given delta degrees of
/// freedom. Returns `None` when there are fewer than `ddof + 1` values.
pub fn series_std(series: &Series, ddof: u8) -> PolarsResult<Option<f64>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast.f64()?.std(ddof))
}

/// Sorted unique non-null values of a string Series.
pub fn sorted_categories(series: &Series) -> PolarsResult<Vec<String>> {
    let mut categories: Vec<String> = series
        .str()?
        .into_iter()
        .flatten()
        .map(|v| v.to_string())
        .collect();
    categories.sort();
    categories.dedup();
    Ok(categories)
}
