use crate::error::{LogLinError, Result};
use crate::formula::ModelFormula;
use crate::types::COUNT_COLUMN;
use polars::prelude::*;
use std::collections::BTreeSet;

/// A categorical column encoded against its sorted distinct labels.
///
/// Levels are in ascending lexical order, so level 0 is the alphabetically first
/// label and serves as the baseline under treatment contrasts. Codes are
/// 0-based indices into `levels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Factor {
    pub name: String,
    pub levels: Vec<String>,
    pub codes: Vec<usize>,
}

impl Factor {
    /// Encodes a column of labels.
    pub fn from_labels(name: impl Into<String>, labels: &[String]) -> Self {
        let levels: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let codes = labels
            .iter()
            .map(|label| levels.binary_search(label).unwrap_or_default())
            .collect();
        Factor {
            name: name.into(),
            levels,
            codes,
        }
    }

    /// Number of distinct labels.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Maps a level code back to its original label.
    pub fn label(&self, code: usize) -> Option<&str> {
        self.levels.get(code).map(String::as_str)
    }

    /// Returns the original label of row `row`.
    pub fn row_label(&self, row: usize) -> Option<&str> {
        self.codes.get(row).and_then(|&code| self.label(code))
    }
}

/// A counts table in the form consumed by the model fitter.
///
/// Rows keep the order of the source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTable {
    pub factors: Vec<Factor>,
    pub counts: Vec<u64>,
}

impl EncodedTable {
    /// Number of rows.
    pub fn height(&self) -> usize {
        self.counts.len()
    }

    /// Sum of the count column, the sample size N.
    pub fn total_count(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Returns the original labels of row `row`, one per factor.
    pub fn row_labels(&self, row: usize) -> Vec<String> {
        self.factors
            .iter()
            .map(|factor| factor.row_label(row).unwrap_or_default().to_string())
            .collect()
    }
}

/// Counts the positional (`base*`) columns of a counts table.
pub fn num_base_columns(df: &DataFrame) -> usize {
    df.get_column_names()
        .iter()
        .filter(|name| name.starts_with("base"))
        .count()
}

/// Converts a counts table into factor codes and integer counts for fitting.
///
/// # Arguments
/// * `df` - DataFrame with the factor columns named by `formula` and a "count" column
/// * `formula` - Model whose factors select and order the categorical columns
///
/// # Returns
/// * `Result<EncodedTable>` - One `Factor` per formula factor, plus the counts
///
/// # Errors
/// * Returns `LogLinError::Validation` if a column is missing, a label is null,
///   the table is empty or all counts are zero
/// * Returns `LogLinError::InvalidCount` if a count is non-numeric, negative,
///   fractional or null
pub fn encode_counts_table(df: &DataFrame, formula: &ModelFormula) -> Result<EncodedTable> {
    if df.height() == 0 {
        return Err(LogLinError::validation("counts table has no rows"));
    }

    let factors = formula
        .factors()
        .iter()
        .map(|name| {
            let labels = string_column(df, name)?;
            Ok(Factor::from_labels(name.as_str(), &labels))
        })
        .collect::<Result<Vec<_>>>()?;

    let counts = count_column(df)?;
    if counts.iter().all(|&c| c == 0) {
        return Err(LogLinError::validation("counts table has a total count of zero"));
    }

    Ok(EncodedTable { factors, counts })
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = df
        .column(name)
        .map_err(|_| LogLinError::validation(format!("missing column {}", name)))?
        .cast(&DataType::String)
        .map_err(|e| LogLinError::DataError(e.to_string()))?;
    let labels = column
        .str()
        .map_err(|e| LogLinError::DataError(e.to_string()))?;

    labels
        .into_iter()
        .enumerate()
        .map(|(row, label)| {
            label.map(str::to_string).ok_or_else(|| {
                LogLinError::validation(format!("missing label in column {} at row {}", name, row))
            })
        })
        .collect()
}

fn count_column(df: &DataFrame) -> Result<Vec<u64>> {
    let column = df
        .column(COUNT_COLUMN)
        .map_err(|_| LogLinError::validation("missing column count"))?;

    let numeric = matches!(
        column.dtype(),
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
    );
    if !numeric {
        return Err(LogLinError::invalid_count(
            0,
            format!("count column has non-numeric type {}", column.dtype()),
        ));
    }

    let values = column
        .cast(&DataType::Float64)
        .map_err(|e| LogLinError::DataError(e.to_string()))?;
    let values = values
        .f64()
        .map_err(|e| LogLinError::DataError(e.to_string()))?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Ok(v as u64),
            Some(v) => Err(LogLinError::invalid_count(row, v)),
            None => Err(LogLinError::invalid_count(row, "null")),
        })
        .collect()
}
