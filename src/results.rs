use crate::error::{LogLinError, Result};
use crate::types::COUNT_COLUMN;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One row of fitted statistics: the factor labels, observed and fitted counts,
/// and the residual relative entropy of the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRow {
    pub labels: Vec<String>,
    pub count: u64,
    pub fitted: f64,
    pub ret: f64,
}

/// A counts table annotated with `fitted` and `ret`, sorted on the factor columns.
///
/// Serialized row-oriented as `{"factors": [...], "rows": [{"labels": [...],
/// "count": .., "fitted": .., "ret": ..}, ...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedTable {
    pub factors: Vec<String>,
    pub rows: Vec<AnnotatedRow>,
}

impl AnnotatedTable {
    /// Collects rows and sorts them ascending on the factor labels, left to right.
    pub fn new(factors: Vec<String>, mut rows: Vec<AnnotatedRow>) -> Self {
        rows.sort_by(|a, b| a.labels.cmp(&b.labels));
        AnnotatedTable { factors, rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Column names in output order: factors, then count, fitted and ret.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = self.factors.clone();
        names.extend([COUNT_COLUMN, "fitted", "ret"].map(String::from));
        names
    }

    /// Sum of the per-row residual relative entropy.
    pub fn total_ret(&self) -> f64 {
        self.rows.iter().map(|row| row.ret).sum()
    }

    /// Converts the table into a DataFrame with columns `[factors..., count, fitted, ret]`.
    ///
    /// # Errors
    /// * Returns `LogLinError::DataError` if DataFrame creation fails
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns: Vec<Column> = self
            .factors
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let labels: Vec<&str> = self.rows.iter().map(|r| r.labels[i].as_str()).collect();
                Column::new(name.as_str().into(), labels)
            })
            .collect();
        columns.push(Column::new(
            COUNT_COLUMN.into(),
            self.rows.iter().map(|r| r.count).collect::<Vec<u64>>(),
        ));
        columns.push(Column::new(
            "fitted".into(),
            self.rows.iter().map(|r| r.fitted).collect::<Vec<f64>>(),
        ));
        columns.push(Column::new(
            "ret".into(),
            self.rows.iter().map(|r| r.ret).collect::<Vec<f64>>(),
        ));

        DataFrame::new(columns).map_err(|e| LogLinError::DataError(e.to_string()))
    }
}

/// Joins decoded rows with fitted values and residual relative entropy terms.
///
/// # Errors
/// * Returns `LogLinError::Validation` if the three inputs differ in length
pub fn assemble(
    factors: Vec<String>,
    labels: Vec<Vec<String>>,
    counts: &[u64],
    fitted: &[f64],
    ret: &[f64],
) -> Result<AnnotatedTable> {
    let n = labels.len();
    if counts.len() != n || fitted.len() != n || ret.len() != n {
        return Err(LogLinError::validation(format!(
            "cannot assemble {} rows with {} counts, {} fitted values and {} ret terms",
            n,
            counts.len(),
            fitted.len(),
            ret.len()
        )));
    }

    let rows = labels
        .into_iter()
        .enumerate()
        .map(|(i, labels)| AnnotatedRow {
            labels,
            count: counts[i],
            fitted: fitted[i],
            ret: ret[i],
        })
        .collect();

    Ok(AnnotatedTable::new(factors, rows))
}
