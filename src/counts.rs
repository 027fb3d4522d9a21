//! Builds per-position-set counts tables from a table over every flanking position.
use crate::error::{LogLinError, Result};
use crate::formula::factor_names;
use crate::stats::PositionSetKey;
use crate::types::{CountsTable, PositionCountsTable, COUNT_COLUMN, MAX_POSITIONS, MUT_COLUMN};
use polars::lazy::dsl::*;
use polars::prelude::*;

/// Returns the position indices of the `posN` columns, in ascending order.
pub fn position_columns(df: &PositionCountsTable) -> Vec<usize> {
    let mut positions: Vec<usize> = df
        .get_column_names()
        .iter()
        .filter_map(|name| name.strip_prefix("pos").and_then(|n| n.parse().ok()))
        .collect();
    positions.sort_unstable();
    positions
}

/// Enumerates every combination of 1 up to `max_order` positions.
///
/// Sets are ordered by size, then lexicographically.
///
/// # Errors
/// * Returns `LogLinError::Validation` if `max_order` is outside 1..=4
pub fn position_sets(positions: &[usize], max_order: usize) -> Result<Vec<PositionSetKey>> {
    if !(1..=MAX_POSITIONS).contains(&max_order) {
        return Err(LogLinError::validation(format!(
            "max order must be between 1 and {}, got {}",
            MAX_POSITIONS, max_order
        )));
    }

    let mut sets = Vec::new();
    for order in 1..=max_order.min(positions.len()) {
        let mut indices: Vec<usize> = (0..order).collect();
        loop {
            sets.push(PositionSetKey::Positions(
                indices.iter().map(|&i| positions[i]).collect(),
            ));
            // advance to the next combination
            let Some(i) = (0..order).rev().find(|&i| indices[i] != i + positions.len() - order)
            else {
                break;
            };
            indices[i] += 1;
            for j in (i + 1)..order {
                indices[j] = indices[j - 1] + 1;
            }
        }
    }
    Ok(sets)
}

/// Sums counts over all positions outside `positions`.
///
/// # Arguments
/// * `df` - DataFrame with columns mut, pos0..posN and count
/// * `positions` - Position indices to keep, matching `posN` column names
///
/// # Returns
/// * `Result<CountsTable>` - Columns mut, base (or base1..basek) and count, with
///   the kept positions renamed in the given order
///
/// # Errors
/// * Returns `LogLinError::Validation` if there are not 1-4 positions
/// * Returns `LogLinError::DataError` if a column is missing or aggregation fails
pub fn position_set_table(df: &PositionCountsTable, positions: &[usize]) -> Result<CountsTable> {
    let names = factor_names(positions.len())?;

    let mut selection = vec![col(MUT_COLUMN)];
    selection.extend(
        positions
            .iter()
            .zip(&names[1..])
            .map(|(p, name)| col(format!("pos{}", p)).alias(name.as_str())),
    );
    selection.push(col(COUNT_COLUMN));

    let keys: Vec<Expr> = names.iter().map(|name| col(name.as_str())).collect();

    df.clone()
        .lazy()
        .select(selection)
        .group_by(keys)
        .agg([col(COUNT_COLUMN).sum()])
        .collect()
        .map_err(|e| LogLinError::DataError(e.to_string()))
}
