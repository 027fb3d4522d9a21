use crate::stats::{PositionSetKey, StatsBundle};
use polars::prelude::*;
use std::collections::BTreeMap;

/// Represents a table of mutation counts for one position set
/// Stored as a DataFrame with columns mut, base (or base1..basek), count
pub type CountsTable = DataFrame;

/// Represents a table of counts over every flanking position
/// Stored as a DataFrame with columns mut, pos0..posN, count
pub type PositionCountsTable = DataFrame;

/// Collection of fitted statistics indexed by position set
pub type StatsCollection = BTreeMap<PositionSetKey, StatsBundle>;

/// Name of the mutation direction column
pub const MUT_COLUMN: &str = "mut";

/// Name of the observed count column
pub const COUNT_COLUMN: &str = "count";

/// Largest number of positions a single model can cross
pub const MAX_POSITIONS: usize = 4;
