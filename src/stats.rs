use crate::error::Result;
use crate::results::AnnotatedTable;
use crate::types::StatsCollection;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// Identifies the flanking positions modelled by one fit.
///
/// Written in tuple notation, `(1,)` or `(1, 2)`. Keys that do not parse as
/// a tuple of integers are kept verbatim as `Raw`. A `Raw` label written in
/// tuple notation would read back as `Positions`, so build raw keys with
/// `PositionSetKey::raw`, which refuses such labels.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PositionSetKey {
    Positions(Vec<usize>),
    Raw(String),
}

impl PositionSetKey {
    /// Creates a `Raw` key, or `None` if `label` would parse as a position tuple.
    pub fn raw(label: impl Into<String>) -> Option<Self> {
        let label = label.into();
        match parse_positions(&label) {
            Some(_) => None,
            None => Some(PositionSetKey::Raw(label)),
        }
    }

    /// Parses tuple notation, falling back to `Raw` for anything else.
    pub fn parse(key: &str) -> Self {
        parse_positions(key)
            .map(PositionSetKey::Positions)
            .unwrap_or_else(|| PositionSetKey::Raw(key.to_string()))
    }
}

fn parse_positions(key: &str) -> Option<Vec<usize>> {
    let inner = key.trim().strip_prefix('(')?.strip_suffix(')')?;
    let inner = inner.trim();
    if inner.is_empty() {
        return None;
    }
    let (inner, trailing_comma) = match inner.strip_suffix(',') {
        Some(rest) => (rest, true),
        None => (inner, false),
    };
    let positions = inner
        .split(',')
        .map(|part| part.trim().parse::<usize>().ok())
        .collect::<Option<Vec<_>>>()?;
    // a lone value needs its trailing comma to be a tuple
    if positions.len() == 1 && !trailing_comma {
        return None;
    }
    Some(positions)
}

impl fmt::Display for PositionSetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSetKey::Positions(positions) if positions.len() == 1 => {
                write!(f, "({},)", positions[0])
            }
            PositionSetKey::Positions(positions) => {
                let parts: Vec<String> = positions.iter().map(|p| p.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
            PositionSetKey::Raw(key) => f.write_str(key),
        }
    }
}

impl FromStr for PositionSetKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(PositionSetKey::parse(s))
    }
}

impl From<Vec<usize>> for PositionSetKey {
    fn from(positions: Vec<usize>) -> Self {
        PositionSetKey::Positions(positions)
    }
}

impl Serialize for PositionSetKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PositionSetKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(PositionSetKey::parse(&key))
    }
}

/// Fitted statistics for one position set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsBundle {
    /// Total relative entropy, deviance / 2N
    pub total_re: f64,
    pub deviance: f64,
    /// Null-model degrees of freedom, rows - 1
    pub df: usize,
    pub stats: AnnotatedTable,
    pub formula: String,
}

/// Serializes a stats collection to a JSON string keyed by position set.
pub fn to_json_string(data: &StatsCollection) -> Result<String> {
    Ok(serde_json::to_string(data)?)
}

/// Parses a stats collection from JSON produced by `to_json_string`.
pub fn from_json_str(json: &str) -> Result<StatsCollection> {
    Ok(serde_json::from_str(json)?)
}

/// Saves a stats collection in JSON format to `outfile_path`.
///
/// # Errors
/// * Returns `LogLinError::Io` for file writing issues
/// * Returns `LogLinError::Json` if serialization fails
pub fn dump_loglin_stats(data: &StatsCollection, outfile_path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(outfile_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, data)?;
    writer.flush()?;
    Ok(())
}

/// Reads a stats collection written by `dump_loglin_stats`.
///
/// Keys are parsed back into position tuples where possible; other keys are
/// retained as `PositionSetKey::Raw`.
///
/// # Errors
/// * Returns `LogLinError::Io` if the file cannot be opened or read
/// * Returns `LogLinError::Json` if the content is not a valid stats collection
pub fn load_loglin_stats(infile_path: impl AsRef<Path>) -> Result<StatsCollection> {
    let file = File::open(infile_path)?;
    let data = serde_json::from_reader(BufReader::new(file))?;
    Ok(data)
}
