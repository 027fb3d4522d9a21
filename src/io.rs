use crate::error::{LogLinError, Result};
use crate::types::COUNT_COLUMN;
use flate2::read::MultiGzDecoder;
use polars::prelude::*;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Opens a file for buffered reading, decompressing `.gz` files on the fly.
///
/// # Errors
/// * Returns `LogLinError::InvalidFileFormat` for `.bz2` files, which are not supported
/// * Returns `std::io::Error` for file opening issues
pub fn open_reader(path: impl AsRef<Path>) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let file = File::open(path)?;
    let reader: Box<dyn Read> = match extension {
        "gz" => Box::new(MultiGzDecoder::new(file)),
        "bz2" => {
            return Err(LogLinError::InvalidFileFormat(format!(
                "bzip2 compression is not supported: {}",
                path.display()
            )))
        }
        _ => Box::new(file),
    };
    Ok(Box::new(BufReader::new(reader)))
}

/// Reads a delimited counts table into a Polars DataFrame.
///
/// # Arguments
/// * `path` - Path to the table, optionally gzip compressed
/// * `sep` - Field delimiter, usually `'\t'`
///
/// # Returns
/// * `Result<DataFrame>` - One column per header field. The "count" column is
///   Int64, every other column is a String column
///
/// # Errors
/// * Returns `LogLinError::InvalidFileFormat` if the header is missing, has no
///   count column, or a row has the wrong number of fields
/// * Returns `LogLinError::InvalidCount` if a count is not a non-negative integer
/// * Returns `LogLinError::DataError` if DataFrame creation fails
pub fn load_counts_table(path: impl AsRef<Path>, sep: char) -> Result<DataFrame> {
    let mut lines = open_reader(path)?.lines();

    let header: Vec<String> = match lines.next() {
        Some(line) => line?.trim().split(sep).map(|s| s.trim().to_string()).collect(),
        None => return Err(LogLinError::InvalidFileFormat("Empty counts table".into())),
    };
    let count_index = header
        .iter()
        .position(|h| h == COUNT_COLUMN)
        .ok_or_else(|| LogLinError::InvalidFileFormat("No count column in header".into()))?;

    let mut labels: Vec<Vec<String>> = vec![Vec::new(); header.len()];
    let mut counts: Vec<i64> = Vec::new();

    for line in lines {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row = counts.len();
        let fields: Vec<&str> = line.split(sep).map(str::trim).collect();
        if fields.len() != header.len() {
            return Err(LogLinError::InvalidFileFormat(format!(
                "Row {} has {} fields, expected {}",
                row,
                fields.len(),
                header.len()
            )));
        }
        for (i, field) in fields.iter().enumerate() {
            if i == count_index {
                let count = field
                    .parse::<i64>()
                    .ok()
                    .filter(|c| *c >= 0)
                    .ok_or_else(|| LogLinError::invalid_count(row, field))?;
                counts.push(count);
            } else {
                labels[i].push(field.to_string());
            }
        }
    }

    let columns = header
        .iter()
        .zip(labels)
        .enumerate()
        .map(|(i, (name, values))| {
            if i == count_index {
                Column::new(name.as_str().into(), counts.clone())
            } else {
                Column::new(name.as_str().into(), values)
            }
        })
        .collect::<Vec<_>>();

    DataFrame::new(columns).map_err(|e| LogLinError::DataError(e.to_string()))
}

/// Creates the parent directories of `path` if they don't exist.
pub fn create_parent_dirs(path: impl AsRef<Path>) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
