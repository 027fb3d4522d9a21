use crate::error::{LogLinError, Result};
use crate::io::open_reader;
use ndarray::{Array2, Axis};
use phf::phf_map;
use polars::prelude::*;
use std::io::BufRead;
use std::path::Path;

/// Index of each nucleotide in the T, C, A, G alphabet
static DNA_INDEX: phf::Map<char, u8> = phf_map! {
    'T' => 0,
    'C' => 1,
    'A' => 2,
    'G' => 3,
};

const DNA_ALPHABET: [char; 4] = ['T', 'C', 'A', 'G'];

/// Index used for gaps, ambiguity codes and any other non-canonical character
pub const NON_NUCLEOTIDE: u8 = 4;

/// Reads sequences from a FASTA file, optionally gzip compressed, into a Polars DataFrame.
///
/// # Arguments
/// * `filename` - Path to the FASTA file to read
///
/// # Returns
/// * `Result<DataFrame>` - A DataFrame with two columns:
///   - "label": The sequence identifiers (without '>' prefix)
///   - "sequence": The corresponding DNA sequences in uppercase
///
/// # Errors
/// * Returns `LogLinError::InvalidFileFormat` if no sequences are found
/// * Returns `LogLinError::DataError` if DataFrame creation fails
/// * Returns `std::io::Error` for file reading issues
pub fn read_fasta(filename: impl AsRef<Path>) -> Result<DataFrame> {
    let mut sequences: Vec<(String, String)> = Vec::new();
    let reader = open_reader(filename)?;

    let mut current_header: Option<String> = None;
    let mut current_sequence = String::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        if let Some(header) = line.strip_prefix('>') {
            if let Some(label) = current_header.take() {
                sequences.push((label, current_sequence.to_uppercase()));
                current_sequence.clear();
            }
            current_header = Some(header.to_string());
        } else if !line.is_empty() {
            current_sequence.push_str(line);
        }
    }

    if let Some(label) = current_header {
        sequences.push((label, current_sequence.to_uppercase()));
    }

    if sequences.is_empty() {
        return Err(LogLinError::InvalidFileFormat("No sequences found".into()));
    }

    let (labels, sequences): (Vec<String>, Vec<String>) = sequences.into_iter().unzip();
    let df = DataFrame::new(vec![
        Column::new("label".into(), labels),
        Column::new("sequence".into(), sequences),
    ])
    .map_err(|_| LogLinError::DataError("Failed to create DataFrame".into()))?;

    Ok(df)
}

/// Encodes equal-length sequences as a matrix of nucleotide indices.
///
/// # Arguments
/// * `sequences` - DNA sequences, one per row of the result
///
/// # Returns
/// * `Result<Array2<u8>>` - Indices in T, C, A, G order; other characters map to `NON_NUCLEOTIDE`
///
/// # Errors
/// * Returns `LogLinError::InvalidSequence` if a sequence differs in length from the first
pub fn sequences_to_array<S: AsRef<str>>(sequences: &[S]) -> Result<Array2<u8>> {
    let width = sequences.first().map(|s| s.as_ref().chars().count()).unwrap_or(0);
    let mut array = Array2::<u8>::from_elem((sequences.len(), width), NON_NUCLEOTIDE);

    for (i, seq) in sequences.iter().enumerate() {
        let seq = seq.as_ref();
        let length = seq.chars().count();
        if length != width {
            return Err(LogLinError::invalid_sequence(
                i,
                format!("length {} differs from aligned length {}", length, width),
            ));
        }
        for (j, base) in seq.chars().enumerate() {
            array[[i, j]] = DNA_INDEX
                .get(&base.to_ascii_uppercase())
                .copied()
                .unwrap_or(NON_NUCLEOTIDE);
        }
    }
    Ok(array)
}

/// Returns true if every element is a canonical nucleotide index, 0 <= e < 4.
pub fn is_valid(data: &Array2<u8>) -> bool {
    data.iter().all(|&e| e < NON_NUCLEOTIDE)
}

/// Keeps only the rows made up entirely of canonical nucleotides.
pub fn just_nucs(data: &Array2<u8>) -> Array2<u8> {
    let indices: Vec<usize> = data
        .axis_iter(Axis(0))
        .enumerate()
        .filter(|(_, row)| row.iter().all(|&e| e < NON_NUCLEOTIDE))
        .map(|(i, _)| i)
        .collect();
    data.select(Axis(0), &indices)
}

/// Converts a matrix of nucleotide indices back to DNA sequences.
///
/// Non-canonical indices are rendered as `N`.
pub fn array_to_sequences(data: &Array2<u8>) -> Vec<String> {
    data.axis_iter(Axis(0))
        .map(|row| {
            row.iter()
                .map(|&e| DNA_ALPHABET.get(e as usize).copied().unwrap_or('N'))
                .collect()
        })
        .collect()
}
