use mutation_loglin::counts::{position_columns, position_set_table, position_sets};
use mutation_loglin::error::LogLinError;
use mutation_loglin::io::{create_parent_dirs, load_counts_table, open_reader};
use mutation_loglin::stats::PositionSetKey;
use polars::prelude::*;

#[test]
fn test_load_counts_table() {
    let df = load_counts_table("tests/data/counts_pos.tsv", '\t').unwrap();
    assert_eq!(df.height(), 128);
    assert_eq!(df.width(), 5);
    assert_eq!(df.column("count").unwrap().dtype(), &DataType::Int64);
    assert_eq!(df.column("count").unwrap().i64().unwrap().sum(), Some(1620));

    // gzip compressed copy reads the same
    let gz = load_counts_table("tests/data/counts_pos.tsv.gz", '\t').unwrap();
    assert!(df.equals(&gz));

    assert!(load_counts_table("tests/data/nonexistent.tsv", '\t').is_err());
}

#[test]
fn test_load_rejects_bad_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.tsv");
    std::fs::write(&path, "mut\tbase\tcount\nM\tA\t3\nR\tA\t-2\n").unwrap();
    assert!(matches!(
        load_counts_table(&path, '\t'),
        Err(LogLinError::InvalidCount { row: 1, .. })
    ));

    std::fs::write(&path, "mut\tbase\nM\tA\n").unwrap();
    assert!(matches!(
        load_counts_table(&path, '\t'),
        Err(LogLinError::InvalidFileFormat(_))
    ));
}

#[test]
fn test_bz2_not_supported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counts.tsv.bz2");
    std::fs::write(&path, "").unwrap();
    assert!(matches!(
        open_reader(&path),
        Err(LogLinError::InvalidFileFormat(_))
    ));
}

#[test]
fn test_position_columns_and_sets() {
    let df = load_counts_table("tests/data/counts_pos.tsv", '\t').unwrap();
    let positions = position_columns(&df);
    assert_eq!(positions, vec![0, 1, 2]);

    let sets = position_sets(&positions, 2).unwrap();
    let expected: Vec<PositionSetKey> = [
        vec![0],
        vec![1],
        vec![2],
        vec![0, 1],
        vec![0, 2],
        vec![1, 2],
    ]
    .into_iter()
    .map(PositionSetKey::Positions)
    .collect();
    assert_eq!(sets, expected);

    // order capped by the number of positions
    assert_eq!(position_sets(&positions, 4).unwrap().len(), 7);
    assert!(matches!(
        position_sets(&positions, 5),
        Err(LogLinError::Validation(_))
    ));
    assert!(position_sets(&positions, 0).is_err());
}

#[test]
fn test_position_set_table_marginalizes() {
    let df = load_counts_table("tests/data/counts_pos.tsv", '\t').unwrap();

    let table = position_set_table(&df, &[1]).unwrap();
    assert_eq!(table.height(), 8);
    let names: Vec<String> = table.get_column_names().iter().map(|n| n.to_string()).collect();
    assert_eq!(names, vec!["mut", "base", "count"]);

    let muts = table.column("mut").unwrap().str().unwrap().clone();
    let bases = table.column("base").unwrap().str().unwrap().clone();
    let counts = table.column("count").unwrap().i64().unwrap().clone();
    let mut total = 0;
    for row in 0..table.height() {
        let count = counts.get(row).unwrap();
        total += count;
        if muts.get(row) == Some("M") && bases.get(row) == Some("G") {
            assert_eq!(count, 280);
        }
    }
    assert_eq!(total, 1620);

    let table = position_set_table(&df, &[0, 2]).unwrap();
    assert_eq!(table.height(), 32);
    assert!(table.column("base1").is_ok());
    assert!(table.column("base2").is_ok());

    assert!(position_set_table(&df, &[]).is_err());
    assert!(position_set_table(&df, &[7]).is_err());
}

#[test]
fn test_create_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a").join("b").join("out.json");
    create_parent_dirs(&path).unwrap();
    assert!(dir.path().join("a").join("b").is_dir());
    create_parent_dirs("out.json").unwrap();
}
