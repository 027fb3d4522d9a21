use mutation_loglin::config::FitConfig;
use mutation_loglin::counts::position_set_table;
use mutation_loglin::io::load_counts_table;
use mutation_loglin::loglin::position_effect;
use mutation_loglin::stats::{
    dump_loglin_stats, from_json_str, load_loglin_stats, to_json_string, PositionSetKey,
};
use mutation_loglin::types::StatsCollection;

fn fitted_collection() -> StatsCollection {
    let df = load_counts_table("tests/data/counts_pos.tsv", '\t').unwrap();
    let config = FitConfig::default();
    let mut data = StatsCollection::new();
    for positions in [vec![1], vec![0, 2]] {
        let table = position_set_table(&df, &positions).unwrap();
        let bundle = position_effect(&table, &config).unwrap();
        data.insert(PositionSetKey::Positions(positions), bundle);
    }
    let table = position_set_table(&df, &[0]).unwrap();
    let bundle = position_effect(&table, &config).unwrap();
    data.insert(PositionSetKey::Raw("summary".into()), bundle);
    data
}

#[test]
fn test_parse_position_set_key() {
    assert_eq!(PositionSetKey::parse("(1, 2)"), PositionSetKey::Positions(vec![1, 2]));
    assert_eq!(PositionSetKey::parse("(1,2)"), PositionSetKey::Positions(vec![1, 2]));
    assert_eq!(PositionSetKey::parse(" (0, 1, 2, 3) "), PositionSetKey::Positions(vec![0, 1, 2, 3]));
    assert_eq!(PositionSetKey::parse("(3,)"), PositionSetKey::Positions(vec![3]));

    // anything else is kept verbatim
    for raw in ["summary", "(3)", "()", "(a, b)", "(1, -2)", "1, 2", ""] {
        assert_eq!(PositionSetKey::parse(raw), PositionSetKey::Raw(raw.to_string()));
    }
}

#[test]
fn test_raw_key_rejects_tuple_notation() {
    // would come back as Positions after a write and read
    assert_eq!(PositionSetKey::raw("(1,)"), None);
    assert_eq!(PositionSetKey::raw("(0, 2)"), None);

    assert_eq!(
        PositionSetKey::raw("summary"),
        Some(PositionSetKey::Raw("summary".to_string()))
    );
    let key = PositionSetKey::raw("(3)").unwrap();
    assert_eq!(PositionSetKey::parse(&key.to_string()), key);
}

#[test]
fn test_position_set_key_display() {
    assert_eq!(PositionSetKey::Positions(vec![1, 2]).to_string(), "(1, 2)");
    assert_eq!(PositionSetKey::Positions(vec![3]).to_string(), "(3,)");
    assert_eq!(PositionSetKey::Raw("summary".into()).to_string(), "summary");

    for key in [
        PositionSetKey::Positions(vec![0]),
        PositionSetKey::Positions(vec![0, 1, 3]),
        PositionSetKey::Raw("summary".into()),
    ] {
        assert_eq!(key.to_string().parse::<PositionSetKey>().unwrap(), key);
    }
}

#[test]
fn test_dump_and_load_round_trip() {
    let data = fitted_collection();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loglin.json");

    dump_loglin_stats(&data, &path).unwrap();
    let loaded = load_loglin_stats(&path).unwrap();

    assert_eq!(loaded, data);
    let keys: Vec<&PositionSetKey> = loaded.keys().collect();
    assert!(keys.contains(&&PositionSetKey::Positions(vec![0, 2])));
    assert!(keys.contains(&&PositionSetKey::Positions(vec![1])));
    assert!(keys.contains(&&PositionSetKey::Raw("summary".into())));
}

#[test]
fn test_json_layout() {
    let data = fitted_collection();
    let json = to_json_string(&data).unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let bundle = &value["(0, 2)"];
    for field in ["total_re", "deviance", "df", "stats", "formula"] {
        assert!(bundle.get(field).is_some(), "missing {}", field);
    }
    assert_eq!(bundle["df"], 31);
    assert_eq!(bundle["formula"], "count ~ mut * base1 * base2 - mut:base1:base2");
    assert_eq!(bundle["stats"]["factors"][1], "base1");
    assert_eq!(bundle["stats"]["rows"].as_array().unwrap().len(), 32);
    assert!(value.get("(1,)").is_some());

    assert_eq!(from_json_str(&json).unwrap(), data);
}

#[test]
fn test_load_missing_file() {
    assert!(load_loglin_stats("tests/data/nonexistent.json").is_err());
}
