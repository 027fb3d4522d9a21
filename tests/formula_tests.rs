use mutation_loglin::error::LogLinError;
use mutation_loglin::formula::{factor_names, ModelFormula};
use rstest::rstest;

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(4)]
fn test_terms_exclude_only_full_interaction(#[case] num_positions: usize) {
    let formula = ModelFormula::for_positions(num_positions).unwrap();
    let num_factors = num_positions + 1;
    let terms = formula.terms();

    // every non-empty subset except the full set
    assert_eq!(terms.len(), (1 << num_factors) - 2);
    assert!(!terms.contains(&formula.excluded_term()));
    assert_eq!(formula.excluded_term().len(), num_factors);

    // main effects first, no duplicates
    for i in 0..num_factors {
        assert_eq!(terms[i], vec![i]);
    }
    let mut unique = terms.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), terms.len());
    assert!(terms.windows(2).all(|w| w[0].len() <= w[1].len()));
}

#[test]
fn test_formula_text() {
    let formula = ModelFormula::for_positions(1).unwrap();
    assert_eq!(formula.to_string(), "count ~ mut * base - mut:base");

    assert_eq!(formula.response(), "count");
    assert_eq!(formula.factors(), ["mut", "base"]);
    assert_eq!(formula.num_positions(), 1);

    let formula = ModelFormula::for_positions(3).unwrap();
    assert_eq!(formula.num_positions(), 3);
    assert_eq!(
        formula.to_string(),
        "count ~ mut * base1 * base2 * base3 - mut:base1:base2:base3"
    );

    // reproducible for the same factors
    assert_eq!(
        ModelFormula::for_positions(2).unwrap().to_string(),
        ModelFormula::for_positions(2).unwrap().to_string()
    );
}

#[test]
fn test_factor_names() {
    assert_eq!(factor_names(1).unwrap(), vec!["mut", "base"]);
    assert_eq!(factor_names(2).unwrap(), vec!["mut", "base1", "base2"]);
    assert_eq!(factor_names(4).unwrap().len(), 5);
}

#[test]
fn test_invalid_number_of_positions() {
    for k in [0, 5, 6] {
        let result = ModelFormula::for_positions(k);
        assert!(matches!(result, Err(LogLinError::Validation(_))));
    }

    let too_many: Vec<String> = ["mut", "b1", "b2", "b3", "b4", "b5"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert!(matches!(
        ModelFormula::new(too_many),
        Err(LogLinError::Validation(_))
    ));
    assert!(ModelFormula::new(vec!["mut".to_string()]).is_err());
}

#[test]
fn test_repeated_factor_rejected() {
    let result = ModelFormula::new(vec!["mut".to_string(), "base".to_string(), "base".to_string()]);
    assert!(matches!(result, Err(LogLinError::Validation(_))));
}
