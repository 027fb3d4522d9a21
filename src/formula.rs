use crate::error::{LogLinError, Result};
use crate::types::{COUNT_COLUMN, MAX_POSITIONS, MUT_COLUMN};
use std::fmt;

/// A Poisson log-linear model over a mutation direction factor and 1-4 base factors.
///
/// The model contains every main effect and every interaction among the factors
/// except the single highest-order interaction, i.e. `count ~ a * b * c - a:b:c`.
/// Terms are held as sorted lists of factor indices, ordered by interaction
/// order and then lexicographically, which is also the column order of the
/// design matrix built from the formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFormula {
    response: String,
    factors: Vec<String>,
}

/// Returns the factor column names for a table with `num_positions` base columns.
///
/// A single position is named `base`; several positions are `base1..basek`.
///
/// # Errors
/// * Returns `LogLinError::Validation` if `num_positions` is outside 1..=4
pub fn factor_names(num_positions: usize) -> Result<Vec<String>> {
    check_num_positions(num_positions)?;
    let mut names = vec![MUT_COLUMN.to_string()];
    if num_positions == 1 {
        names.push("base".to_string());
    } else {
        names.extend((1..=num_positions).map(|i| format!("base{}", i)));
    }
    Ok(names)
}

fn check_num_positions(num_positions: usize) -> Result<()> {
    if !(1..=MAX_POSITIONS).contains(&num_positions) {
        return Err(LogLinError::validation(format!(
            "can only model 1 to {} positions, got {}",
            MAX_POSITIONS, num_positions
        )));
    }
    Ok(())
}

impl ModelFormula {
    /// Builds the formula for an ordered factor list `[direction, base_1, ..., base_k]`.
    ///
    /// # Errors
    /// * Returns `LogLinError::Validation` if there are not 1-4 base factors,
    ///   or if a factor name is empty or repeated
    pub fn new(factors: Vec<String>) -> Result<Self> {
        check_num_positions(factors.len().saturating_sub(1))?;
        for (i, name) in factors.iter().enumerate() {
            if name.is_empty() {
                return Err(LogLinError::validation("factor names must not be empty"));
            }
            if factors[..i].contains(name) {
                return Err(LogLinError::validation(format!(
                    "factor {} appears more than once",
                    name
                )));
            }
        }
        Ok(ModelFormula {
            response: COUNT_COLUMN.to_string(),
            factors,
        })
    }

    /// Builds the formula using the standard column names for `num_positions` bases.
    pub fn for_positions(num_positions: usize) -> Result<Self> {
        Self::new(factor_names(num_positions)?)
    }

    /// Name of the count column being modelled.
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Factor names, mutation direction first.
    pub fn factors(&self) -> &[String] {
        &self.factors
    }

    /// Number of base factors, k.
    pub fn num_positions(&self) -> usize {
        self.factors.len() - 1
    }

    /// Returns the model terms as lists of factor indices.
    ///
    /// All non-empty subsets of the factors except the full set, so a formula
    /// over `n` factors has `2^n - 2` terms.
    pub fn terms(&self) -> Vec<Vec<usize>> {
        let n = self.factors.len();
        let mut terms = Vec::new();
        for order in 1..n {
            combinations(n, order, 0, &mut Vec::new(), &mut terms);
        }
        terms
    }

    /// The term this model leaves out: the interaction among all factors.
    pub fn excluded_term(&self) -> Vec<usize> {
        (0..self.factors.len()).collect()
    }

    /// Renders a term as `a:b:c`.
    pub fn term_label(&self, term: &[usize]) -> String {
        term.iter()
            .map(|&i| self.factors[i].as_str())
            .collect::<Vec<_>>()
            .join(":")
    }
}

fn combinations(
    n: usize,
    k: usize,
    start: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if current.len() == k {
        out.push(current.clone());
        return;
    }
    for i in start..n {
        current.push(i);
        combinations(n, k, i + 1, current, out);
        current.pop();
    }
}

impl fmt::Display for ModelFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ~ {} - {}",
            self.response,
            self.factors.join(" * "),
            self.term_label(&self.excluded_term())
        )
    }
}
