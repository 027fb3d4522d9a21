//! Relative entropy statistics derived from Poisson deviance.

/// Default value substituted for zero counts and zero fitted values
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Converts a deviance into relative entropy, `deviance / (2 N)`.
///
/// `N` is the total observed count of the table the deviance came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevianceToRelativeEntropy {
    denom: f64,
}

impl DevianceToRelativeEntropy {
    /// Converter for a table whose counts sum to `total_count`.
    pub fn new(total_count: f64) -> Self {
        DevianceToRelativeEntropy {
            denom: 2.0 * total_count,
        }
    }

    /// Converter for the given observed counts.
    pub fn from_counts(counts: &[u64]) -> Self {
        Self::new(counts.iter().sum::<u64>() as f64)
    }

    /// Relative entropy of `deviance`.
    pub fn convert(&self, deviance: f64) -> f64 {
        deviance / self.denom
    }
}

/// Per-row residual relative entropy, `2 o ln(o / e) / (2 N)`.
///
/// Zero observed or expected counts are replaced with `epsilon` first, so every
/// row with finite inputs yields a finite value; NaN is passed through. Rows
/// observed above expectation are positive and rows below expectation
/// negative. Over a Poisson fit with an intercept the terms sum to the total
/// relative entropy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualRelativeEntropy {
    dev_to_re: DevianceToRelativeEntropy,
    epsilon: f64,
}

impl ResidualRelativeEntropy {
    /// Per-row calculator sharing the table's deviance scale.
    pub fn new(dev_to_re: DevianceToRelativeEntropy, epsilon: f64) -> Self {
        ResidualRelativeEntropy { dev_to_re, epsilon }
    }

    /// Residual relative entropy of one row. A NaN input is not replaced and yields NaN.
    pub fn term(&self, observed: f64, expected: f64) -> f64 {
        let e = if expected == 0.0 {
            self.epsilon
        } else {
            expected
        };
        let o = if observed == 0.0 {
            self.epsilon
        } else {
            observed
        };
        self.dev_to_re.convert(2.0 * o * (o / e).ln())
    }

    /// Computes the term for each (observed, expected) pair.
    pub fn terms<'a, O, E>(&self, observed: O, expected: E) -> Vec<f64>
    where
        O: IntoIterator<Item = &'a f64>,
        E: IntoIterator<Item = &'a f64>,
    {
        observed
            .into_iter()
            .zip(expected)
            .map(|(&o, &e)| self.term(o, e))
            .collect()
    }
}
