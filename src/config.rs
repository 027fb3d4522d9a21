use crate::entropy::DEFAULT_EPSILON;
use crate::error::{LogLinError, Result};
use serde::{Deserialize, Serialize};

/// Numeric settings for fitting a log-linear model and deriving relative entropy.
///
/// The defaults reproduce the usual `glm` control settings: at most 25 IRLS
/// iterations with a relative deviance tolerance of 1e-8.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Substituted for zero observed or fitted counts in residual relative entropy
    pub epsilon: f64,
    /// Maximum number of IRLS iterations
    pub max_iter: usize,
    /// Convergence threshold on the relative change in deviance
    pub tolerance: f64,
    /// Design columns whose residual norm falls below this fraction of their own norm are aliased
    pub alias_tolerance: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfig {
            epsilon: DEFAULT_EPSILON,
            max_iter: 25,
            tolerance: 1e-8,
            alias_tolerance: 1e-7,
        }
    }
}

impl FitConfig {
    /// Checks that every setting is usable.
    ///
    /// # Errors
    /// * Returns `LogLinError::Validation` naming the first offending field
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("epsilon", self.epsilon),
            ("tolerance", self.tolerance),
            ("alias_tolerance", self.alias_tolerance),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(LogLinError::validation(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if self.max_iter == 0 {
            return Err(LogLinError::validation("max_iter must be at least 1"));
        }
        Ok(())
    }
}
