use crate::config::FitConfig;
use crate::entropy::{DevianceToRelativeEntropy, ResidualRelativeEntropy};
use crate::error::Result;
use crate::formula::ModelFormula;
use crate::glm::{fit_poisson, FitResult};
use crate::results::assemble;
use crate::stats::StatsBundle;
use crate::table::{encode_counts_table, num_base_columns};
use crate::types::CountsTable;

/// Fits the log-linear model excluding only the full interaction term and
/// summarises it as relative entropy.
///
/// The number of positions is the number of `base*` columns in `counts`.
///
/// # Arguments
/// * `counts` - DataFrame with columns mut, base (or base1..basek) and count
/// * `config` - Fit and epsilon settings
///
/// # Returns
/// * `Result<StatsBundle>` - Total relative entropy, deviance, null-model degrees
///   of freedom, the annotated table and the formula text
///
/// # Errors
/// * Returns `LogLinError::Validation` if there are not 1-4 base columns or columns are missing
/// * Returns `LogLinError::InvalidCount` for unusable counts
/// * Returns `LogLinError::FitConvergence` if the model cannot be fitted
///
/// # Example
/// ```ignore
/// use mutation_loglin::{config::FitConfig, loglin::position_effect};
///
/// let bundle = position_effect(&counts, &FitConfig::default()).unwrap();
/// println!("{}: RE = {}", bundle.formula, bundle.total_re);
/// ```
pub fn position_effect(counts: &CountsTable, config: &FitConfig) -> Result<StatsBundle> {
    let formula = ModelFormula::for_positions(num_base_columns(counts))?;
    log::debug!("fitting {}", formula);

    let data = encode_counts_table(counts, &formula)?;
    let fit = fit_poisson(&formula, &data, config)?;
    summarise_fit(&formula, &fit, config)
}

/// Converts a fit into relative entropy statistics and the sorted annotated table.
pub fn summarise_fit(
    formula: &ModelFormula,
    fit: &FitResult,
    config: &FitConfig,
) -> Result<StatsBundle> {
    let dev_to_re = DevianceToRelativeEntropy::from_counts(&fit.data.counts);
    let calc_ret = ResidualRelativeEntropy::new(dev_to_re, config.epsilon);

    let observed: Vec<f64> = fit.data.counts.iter().map(|&c| c as f64).collect();
    let ret = calc_ret.terms(&observed, fit.fitted.iter());
    let labels = (0..fit.data.height())
        .map(|row| fit.data.row_labels(row))
        .collect();
    let fitted: Vec<f64> = fit.fitted.to_vec();

    let stats = assemble(formula.factors().to_vec(), labels, &fit.data.counts, &fitted, &ret)?;

    Ok(StatsBundle {
        total_re: dev_to_re.convert(fit.deviance),
        deviance: fit.deviance,
        df: fit.df_null,
        stats,
        formula: formula.to_string(),
    })
}
