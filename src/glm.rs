//! Poisson log-linear model fitting by iteratively reweighted least squares.
//!
//! Each IRLS step linearizes the log link around the current means and solves
//! the weighted normal equations `X'WX b = X'Wz`, with working weights `w = mu`
//! and working response `z = eta + (y - mu) / mu`.
use crate::config::FitConfig;
use crate::error::{LogLinError, Result};
use crate::formula::ModelFormula;
use crate::table::EncodedTable;
use ndarray::{Array1, Array2, Axis};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Treatment-contrast design matrix for a formula over an encoded table.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    pub x: Array2<f64>,
    pub columns: Vec<String>,
}

/// Outcome of a converged Poisson fit.
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Residual deviance of the fitted model
    pub deviance: f64,
    /// Deviance of the intercept-only model
    pub null_deviance: f64,
    /// Degrees of freedom of the null model, rows - 1
    pub df_null: usize,
    /// Rows minus the number of estimated coefficients
    pub df_residual: usize,
    /// Number of non-aliased design columns
    pub rank: usize,
    pub iterations: usize,
    pub coefficient_names: Vec<String>,
    pub coefficients: Array1<f64>,
    /// Expected counts, aligned with the rows of `data`
    pub fitted: Array1<f64>,
    /// The table exactly as consumed by the fit
    pub data: EncodedTable,
}

impl FitResult {
    /// Upper-tail chi-squared probability of the residual deviance.
    ///
    /// Returns 1 when the model has no residual degrees of freedom.
    pub fn p_value(&self) -> f64 {
        if self.df_residual == 0 {
            return 1.0;
        }
        match ChiSquared::new(self.df_residual as f64) {
            Ok(dist) => dist.sf(self.deviance),
            Err(_) => f64::NAN,
        }
    }
}

/// Builds the treatment-contrast design matrix for `formula`.
///
/// The first column is the intercept. Each term contributes one column per
/// combination of non-baseline levels of its factors, with the first factor
/// varying fastest. Columns are named like `mutR:base1C`.
pub fn design_matrix(formula: &ModelFormula, data: &EncodedTable) -> DesignMatrix {
    let n = data.height();
    let mut columns = vec!["(Intercept)".to_string()];
    let mut values: Vec<Vec<f64>> = vec![vec![1.0; n]];

    for term in formula.terms() {
        let factors: Vec<_> = term.iter().map(|&i| &data.factors[i]).collect();
        let mut combos: Vec<Vec<usize>> = vec![vec![]];
        for factor in &factors {
            let mut next = Vec::new();
            for level in 1..factor.num_levels() {
                for combo in &combos {
                    let mut c = combo.clone();
                    c.push(level);
                    next.push(c);
                }
            }
            combos = next;
        }
        // first factor varies fastest
        combos.sort_by(|a, b| a.iter().rev().cmp(b.iter().rev()));

        for combo in combos {
            let name = factors
                .iter()
                .zip(&combo)
                .map(|(factor, &level)| format!("{}{}", factor.name, factor.levels[level]))
                .collect::<Vec<_>>()
                .join(":");
            let column = (0..n)
                .map(|row| {
                    let hit = factors
                        .iter()
                        .zip(&combo)
                        .all(|(factor, &level)| factor.codes[row] == level);
                    if hit {
                        1.0
                    } else {
                        0.0
                    }
                })
                .collect();
            columns.push(name);
            values.push(column);
        }
    }

    let p = columns.len();
    let mut x = Array2::<f64>::zeros((n, p));
    for (j, column) in values.into_iter().enumerate() {
        x.column_mut(j).assign(&Array1::from_vec(column));
    }
    DesignMatrix { x, columns }
}

/// Indices of the design columns that are linearly independent of the columns before them.
///
/// Uses modified Gram-Schmidt; a column is aliased when less than `tolerance`
/// of its norm survives projection onto the kept columns.
fn independent_columns(x: &Array2<f64>, tolerance: f64) -> Vec<usize> {
    let mut basis: Vec<Array1<f64>> = Vec::new();
    let mut kept = Vec::new();
    for (j, column) in x.axis_iter(Axis(1)).enumerate() {
        let norm = column.dot(&column).sqrt();
        if norm == 0.0 {
            continue;
        }
        let mut residual = column.to_owned();
        for q in &basis {
            let proj = q.dot(&residual);
            residual.scaled_add(-proj, q);
        }
        let residual_norm = residual.dot(&residual).sqrt();
        if residual_norm > tolerance * norm {
            basis.push(residual / residual_norm);
            kept.push(j);
        }
    }
    kept
}

/// Solves the symmetric positive-definite system `a x = b` by Cholesky factorization.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let p = b.len();
    let mut l = Array2::<f64>::zeros((p, p));
    for j in 0..p {
        let mut d = a[[j, j]];
        for k in 0..j {
            d -= l[[j, k]] * l[[j, k]];
        }
        if !(d.is_finite() && d > 0.0) {
            return None;
        }
        let ljj = d.sqrt();
        l[[j, j]] = ljj;
        for i in (j + 1)..p {
            let mut s = a[[i, j]];
            for k in 0..j {
                s -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = s / ljj;
        }
    }

    let mut y = Array1::<f64>::zeros(p);
    for i in 0..p {
        let mut s = b[i];
        for k in 0..i {
            s -= l[[i, k]] * y[k];
        }
        y[i] = s / l[[i, i]];
    }
    let mut x = Array1::<f64>::zeros(p);
    for i in (0..p).rev() {
        let mut s = y[i];
        for k in (i + 1)..p {
            s -= l[[k, i]] * x[k];
        }
        x[i] = s / l[[i, i]];
    }
    Some(x)
}

/// Poisson deviance `2 * sum(y ln(y / mu) - (y - mu))`, with `y ln(y / mu) = 0` when `y = 0`.
pub fn poisson_deviance(y: &Array1<f64>, mu: &Array1<f64>) -> f64 {
    y.iter()
        .zip(mu.iter())
        .map(|(&yi, &mi)| {
            let log_term = if yi > 0.0 { yi * (yi / mi).ln() } else { 0.0 };
            2.0 * (log_term - (yi - mi))
        })
        .sum()
}

/// Fits a Poisson GLM with log link for `formula` to `data`.
///
/// # Arguments
/// * `formula` - Model specification; its terms define the design matrix
/// * `data` - Encoded counts table, consumed in row order
/// * `config` - Iteration limit and tolerances
///
/// # Returns
/// * `Result<FitResult>` - Deviance, degrees of freedom and fitted values
///
/// # Errors
/// * Returns `LogLinError::Validation` if `config` is invalid or the table
///   does not match the formula
/// * Returns `LogLinError::FitConvergence` if the deviance does not settle within
///   `config.max_iter` iterations, becomes non-finite, or the weighted normal
///   equations are singular
pub fn fit_poisson(
    formula: &ModelFormula,
    data: &EncodedTable,
    config: &FitConfig,
) -> Result<FitResult> {
    config.validate()?;
    if data.factors.len() != formula.factors().len() {
        return Err(LogLinError::validation(format!(
            "table has {} factors but formula {} needs {}",
            data.factors.len(),
            formula,
            formula.factors().len()
        )));
    }

    let design = design_matrix(formula, data);
    let kept = independent_columns(&design.x, config.alias_tolerance);
    let x = design.x.select(Axis(1), &kept);
    let coefficient_names: Vec<String> = kept.iter().map(|&j| design.columns[j].clone()).collect();
    if kept.len() < design.columns.len() {
        log::debug!(
            "dropped {} aliased design columns for {}",
            design.columns.len() - kept.len(),
            formula
        );
    }

    let y: Array1<f64> = data.counts.iter().map(|&c| c as f64).collect();
    let n = y.len();

    let mut mu = y.mapv(|v| v + 0.1);
    let mut eta = mu.mapv(f64::ln);
    let mut dev_old = poisson_deviance(&y, &mu);
    let mut coefficients = Array1::<f64>::zeros(kept.len());
    let mut converged = false;
    let mut iterations = 0;

    for iter in 1..=config.max_iter {
        iterations = iter;
        let z = &eta + &((&y - &mu) / &mu);
        let xw = &x * &mu.view().insert_axis(Axis(1));
        let xtwx = xw.t().dot(&x);
        let xtwz = xw.t().dot(&z);

        coefficients = cholesky_solve(&xtwx, &xtwz).ok_or_else(|| {
            LogLinError::fit_convergence(iter, "weighted normal equations are not positive definite")
        })?;
        eta = x.dot(&coefficients);
        mu = eta.mapv(f64::exp);

        let dev = poisson_deviance(&y, &mu);
        if !dev.is_finite() {
            return Err(LogLinError::fit_convergence(iter, "deviance is not finite"));
        }
        log::debug!("IRLS iteration {}: deviance = {}", iter, dev);

        if (dev - dev_old).abs() / (dev.abs() + 0.1) < config.tolerance {
            converged = true;
            break;
        }
        dev_old = dev;
    }

    if !converged {
        return Err(LogLinError::fit_convergence(
            iterations,
            format!("deviance change still above tolerance {}", config.tolerance),
        ));
    }

    let deviance = poisson_deviance(&y, &mu).max(0.0);
    let null_mu = Array1::from_elem(n, y.mean().unwrap_or(0.0));
    let null_deviance = poisson_deviance(&y, &null_mu).max(0.0);

    Ok(FitResult {
        deviance,
        null_deviance,
        df_null: n.saturating_sub(1),
        df_residual: n.saturating_sub(kept.len()),
        rank: kept.len(),
        iterations,
        coefficient_names,
        coefficients,
        fitted: mu,
        data: data.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cholesky_solve() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![2.0, 1.0];
        let x = cholesky_solve(&a, &b).unwrap();
        assert!((x[0] - 0.5).abs() < 1e-12);
        assert!(x[1].abs() < 1e-12);

        // singular
        let a = array![[1.0, 1.0], [1.0, 1.0]];
        assert!(cholesky_solve(&a, &b).is_none());
    }

    #[test]
    fn test_independent_columns_drops_aliased() {
        let x = array![[1.0, 1.0, 0.0, 2.0], [1.0, 0.0, 0.0, 2.0], [1.0, 1.0, 0.0, 2.0]];
        assert_eq!(independent_columns(&x, 1e-7), vec![0, 1]);
    }

    #[test]
    fn test_poisson_deviance_zero_counts() {
        let y = array![0.0, 2.0];
        let mu = array![0.5, 2.0];
        assert!((poisson_deviance(&y, &mu) - 1.0).abs() < 1e-12);
    }
}
