use clap::Parser;
use mutation_loglin::config::FitConfig;
use mutation_loglin::counts::{position_columns, position_set_table, position_sets};
use mutation_loglin::error::LogLinError;
use mutation_loglin::io::{create_parent_dirs, load_counts_table};
use mutation_loglin::loglin::position_effect;
use mutation_loglin::stats::{dump_loglin_stats, PositionSetKey, StatsBundle};
use mutation_loglin::types::StatsCollection;
use rayon::prelude::*;

#[derive(thiserror::Error, Debug)]
pub enum NbrError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    LogLin(#[from] LogLinError),

    #[error("No pos columns in counts table")]
    MissingPositionColumns,
}

#[derive(Parser)]
#[command(
    name = "motif-nbr",
    about = "Fits log-linear models of neighbouring base effects on mutation counts",
    long_about = "Reads a counts table with a 'mut' direction column, one 'posN' column per \
                  flanking position and a 'count' column. For every combination of positions up \
                  to the requested order it fits a Poisson log-linear model excluding the full \
                  interaction term, and writes relative entropy statistics per position set to JSON.",
    version,
    after_help = "Example usage:\n    \
                  motif-nbr counts.tsv.gz results/loglin.json --max-order 2\n    \
                  motif-nbr counts.tsv loglin.json --max-order 4 --max-iter 50",
    color = clap::ColorChoice::Always
)]
#[derive(Debug)]
struct Args {
    /// Path to the tab-delimited counts table (plain or .gz)
    #[arg(value_name = "COUNTS_FILE")]
    counts_file: String,

    /// Path for the JSON statistics file
    /// Will create output directory if it doesn't exist
    #[arg(value_name = "OUTPUT_FILE")]
    output_file: String,

    /// Largest number of positions modelled jointly (1-4)
    #[arg(long, default_value_t = 2)]
    max_order: usize,

    /// Value substituted for zero counts in residual relative entropy
    #[arg(long, default_value_t = 1e-9)]
    epsilon: f64,

    /// Maximum number of IRLS iterations per model
    #[arg(long, default_value_t = 25)]
    max_iter: usize,

    /// Relative deviance change at which a fit has converged
    #[arg(long, default_value_t = 1e-8)]
    tolerance: f64,
}

impl Args {
    fn fit_config(&self) -> FitConfig {
        FitConfig {
            epsilon: self.epsilon,
            max_iter: self.max_iter,
            tolerance: self.tolerance,
            ..FitConfig::default()
        }
    }
}

fn fit_position_set(
    df: &mutation_loglin::types::PositionCountsTable,
    key: &PositionSetKey,
    config: &FitConfig,
) -> Result<StatsBundle, LogLinError> {
    let positions = match key {
        PositionSetKey::Positions(positions) => positions,
        PositionSetKey::Raw(raw) => {
            return Err(LogLinError::validation(format!("not a position set: {}", raw)))
        }
    };
    let table = position_set_table(df, positions)?;
    position_effect(&table, config)
}

fn main() -> Result<(), NbrError> {
    env_logger::init();
    let start_time = std::time::Instant::now();

    let args = Args::parse();
    let config = args.fit_config();
    config.validate()?;

    create_parent_dirs(&args.output_file)?;

    let df = load_counts_table(&args.counts_file, '\t')?;
    let positions = position_columns(&df);
    if positions.is_empty() {
        return Err(NbrError::MissingPositionColumns);
    }

    let sets = position_sets(&positions, args.max_order)?;
    log::info!("{} position sets to fit", sets.len());

    let fits: Vec<(PositionSetKey, Result<StatsBundle, LogLinError>)> = sets
        .into_par_iter()
        .map(|key| {
            let result = fit_position_set(&df, &key, &config);
            (key, result)
        })
        .collect();

    let mut results = StatsCollection::new();
    for (key, result) in fits {
        match result {
            Ok(bundle) => {
                log::info!(
                    "{}: RE = {:.6}, deviance = {:.4}, df = {}",
                    key,
                    bundle.total_re,
                    bundle.deviance,
                    bundle.df
                );
                results.insert(key, bundle);
            }
            Err(e) => log::warn!("skipping position set {}: {}", key, e),
        }
    }

    dump_loglin_stats(&results, &args.output_file)?;

    let elapsed = start_time.elapsed();
    log::info!(
        "Wrote {} position sets to {} in {:.4} minutes",
        results.len(),
        args.output_file,
        elapsed.as_secs_f64() / 60.0
    );

    Ok(())
}
