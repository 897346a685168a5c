//! Normalize command implementation.

use crate::cli::NormalizeArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use estima_extractor::normalize::{long_table, wide_table};
use estima_extractor::{Checkpoint, ExtractionResults};
use std::path::Path;
use tracing::info;

/// Execute the normalize command.
pub async fn execute_normalize(
    args: NormalizeArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let input = args
        .input
        .unwrap_or_else(|| config.paths.checkpoint_path(args.out.as_deref()));
    if !input.exists() {
        return Err(CliError::InvalidInput(format!(
            "No extraction results at {}; run `estima extract` first",
            input.display()
        )));
    }

    let results = Checkpoint::new(input).load()?;
    write_tables(&results, config, args.out.as_deref(), formatter)
}

/// Write the wide and long tables for `results`.
pub(crate) fn write_tables(
    results: &ExtractionResults,
    config: &Config,
    out: Option<&Path>,
    formatter: &Formatter,
) -> Result<()> {
    info!(documents = results.len(), "Normalizing results");

    let wide = wide_table(results);
    let wide_path = config.paths.wide_csv_path(out);
    wide.save(&wide_path)?;
    println!("{}", formatter.table_written("wide", &wide_path, wide.len()));

    let long = long_table(results);
    let long_path = config.paths.long_csv_path(out);
    long.save(&long_path)?;
    println!("{}", formatter.table_written("long", &long_path, long.len()));

    Ok(())
}
