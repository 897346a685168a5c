//! Run command implementation: index, extract and normalize.

use crate::cli::{ExtractArgs, RunArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;

use super::execute_extract;
use super::normalize::write_tables;

/// Execute the run command.
pub async fn execute_run(args: RunArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let report = execute_extract(ExtractArgs::from(&args), config, formatter).await?;
    write_tables(&report.results, config, args.out.as_deref(), formatter)
}
