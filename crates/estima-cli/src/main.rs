//! Estima CLI - extract clinical-trial fields from study documents.

use clap::Parser;
use estima_cli::commands;
use estima_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> estima_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load config file, environment overrides, validation
    let config = Config::load(cli.config.as_deref())?;

    let formatter = Formatter::new(!cli.no_color);

    match cli.command {
        Command::Check(args) => commands::execute_check(args, &config, &formatter).await?,
        Command::Index(args) => commands::execute_index(args, &config, &formatter).await?,
        Command::Extract(args) => {
            commands::execute_extract(args, &config, &formatter).await?;
        }
        Command::Normalize(args) => {
            commands::execute_normalize(args, &config, &formatter).await?
        }
        Command::Run(args) => commands::execute_run(args, &config, &formatter).await?,
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
