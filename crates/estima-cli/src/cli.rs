//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Estima - extract clinical-trial fields from study documents.
#[derive(Debug, Parser)]
#[command(name = "estima")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (defaults to ./estima.toml)
    #[arg(short, long, global = true, env = "ESTIMA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate configuration and show the resolved settings
    Check(CheckArgs),

    /// Chunk and embed the documents into the vector index
    Index(IndexArgs),

    /// Ask the model for every field of every document
    Extract(ExtractArgs),

    /// Turn the extraction checkpoint into wide and long CSV tables
    Normalize(NormalizeArgs),

    /// Index, extract and normalize in one go
    Run(RunArgs),
}

/// Arguments for the check command.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Also send one embedding and one chat request to the provider
    #[arg(long)]
    pub ping: bool,
}

/// Arguments for the index command.
#[derive(Debug, Args)]
pub struct IndexArgs {
    /// Folder of *.txt documents
    #[arg(short, long)]
    pub docs: Option<PathBuf>,
}

/// Arguments for the extract command.
#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Folder of *.txt documents
    #[arg(short, long)]
    pub docs: Option<PathBuf>,

    /// File listing the fields to extract, one per line
    #[arg(short, long)]
    pub fields: Option<PathBuf>,

    /// Output directory for the checkpoint
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Ignore any existing checkpoint and extract every pair again
    #[arg(long)]
    pub fresh: bool,
}

/// Arguments for the normalize command.
#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Extraction checkpoint to read (defaults to the configured one)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory for the CSV tables
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the run command.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Folder of *.txt documents
    #[arg(short, long)]
    pub docs: Option<PathBuf>,

    /// File listing the fields to extract, one per line
    #[arg(short, long)]
    pub fields: Option<PathBuf>,

    /// Output directory for the checkpoint and tables
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Ignore any existing checkpoint and extract every pair again
    #[arg(long)]
    pub fresh: bool,
}

impl From<&RunArgs> for ExtractArgs {
    fn from(args: &RunArgs) -> Self {
        ExtractArgs {
            docs: args.docs.clone(),
            fields: args.fields.clone(),
            out: args.out.clone(),
            fresh: args.fresh,
        }
    }
}
