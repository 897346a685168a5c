//! Configuration management for the CLI.
//!
//! Settings come from a TOML file and are then overridden by the
//! environment variables of the deployment (`AI_PROVIDER`, `GEN_MODEL`, ...).

use crate::error::{CliError, Result};
use estima_extractor::ExtractorConfig;
use estima_llm::{ProviderConfig, ProviderKind};
use estima_store::IndexConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "estima.toml";

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Embedding and chat backend
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Vector index location and chunking
    #[serde(default)]
    pub index: IndexConfig,

    /// Extraction settings and field list
    #[serde(default)]
    pub extraction: ExtractorConfig,

    /// Input and output locations
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Input and output locations.
///
/// File names are resolved against `output_dir` unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Folder of *.txt documents
    pub documents: PathBuf,

    /// Where the checkpoint and tables are written
    pub output_dir: PathBuf,

    /// Extraction checkpoint file
    pub checkpoint: PathBuf,

    /// One row per document
    pub wide_csv: PathBuf,

    /// One row per (document, field)
    pub long_csv: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            documents: PathBuf::from("aws_raw"),
            output_dir: PathBuf::from("."),
            checkpoint: PathBuf::from("extracted_data.json"),
            wide_csv: PathBuf::from("extracted_data.csv"),
            long_csv: PathBuf::from("extracted_data_long.csv"),
        }
    }
}

impl PathsConfig {
    /// Checkpoint location, under `out` when given
    pub fn checkpoint_path(&self, out: Option<&Path>) -> PathBuf {
        self.resolve(out, &self.checkpoint)
    }

    /// Wide table location, under `out` when given
    pub fn wide_csv_path(&self, out: Option<&Path>) -> PathBuf {
        self.resolve(out, &self.wide_csv)
    }

    /// Long table location, under `out` when given
    pub fn long_csv_path(&self, out: Option<&Path>) -> PathBuf {
        self.resolve(out, &self.long_csv)
    }

    fn resolve(&self, out: Option<&Path>, file: &Path) -> PathBuf {
        out.unwrap_or(&self.output_dir).join(file)
    }
}

impl Config {
    /// Find the configuration file to use.
    ///
    /// An explicit path must exist. Otherwise `./estima.toml` is tried,
    /// then `estima/config.toml` in the user's config directory.
    pub fn locate(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(CliError::Config(format!(
                    "Config file '{}' does not exist",
                    path.display()
                )));
            }
            return Ok(Some(path.to_path_buf()));
        }

        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Ok(Some(local));
        }

        Ok(dirs::config_dir()
            .map(|dir| dir.join("estima").join("config.toml"))
            .filter(|path| path.exists()))
    }

    /// Load configuration, apply environment overrides and validate.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::locate(explicit)? {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Override settings from environment variables read through `lookup`.
    ///
    /// Blank values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = var("AI_PROVIDER") {
            self.provider.provider = ProviderKind::from_str(&value)?;
        }
        if let Some(value) = var("EMBEDDINGS_MODEL") {
            self.provider.embeddings_model = Some(value);
        }
        if let Some(value) = var("EMBEDDINGS_DIMENSION") {
            self.provider.embeddings_dimension = Some(parse_var("EMBEDDINGS_DIMENSION", &value)?);
        }
        if let Some(value) = var("GEN_MODEL") {
            self.provider.gen_model = Some(value);
        }
        if let Some(value) = var("TEMPERATURE") {
            self.provider.temperature = parse_var("TEMPERATURE", &value)?;
        }
        if let Some(value) = var("MAX_TOKENS") {
            self.provider.max_tokens = parse_var("MAX_TOKENS", &value)?;
        }
        if let Some(value) = var("OLLAMA_URL") {
            self.provider.ollama_url = value;
        }
        if let Some(value) = var("OPENAI_API_KEY") {
            self.provider.openai_api_key = Some(value);
        }
        if let Some(value) = var("OPENAI_BASE_URL") {
            self.provider.openai_base_url = value;
        }
        if let Some(value) = var("PERSIST_DIR") {
            self.index.persist_dir = PathBuf::from(value);
        }
        Ok(())
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.provider.validate()?;
        self.index.validate()?;
        self.extraction.validate().map_err(CliError::Config)?;
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| CliError::Config(format!("{} has invalid value '{}': {}", key, value, e)))
}
