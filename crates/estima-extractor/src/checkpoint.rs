//! Intermediate result file
//!
//! Extraction results are persisted as JSON after every completed document so
//! an interrupted run can resume without repeating finished pairs.

use crate::error::ExtractorError;
use crate::types::ExtractionResults;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// JSON file holding [`ExtractionResults`]
#[derive(Debug, Clone)]
pub struct Checkpoint {
    path: PathBuf,
}

impl Checkpoint {
    /// Checkpoint stored at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored results; a missing file yields no results
    pub fn load(&self) -> Result<ExtractionResults, ExtractorError> {
        if !self.path.exists() {
            return Ok(ExtractionResults::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let results: ExtractionResults =
            serde_json::from_str(&content).map_err(|e| ExtractorError::Checkpoint {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        debug!(
            path = %self.path.display(),
            documents = results.len(),
            "Loaded checkpoint"
        );
        Ok(results)
    }

    /// Replace the stored results (write to .tmp then rename)
    pub fn save(&self, results: &ExtractionResults) -> Result<(), ExtractorError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(results)?;
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;

        debug!(path = %self.path.display(), documents = results.len(), "Saved checkpoint");
        Ok(())
    }
}
