//! Configuration for the Extractor

use estima_domain::Field;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Baseline characteristics and clinical outcomes of a systematic literature
/// review of ulcerative colitis trials
pub const DEFAULT_FIELDS: &[&str] = &[
    "Number of patients recruited by trial per treatment arm",
    "Patient gender: Male (number, proportion), Female (number, proportion)",
    "Age (mean or median, measure of data spread e.g., standard deviation)",
    "Body mass index (mean or median, measure of data spread e.g., range)",
    "Patient race (number/proportion): White; Native American or Alaska Native; Asian; Black or African American; Native Hawaiian or Other Pacific Islander",
    "Disease duration (mean or median, measure of spread, units)",
    "Location and extent of disease (number/proportion):Left side; Extensive or pancolitis; Limited to rectum",
    "Number of acute UC episodes in the past year (mean or median, measure of spread)",
    "Adapted Mayo score (mean or median, measure of spread)",
    "Adapted Mayo score category (number, proportion): ≤ 7, > 7",
    "Previous medication use (number, proportion): Immunosuppressants; Aminosalicylates; Corticosteroids.",
    "Proportion of patients with a clinical response at all reported timepoints between 8 and 26 weeks",
    "Proportion of patients with a clinical and endoscopic response at all reported timepoints between 8 and 26 weeks",
    "Proportion of patients with any adverse event (AE)",
    "Proportion of patients with any treatment-emergent adverse event (TEAE).",
];

/// Configuration for the Extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Chunks retrieved per (document, field) pair
    pub top_k: usize,

    /// Maximum time for a single pair, retrieval and chat included (seconds)
    pub extraction_timeout_secs: u64,

    /// Pairs processed at once; 1 processes them strictly in order
    pub concurrency: usize,

    /// Field descriptions to extract, in output order
    pub fields: Vec<String>,
}

impl ExtractorConfig {
    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.top_k == 0 {
            return Err("top_k must be greater than 0".to_string());
        }
        if self.extraction_timeout_secs == 0 {
            return Err("extraction_timeout_secs must be greater than 0".to_string());
        }
        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".to_string());
        }
        if let Some(blank) = self.fields.iter().position(|f| f.trim().is_empty()) {
            return Err(format!("field {} is blank", blank + 1));
        }
        Ok(())
    }

    /// Configured fields as domain values
    pub fn field_list(&self) -> Result<Vec<Field>, String> {
        self.fields.iter().map(|f| Field::new(f.as_str())).collect()
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            top_k: estima_store::DEFAULT_TOP_K,
            extraction_timeout_secs: 120,
            concurrency: 1,
            fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}
