//! Extraction records and reports

use crate::error::ExtractorError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Raw outcome of extracting one field from one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Field description
    pub field: String,

    /// Model answer, verbatim
    pub result: String,

    /// Retrieved chunk texts the answer was based on, joined by a blank line
    pub context: String,
}

/// Records grouped by document id, in document order
///
/// Serializes as the intermediate result file: a JSON object mapping each
/// document id to its ordered list of records.
pub type ExtractionResults = IndexMap<String, Vec<ExtractionRecord>>;

/// A (document, field) pair that produced no record
#[derive(Debug)]
pub struct ExtractionFailure {
    /// Document id
    pub document: String,

    /// Field description
    pub field: String,

    /// Reason for failure
    pub error: ExtractorError,
}

/// Outcome of an extraction run
#[derive(Debug, Default)]
pub struct ExtractionReport {
    /// All records, including those carried over from a checkpoint
    pub results: ExtractionResults,

    /// Pairs that failed in this run
    pub failures: Vec<ExtractionFailure>,

    /// Pairs extracted in this run
    pub extracted: usize,

    /// Pairs skipped because a checkpoint already held them
    pub skipped: usize,

    /// Wall-clock time of the run in milliseconds
    pub processing_time_ms: u64,
}

impl ExtractionReport {
    /// Total number of records held
    pub fn record_count(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }

    /// Whether every pair produced a record
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_serialize_in_document_order() {
        let mut results = ExtractionResults::new();
        results.insert("zeta.txt".to_string(), Vec::new());
        results.insert(
            "alpha.txt".to_string(),
            vec![ExtractionRecord {
                field: "Age".to_string(),
                result: "{}".to_string(),
                context: "ctx".to_string(),
            }],
        );

        let json = serde_json::to_string(&results).unwrap();
        assert_eq!(
            json,
            r#"{"zeta.txt":[],"alpha.txt":[{"field":"Age","result":"{}","context":"ctx"}]}"#
        );

        let parsed: ExtractionResults = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["zeta.txt", "alpha.txt"]);
    }

    #[test]
    fn test_report_counts() {
        let mut report = ExtractionReport::default();
        assert!(report.is_complete());

        report.results.insert(
            "doc".to_string(),
            vec![
                ExtractionRecord {
                    field: "A".to_string(),
                    result: String::new(),
                    context: String::new(),
                };
                3
            ],
        );
        report.failures.push(ExtractionFailure {
            document: "doc".to_string(),
            field: "B".to_string(),
            error: ExtractorError::Join("cancelled".to_string()),
        });

        assert_eq!(report.record_count(), 3);
        assert!(!report.is_complete());
    }
}
