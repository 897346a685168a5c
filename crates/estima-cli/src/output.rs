//! Output formatting for the CLI.

use crate::config::Config;
use colored::*;
use estima_extractor::{ExtractionFailure, ExtractionReport};
use estima_store::{BuildOutcome, Manifest};
use std::path::Path;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Longest error message shown in the failures table.
const MAX_ERROR_WIDTH: usize = 80;

/// Output formatter.
pub struct Formatter {
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(color_enabled: bool) -> Self {
        Self { color_enabled }
    }

    /// Summarize the resolved configuration.
    pub fn config_summary(&self, config: &Config) -> String {
        let mut lines = vec![self.colorize("Provider", "cyan"), config.provider.to_string()];

        lines.push(String::new());
        lines.push(self.colorize("Index", "cyan"));
        lines.push(format!(
            "Persist dir:       {}",
            config.index.persist_dir.display()
        ));
        lines.push(format!(
            "Chunking:          {} chars, {} overlap",
            config.index.chunk_size, config.index.chunk_overlap
        ));
        lines.push(format!(
            "On stale:          {}",
            format!("{:?}", config.index.on_stale).to_lowercase()
        ));

        lines.push(String::new());
        lines.push(self.colorize("Extraction", "cyan"));
        lines.push(format!("Top k:             {}", config.extraction.top_k));
        lines.push(format!("Concurrency:       {}", config.extraction.concurrency));
        lines.push(format!(
            "Timeout:           {}s",
            config.extraction.extraction_timeout_secs
        ));
        lines.push(format!("Fields:            {}", config.extraction.fields.len()));
        lines.push(format!(
            "Documents:         {}",
            config.paths.documents.display()
        ));

        lines.join("\n")
    }

    /// Describe the result of an index build.
    pub fn build_outcome(&self, outcome: &BuildOutcome, location: &Path) -> String {
        match outcome {
            BuildOutcome::Built { documents, chunks } => self.success(&format!(
                "Indexed {} document(s) into {} chunk(s) at {}",
                documents,
                chunks,
                location.display()
            )),
            BuildOutcome::Reused { chunks, stale: false } => self.info(&format!(
                "Reusing existing index at {} ({} chunks)",
                location.display(),
                chunks
            )),
            BuildOutcome::Reused { chunks, stale: true } => self.warning(&format!(
                "Index at {} ({} chunks) was built from different documents or settings; \
                 set index.on_stale = \"rebuild\" to refresh it",
                location.display(),
                chunks
            )),
        }
    }

    /// Describe an existing namespace.
    pub fn manifest(&self, manifest: &Manifest, location: &Path) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Index", "Model", "Dimension", "Chunking", "Documents", "Chunks"]);
        builder.push_record([
            location.display().to_string(),
            manifest.embedding_model.clone(),
            manifest.dimension.to_string(),
            format!("{}/{}", manifest.chunk_size, manifest.chunk_overlap),
            manifest.document_count.to_string(),
            manifest.chunk_count.to_string(),
        ]);

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Counts for an extraction run.
    pub fn extraction_summary(&self, report: &ExtractionReport) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Documents", "Extracted", "Skipped", "Failed", "Time"]);
        builder.push_record([
            report.results.len().to_string(),
            report.extracted.to_string(),
            report.skipped.to_string(),
            report.failures.len().to_string(),
            format!("{:.1}s", report.processing_time_ms as f64 / 1000.0),
        ]);

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Table of the pairs that failed.
    pub fn failures(&self, failures: &[ExtractionFailure]) -> String {
        if failures.is_empty() {
            return self.success("All pairs extracted");
        }

        let mut builder = Builder::default();
        builder.push_record(["Document", "Field", "Error"]);
        for failure in failures {
            builder.push_record([
                failure.document.clone(),
                failure.field.clone(),
                truncate(&failure.error.to_string(), MAX_ERROR_WIDTH),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        format!(
            "{}\n{}",
            self.warning(&format!("{} pair(s) failed; rerun to retry them", failures.len())),
            table
        )
    }

    /// Report a written table.
    pub fn table_written(&self, kind: &str, path: &Path, rows: usize) -> String {
        self.success(&format!("Wrote {} table ({} rows) to {}", kind, rows, path.display()))
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use estima_extractor::ExtractorError;

    fn formatter() -> Formatter {
        Formatter::new(false)
    }

    #[test]
    fn test_colorize_disabled() {
        assert_eq!(formatter().success("test"), "✓ test");
        assert_eq!(formatter().error("bad"), "✗ bad");
    }

    #[test]
    fn test_config_summary() {
        let summary = formatter().config_summary(&Config::default());
        assert!(summary.contains("Provider:          ollama"));
        assert!(summary.contains("Chunking:          1000 chars, 200 overlap"));
        assert!(summary.contains("On stale:          warn"));
        assert!(summary.contains("Fields:            15"));
    }

    #[test]
    fn test_build_outcome_messages() {
        let location = Path::new("./chroma_db");
        let built = formatter().build_outcome(&BuildOutcome::Built { documents: 2, chunks: 7 }, location);
        assert_eq!(built, "✓ Indexed 2 document(s) into 7 chunk(s) at ./chroma_db");

        let stale = formatter().build_outcome(&BuildOutcome::Reused { chunks: 7, stale: true }, location);
        assert!(stale.starts_with("⚠"));
        assert!(stale.contains("on_stale"));
    }

    #[test]
    fn test_manifest_table() {
        let manifest = Manifest {
            fingerprint: "abc".to_string(),
            embedding_model: "mock-bag-of-words".to_string(),
            dimension: 64,
            chunk_size: 1000,
            chunk_overlap: 200,
            document_count: 2,
            chunk_count: 9,
            built_at: 0,
        };
        let output = formatter().manifest(&manifest, Path::new("./chroma_db/index.sqlite3"));
        assert!(output.contains("mock-bag-of-words"));
        assert!(output.contains("1000/200"));
    }

    #[test]
    fn test_extraction_summary_table() {
        let report = ExtractionReport {
            extracted: 4,
            skipped: 2,
            processing_time_ms: 1500,
            ..Default::default()
        };
        let output = formatter().extraction_summary(&report);
        assert!(output.contains("Extracted"));
        assert!(output.contains("1.5s"));
    }

    #[test]
    fn test_failures_table() {
        let failures = vec![ExtractionFailure {
            document: "doc1.txt".to_string(),
            field: "Sample size".to_string(),
            error: ExtractorError::Timeout {
                document: "doc1.txt".to_string(),
                field: "Sample size".to_string(),
                secs: 120,
            },
        }];
        let output = formatter().failures(&failures);
        assert!(output.contains("1 pair(s) failed"));
        assert!(output.contains("doc1.txt"));
        assert!(output.contains("Sample size"));

        assert_eq!(formatter().failures(&[]), "✓ All pairs extracted");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
