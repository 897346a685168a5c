//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::input::{load_documents, read_fields};
use crate::output::Formatter;
use estima_domain::{ChatProvider, Document, EmbeddingProvider, Field};
use estima_extractor::{Checkpoint, ExtractionReport, Extractor};
use estima_store::VectorIndex;
use std::fmt::Display;
use std::fs;
use std::sync::Arc;
use tracing::info;

use super::index::build_index;
use super::resolve_provider;

/// Execute the extract command.
pub async fn execute_extract(
    args: ExtractArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<ExtractionReport> {
    let docs_dir = args.docs.clone().unwrap_or_else(|| config.paths.documents.clone());
    let documents = load_documents(&docs_dir)?;
    let fields = match &args.fields {
        Some(path) => read_fields(path)?,
        None => config.extraction.field_list().map_err(CliError::Config)?,
    };
    if documents.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "No .txt documents in {}",
            docs_dir.display()
        )));
    }

    let checkpoint = Checkpoint::new(config.paths.checkpoint_path(args.out.as_deref()));
    if args.fresh && checkpoint.path().exists() {
        info!(path = %checkpoint.path().display(), "Discarding previous results");
        fs::remove_file(checkpoint.path())?;
    }

    let provider = resolve_provider(&config.provider).await?;
    let index = build_index(&config.index, Arc::clone(&provider), documents.clone(), formatter).await?;

    let report = extract_with(index, provider, config, &documents, &fields, &checkpoint).await?;

    println!("{}", formatter.extraction_summary(&report));
    println!("{}", formatter.failures(&report.failures));
    println!(
        "{}",
        formatter.success(&format!("Results saved to {}", checkpoint.path().display()))
    );
    Ok(report)
}

/// Run the extractor over a built index, resuming from `checkpoint`.
pub(crate) async fn extract_with<E, C>(
    index: Arc<VectorIndex<E>>,
    chat: Arc<C>,
    config: &Config,
    documents: &[Document],
    fields: &[Field],
    checkpoint: &Checkpoint,
) -> Result<ExtractionReport>
where
    E: EmbeddingProvider + Send + Sync + 'static,
    E::Error: Display,
    C: ChatProvider + Send + Sync + 'static,
    C::Error: Display,
{
    info!(
        documents = documents.len(),
        fields = fields.len(),
        checkpoint = %checkpoint.path().display(),
        "Extracting"
    );
    let extractor = Extractor::new(index, chat, config.extraction.clone())?;
    Ok(extractor
        .extract_resumable(documents, fields, checkpoint)
        .await?)
}
