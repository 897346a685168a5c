//! Index command implementation.

use crate::cli::IndexArgs;
use crate::config::Config;
use crate::error::Result;
use crate::input::load_documents;
use crate::output::Formatter;
use estima_domain::{Document, EmbeddingProvider};
use estima_store::{IndexConfig, VectorIndex};
use std::fmt::Display;
use std::sync::Arc;
use tracing::info;

use super::resolve_provider;

/// Execute the index command.
pub async fn execute_index(args: IndexArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let docs_dir = args.docs.unwrap_or_else(|| config.paths.documents.clone());
    let documents = load_documents(&docs_dir)?;
    if documents.is_empty() {
        println!(
            "{}",
            formatter.warning(&format!("No .txt documents in {}", docs_dir.display()))
        );
        return Ok(());
    }

    let provider = resolve_provider(&config.provider).await?;
    build_index(&config.index, provider, documents, formatter).await?;
    Ok(())
}

/// Open the namespace and make sure it holds `documents`.
///
/// Embedding calls block on the network, so the build runs on the blocking
/// pool. The index is only returned once the build has committed.
pub(crate) async fn build_index<E>(
    config: &IndexConfig,
    embedder: Arc<E>,
    documents: Vec<Document>,
    formatter: &Formatter,
) -> Result<Arc<VectorIndex<E>>>
where
    E: EmbeddingProvider + Send + Sync + 'static,
    E::Error: Display,
{
    let config = config.clone();
    info!(persist_dir = %config.persist_dir.display(), documents = documents.len(), "Preparing index");

    let (index, outcome) = tokio::task::spawn_blocking(move || {
        let index = VectorIndex::open(config, embedder)?;
        let outcome = index.build(&documents)?;
        Ok::<_, estima_store::StoreError>((index, outcome))
    })
    .await??;

    println!("{}", formatter.build_outcome(&outcome, index.location()));
    Ok(Arc::new(index))
}
