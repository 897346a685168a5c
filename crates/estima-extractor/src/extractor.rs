//! Core Extractor implementation

use crate::checkpoint::Checkpoint;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::prompt::PromptBuilder;
use crate::types::{ExtractionFailure, ExtractionRecord, ExtractionReport, ExtractionResults};
use estima_domain::{ChatMessage, ChatProvider, Document, EmbeddingProvider, Field};
use estima_store::VectorIndex;
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// The Extractor asks the chat model for every (document, field) pair,
/// grounding each question in chunks retrieved from that document only
pub struct Extractor<E, C> {
    index: Arc<VectorIndex<E>>,
    chat: Arc<C>,
    config: ExtractorConfig,
}

impl<E, C> Extractor<E, C>
where
    E: EmbeddingProvider + Send + Sync + 'static,
    E::Error: Display,
    C: ChatProvider + Send + Sync + 'static,
    C::Error: Display,
{
    /// Create a new Extractor over a built index
    ///
    /// # Errors
    /// `ExtractorError::Config` when `config` does not validate
    pub fn new(
        index: Arc<VectorIndex<E>>,
        chat: Arc<C>,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self {
            index,
            chat,
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract a single field from a single document
    pub async fn extract_field(
        &self,
        document_id: &str,
        field: &Field,
    ) -> Result<ExtractionRecord, ExtractorError> {
        run_pair(
            Arc::clone(&self.index),
            Arc::clone(&self.chat),
            document_id.to_string(),
            field.clone(),
            self.config.top_k,
            self.config.extraction_timeout(),
        )
        .await
    }

    /// Extract every field from every document
    pub async fn extract(
        &self,
        documents: &[Document],
        fields: &[Field],
    ) -> Result<ExtractionReport, ExtractorError> {
        self.run(documents, fields, None).await
    }

    /// Like [`Extractor::extract`], resuming from and updating `checkpoint`
    ///
    /// Pairs already recorded in the checkpoint are skipped. The file is
    /// rewritten each time a document's last pending pair finishes.
    pub async fn extract_resumable(
        &self,
        documents: &[Document],
        fields: &[Field],
        checkpoint: &Checkpoint,
    ) -> Result<ExtractionReport, ExtractorError> {
        self.run(documents, fields, Some(checkpoint)).await
    }

    async fn run(
        &self,
        documents: &[Document],
        fields: &[Field],
        checkpoint: Option<&Checkpoint>,
    ) -> Result<ExtractionReport, ExtractorError> {
        let start_time = Instant::now();
        let mut results = match checkpoint {
            Some(checkpoint) => checkpoint.load()?,
            None => ExtractionResults::new(),
        };

        // Work out which pairs still need a record
        let mut pending = Vec::new();
        let mut remaining = vec![0usize; documents.len()];
        let mut skipped = 0;
        for (d, document) in documents.iter().enumerate() {
            let done = results.get(document.id());
            for (f, field) in fields.iter().enumerate() {
                let recorded = done
                    .is_some_and(|records| records.iter().any(|r| r.field == field.as_str()));
                if recorded {
                    skipped += 1;
                } else {
                    pending.push((d, f));
                    remaining[d] += 1;
                }
            }
        }

        info!(
            documents = documents.len(),
            fields = fields.len(),
            pending = pending.len(),
            skipped,
            concurrency = self.config.concurrency,
            "Starting extraction"
        );

        let mut collected: Vec<Vec<ExtractionRecord>> = vec![Vec::new(); documents.len()];
        let mut failures = Vec::new();
        let mut extracted = 0;

        let mut queue = pending.into_iter();
        let mut tasks = JoinSet::new();
        loop {
            // Keep up to `concurrency` pairs in flight, started in matrix order
            while tasks.len() < self.config.concurrency {
                let Some((d, f)) = queue.next() else { break };
                let index = Arc::clone(&self.index);
                let chat = Arc::clone(&self.chat);
                let document = documents[d].id().to_string();
                let field = fields[f].clone();
                let top_k = self.config.top_k;
                let limit = self.config.extraction_timeout();
                tasks.spawn(async move {
                    (d, f, run_pair(index, chat, document, field, top_k, limit).await)
                });
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };
            let (d, f, outcome) = joined.map_err(|e| ExtractorError::Join(e.to_string()))?;
            let document_id = documents[d].id();

            match outcome {
                Ok(record) => {
                    extracted += 1;
                    collected[d].push(record);
                }
                Err(error) => {
                    warn!(error = %error, "Extraction failed for pair");
                    failures.push(ExtractionFailure {
                        document: document_id.to_string(),
                        field: fields[f].to_string(),
                        error,
                    });
                }
            }

            remaining[d] -= 1;
            if remaining[d] == 0 {
                let records = results.entry(document_id.to_string()).or_default();
                records.append(&mut collected[d]);
                sort_by_field_order(records, fields);
                order_by_documents(&mut results, documents);

                info!(document = document_id, "Document complete");
                if let Some(checkpoint) = checkpoint {
                    checkpoint.save(&results)?;
                }
            }
        }

        order_by_documents(&mut results, documents);
        failures.sort_by_key(|failure| {
            (
                position(documents.iter().map(Document::id), &failure.document),
                position(fields.iter().map(Field::as_str), &failure.field),
            )
        });

        let processing_time_ms = start_time.elapsed().as_millis() as u64;
        info!(
            extracted,
            skipped,
            failed = failures.len(),
            processing_time_ms,
            "Extraction complete"
        );

        Ok(ExtractionReport {
            results,
            failures,
            extracted,
            skipped,
            processing_time_ms,
        })
    }
}

/// Retrieve, prompt and answer one pair under the extraction timeout
///
/// Index search and the chat call both block on the network, so the work
/// runs on the blocking pool.
async fn run_pair<E, C>(
    index: Arc<VectorIndex<E>>,
    chat: Arc<C>,
    document: String,
    field: Field,
    top_k: usize,
    limit: Duration,
) -> Result<ExtractionRecord, ExtractorError>
where
    E: EmbeddingProvider + Send + Sync + 'static,
    E::Error: Display,
    C: ChatProvider + Send + Sync + 'static,
    C::Error: Display,
{
    let (doc, fld) = (document.clone(), field.clone());
    let work = tokio::task::spawn_blocking(move || {
        extract_blocking(&index, chat.as_ref(), &doc, &fld, top_k)
    });

    match timeout(limit, work).await {
        Ok(joined) => joined.map_err(|e| ExtractorError::Join(e.to_string()))?,
        Err(_) => Err(ExtractorError::Timeout {
            document,
            field: field.to_string(),
            secs: limit.as_secs(),
        }),
    }
}

fn extract_blocking<E, C>(
    index: &VectorIndex<E>,
    chat: &C,
    document: &str,
    field: &Field,
    top_k: usize,
) -> Result<ExtractionRecord, ExtractorError>
where
    E: EmbeddingProvider,
    E::Error: Display,
    C: ChatProvider,
    C::Error: Display,
{
    let chunks = index
        .search(field.as_str(), document, top_k)
        .map_err(|e| ExtractorError::Retrieval {
            document: document.to_string(),
            field: field.to_string(),
            message: e.to_string(),
        })?;

    if chunks.is_empty() {
        warn!(document, field = %field, "No context retrieved");
    }

    let context = chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let prompt = PromptBuilder::new(field.as_str(), &context).build();
    debug!(document, field = %field, chunks = chunks.len(), prompt_chars = prompt.len(), "Prompting model");

    let answer = chat
        .chat(&[ChatMessage::user(prompt)])
        .map_err(|e| ExtractorError::Provider {
            document: document.to_string(),
            field: field.to_string(),
            message: e.to_string(),
        })?;

    debug!(document, field = %field, answer_chars = answer.len(), "Model answered");
    let trimmed = answer.trim();
    if trimmed.is_empty() || trimmed == "{}" {
        debug!(document, field = %field, "Model found nothing relevant");
    }

    Ok(ExtractionRecord {
        field: field.to_string(),
        result: answer,
        context,
    })
}

fn position<'a>(mut items: impl Iterator<Item = &'a str>, needle: &str) -> usize {
    items.position(|item| item == needle).unwrap_or(usize::MAX)
}

/// Records follow the configured field order; unknown fields keep their
/// relative order at the end
fn sort_by_field_order(records: &mut [ExtractionRecord], fields: &[Field]) {
    records.sort_by_key(|record| position(fields.iter().map(Field::as_str), &record.field));
}

/// Documents follow input order; ids only known from a checkpoint go last
fn order_by_documents(results: &mut ExtractionResults, documents: &[Document]) {
    results.sort_by(|a, _, b, _| {
        position(documents.iter().map(Document::id), a)
            .cmp(&position(documents.iter().map(Document::id), b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use estima_llm::{MockEmbedder, MockProvider};
    use estima_store::IndexConfig;

    fn extractor(chat: MockProvider) -> Extractor<MockEmbedder, MockProvider> {
        let index = VectorIndex::in_memory(IndexConfig::default(), Arc::new(MockEmbedder::new(64)))
            .unwrap();
        index
            .build(&[Document::new("doc1", "We enrolled 248 patients.")])
            .unwrap();
        Extractor::new(Arc::new(index), Arc::new(chat), ExtractorConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_extract_field_records_context() {
        let extractor = extractor(MockProvider::new(r#"{"sample_size": 248}"#));
        let field = Field::new("sample size").unwrap();

        let record = extractor.extract_field("doc1", &field).await.unwrap();
        assert_eq!(record.field, "sample size");
        assert_eq!(record.result, r#"{"sample_size": 248}"#);
        assert_eq!(record.context, "We enrolled 248 patients.");
    }

    #[tokio::test]
    async fn test_unknown_document_still_prompts() {
        let chat = MockProvider::new("{}");
        let extractor = extractor(chat.clone());
        let field = Field::new("sample size").unwrap();

        let record = extractor.extract_field("missing", &field).await.unwrap();
        assert_eq!(record.context, "");
        assert_eq!(record.result, "{}");
        assert_eq!(chat.call_count(), 1);
    }

    #[tokio::test]
    async fn test_provider_error_identifies_pair() {
        let mut chat = MockProvider::default();
        chat.add_error("sample size");
        let extractor = extractor(chat);
        let field = Field::new("sample size").unwrap();

        let err = extractor.extract_field("doc1", &field).await.unwrap_err();
        assert_eq!(err.pair(), Some(("doc1", "sample size")));
        assert!(matches!(err, ExtractorError::Provider { .. }));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let index = VectorIndex::in_memory(IndexConfig::default(), Arc::new(MockEmbedder::new(64)))
            .unwrap();
        let config = ExtractorConfig {
            concurrency: 0,
            ..Default::default()
        };

        let result = Extractor::new(Arc::new(index), Arc::new(MockProvider::new("{}")), config);
        assert!(matches!(result, Err(ExtractorError::Config(ref msg)) if msg.contains("concurrency")));
    }

    #[test]
    fn test_sort_by_field_order() {
        let fields = vec![Field::new("A").unwrap(), Field::new("B").unwrap()];
        let mut records: Vec<ExtractionRecord> = ["old", "B", "A"]
            .iter()
            .map(|f| ExtractionRecord {
                field: f.to_string(),
                result: String::new(),
                context: String::new(),
            })
            .collect();

        sort_by_field_order(&mut records, &fields);
        let order: Vec<_> = records.iter().map(|r| r.field.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "old"]);
    }
}
