//! End-to-end tests for extraction and normalization

#[cfg(test)]
mod tests {
    use crate::normalize::{long_table, wide_table};
    use crate::{Checkpoint, Extractor, ExtractorConfig, ExtractorError};
    use estima_domain::{ChatMessage, ChatProvider, Document, Field};
    use estima_llm::{LlmError, MockEmbedder, MockProvider};
    use estima_store::{IndexConfig, VectorIndex};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn documents() -> Vec<Document> {
        vec![
            Document::new("doc1", "We randomized 248 patients to placebo or drug."),
            Document::new("doc2", "In total 248 adults were enrolled at two sites."),
        ]
    }

    fn fields(names: &[&str]) -> Vec<Field> {
        names.iter().map(|n| Field::new(*n).unwrap()).collect()
    }

    fn config(concurrency: usize) -> ExtractorConfig {
        ExtractorConfig {
            top_k: 1,
            concurrency,
            ..Default::default()
        }
    }

    fn index(documents: &[Document]) -> Arc<VectorIndex<MockEmbedder>> {
        let index =
            VectorIndex::in_memory(IndexConfig::default(), Arc::new(MockEmbedder::new(64))).unwrap();
        index.build(documents).unwrap();
        Arc::new(index)
    }

    fn stub_chat() -> MockProvider {
        let mut chat = MockProvider::default();
        chat.add_response("Extract A from", r#"{"sample_size": 248, "explain": "Methods"}"#);
        chat.add_response("Extract B from", "not json");
        chat
    }

    #[tokio::test]
    async fn test_end_to_end_tables() {
        let docs = documents();
        let extractor = Extractor::new(index(&docs), Arc::new(stub_chat()), config(1)).unwrap();

        let report = extractor.extract(&docs, &fields(&["A", "B"])).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.extracted, 4);

        let wide = wide_table(&report.results);
        assert_eq!(
            wide.columns().collect::<Vec<_>>(),
            vec!["filename", "A.sample_size", "B"]
        );
        assert_eq!(wide.row_cells(0), vec!["doc1", "248", "not json"]);
        assert_eq!(
            wide.to_csv_string().unwrap(),
            ",filename,A.sample_size,B\n0,doc1,248,not json\n1,doc2,248,not json\n"
        );

        let long = long_table(&report.results);
        assert_eq!(long.len(), 4);
        assert_eq!(
            long.columns().collect::<Vec<_>>(),
            vec!["filename", "field", "sample_size", "result_raw"]
        );
    }

    #[tokio::test]
    async fn test_records_keep_context_and_explain() {
        let docs = documents();
        let extractor = Extractor::new(index(&docs), Arc::new(stub_chat()), config(1)).unwrap();

        let report = extractor.extract(&docs, &fields(&["A"])).await.unwrap();
        let record = &report.results["doc2"][0];
        assert_eq!(record.context, "In total 248 adults were enrolled at two sites.");
        assert!(record.result.contains("\"explain\""));
    }

    #[tokio::test]
    async fn test_long_table_cardinality() {
        let docs: Vec<Document> = (0..3)
            .map(|i| Document::new(format!("doc{}", i), format!("Trial {} enrolled patients.", i)))
            .collect();
        let field_list = fields(&["A", "B", "C", "D"]);
        let chat = MockProvider::new(r#"{"n": 1}"#);
        let extractor = Extractor::new(index(&docs), Arc::new(chat.clone()), config(1)).unwrap();

        let report = extractor.extract(&docs, &field_list).await.unwrap();
        assert_eq!(report.record_count(), 12);
        assert_eq!(chat.call_count(), 12);
        assert_eq!(long_table(&report.results).len(), 12);
        assert_eq!(wide_table(&report.results).len(), 3);

        let doc_order: Vec<_> = report.results.keys().cloned().collect();
        assert_eq!(doc_order, vec!["doc0", "doc1", "doc2"]);
        let field_order: Vec<_> = report.results["doc1"].iter().map(|r| r.field.clone()).collect();
        assert_eq!(field_order, vec!["A", "B", "C", "D"]);
    }

    #[tokio::test]
    async fn test_sequential_prompts_follow_matrix_order() {
        let docs = documents();
        let chat = MockProvider::new("{}");
        let extractor = Extractor::new(index(&docs), Arc::new(chat.clone()), config(1)).unwrap();

        extractor.extract(&docs, &fields(&["A", "B"])).await.unwrap();

        let asked: Vec<String> = chat
            .prompts()
            .iter()
            .map(|p| p.lines().next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            asked,
            vec![
                "Extract A from the following text:",
                "Extract B from the following text:",
                "Extract A from the following text:",
                "Extract B from the following text:",
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_run_matches_sequential() {
        let docs: Vec<Document> = (0..4)
            .map(|i| Document::new(format!("doc{}", i), format!("Arm {} had {} patients.", i, i * 10)))
            .collect();
        let field_list = fields(&["A", "B", "C"]);

        let sequential = Extractor::new(index(&docs), Arc::new(stub_chat()), config(1))
            .unwrap()
            .extract(&docs, &field_list)
            .await
            .unwrap();
        let concurrent = Extractor::new(index(&docs), Arc::new(stub_chat()), config(4))
            .unwrap()
            .extract(&docs, &field_list)
            .await
            .unwrap();

        assert_eq!(sequential.results, concurrent.results);
        assert_eq!(
            wide_table(&sequential.results).to_csv_string().unwrap(),
            wide_table(&concurrent.results).to_csv_string().unwrap()
        );
    }

    #[tokio::test]
    async fn test_provider_failure_is_isolated() {
        let docs = documents();
        let mut chat = MockProvider::new(r#"{"n": 1}"#);
        chat.add_error("Extract B from");
        let extractor = Extractor::new(index(&docs), Arc::new(chat), config(1)).unwrap();

        let report = extractor.extract(&docs, &fields(&["A", "B"])).await.unwrap();

        assert_eq!(report.extracted, 2);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].document, "doc1");
        assert_eq!(report.failures[0].field, "B");
        assert_eq!(report.failures[0].error.pair(), Some(("doc1", "B")));
        assert!(matches!(report.failures[1].error, ExtractorError::Provider { .. }));

        assert_eq!(report.results["doc1"].len(), 1);
        assert_eq!(report.results["doc1"][0].field, "A");
    }

    #[tokio::test]
    async fn test_resume_skips_checkpointed_pairs() {
        let dir = TempDir::new().unwrap();
        let checkpoint = Checkpoint::new(dir.path().join("extracted_data.json"));
        let docs = documents();
        let field_list = fields(&["A", "B"]);

        let chat = stub_chat();
        let extractor = Extractor::new(index(&docs), Arc::new(chat.clone()), config(1)).unwrap();
        let first = extractor
            .extract_resumable(&docs, &field_list, &checkpoint)
            .await
            .unwrap();
        assert_eq!(chat.call_count(), 4);
        assert_eq!(checkpoint.load().unwrap(), first.results);

        let second = extractor
            .extract_resumable(&docs, &field_list, &checkpoint)
            .await
            .unwrap();
        assert_eq!(chat.call_count(), 4);
        assert_eq!(second.skipped, 4);
        assert_eq!(second.extracted, 0);
        assert_eq!(second.results, first.results);
    }

    #[tokio::test]
    async fn test_resume_retries_failed_pairs() {
        let dir = TempDir::new().unwrap();
        let checkpoint = Checkpoint::new(dir.path().join("extracted_data.json"));
        let docs = documents();
        let field_list = fields(&["A", "B"]);

        let mut flaky = MockProvider::new(r#"{"n": 1}"#);
        flaky.add_error("Extract B from");
        let first = Extractor::new(index(&docs), Arc::new(flaky), config(1))
            .unwrap()
            .extract_resumable(&docs, &field_list, &checkpoint)
            .await
            .unwrap();
        assert_eq!(first.failures.len(), 2);

        let healthy = MockProvider::new(r#"{"n": 2}"#);
        let second = Extractor::new(index(&docs), Arc::new(healthy.clone()), config(1))
            .unwrap()
            .extract_resumable(&docs, &field_list, &checkpoint)
            .await
            .unwrap();

        assert_eq!(healthy.call_count(), 2);
        assert_eq!(second.skipped, 2);
        assert!(second.is_complete());
        let doc1: Vec<_> = second.results["doc1"]
            .iter()
            .map(|r| (r.field.as_str(), r.result.as_str()))
            .collect();
        assert_eq!(doc1, vec![("A", r#"{"n": 1}"#), ("B", r#"{"n": 2}"#)]);
    }

    struct SlowProvider;

    impl ChatProvider for SlowProvider {
        type Error = LlmError;

        fn chat(&self, _messages: &[ChatMessage]) -> Result<String, Self::Error> {
            std::thread::sleep(Duration::from_millis(1500));
            Ok("{}".to_string())
        }
    }

    #[tokio::test]
    async fn test_timeout_fails_pair() {
        let docs = vec![Document::new("doc1", "Some text.")];
        let config = ExtractorConfig {
            extraction_timeout_secs: 1,
            ..config(1)
        };
        let extractor = Extractor::new(index(&docs), Arc::new(SlowProvider), config).unwrap();

        let report = extractor.extract(&docs, &fields(&["A"])).await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0].error,
            ExtractorError::Timeout { secs: 1, .. }
        ));
        assert!(report.results["doc1"].is_empty());
    }
}
