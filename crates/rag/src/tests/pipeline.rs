//! End-to-end pipeline tests: ingest → retrieve → answer → follow-ups.

use crate::ingest::IngestOptions;
use crate::service::CopilotService;
use crate::tests::support::StubGenerator;
use knowhow_core::AppConfig;
use std::sync::Arc;
use tempfile::TempDir;

fn service_with(dir: &TempDir, generator: Arc<StubGenerator>) -> CopilotService {
    let config = AppConfig {
        data_dir: dir.path().join("data"),
        ..AppConfig::default()
    };
    CopilotService::assemble(config, generator).unwrap()
}

fn write_corpus(dir: &TempDir, docs: &[(&str, &str)]) -> std::path::PathBuf {
    let corpus = dir.path().join("docs");
    std::fs::create_dir_all(&corpus).unwrap();
    for (name, content) in docs {
        std::fs::write(corpus.join(name), content).unwrap();
    }
    corpus
}

#[tokio::test]
async fn test_full_query_flow_with_follow_ups() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(StubGenerator::with_script(vec![
        "Autoscaling adds workers when the task queue backs up [scaling.md:0].".to_string(),
        "1. How fast does autoscaling react?\n2. Can I cap worker count?\n3. Does it scale down?"
            .to_string(),
    ]));
    let service = service_with(&dir, generator.clone());

    let corpus = write_corpus(
        &dir,
        &[
            (
                "scaling.md",
                "Cluster autoscaling adds workers when the task queue grows beyond a threshold.",
            ),
            (
                "billing.md",
                "Invoices are issued monthly and itemize compute and storage separately.",
            ),
        ],
    );

    let report = service
        .ingest(&IngestOptions {
            paths: vec![corpus],
            chunk_size: 800,
            chunk_overlap: 150,
        })
        .await
        .unwrap();
    assert_eq!(report.documents_indexed, 2);

    let response = service
        .query("when does cluster autoscaling add workers", 2, true)
        .await
        .unwrap();

    // The relevant document ranks first and the evidence rides along
    assert_eq!(response.answer.sources[0].source, "scaling.md");
    assert!(response.answer.answer.contains("[scaling.md:0]"));

    let follow_ups = response.follow_ups.unwrap();
    assert_eq!(follow_ups.count(), 3);
    assert_eq!(follow_ups.questions()[1], "Can I cap worker count?");

    // One generate call for the answer, one for the follow-ups
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn test_retrieval_ordering_is_stable_across_reingest() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(StubGenerator::responding("ok"));
    let service = service_with(&dir, generator);

    let corpus = write_corpus(
        &dir,
        &[
            ("networking.md", "Private link endpoints route traffic inside the provider network."),
            ("storage.md", "Object storage offers eleven nines of durability for archives."),
        ],
    );

    let options = IngestOptions {
        paths: vec![corpus],
        chunk_size: 800,
        chunk_overlap: 150,
    };

    service.ingest(&options).await.unwrap();
    let first = service
        .query("how do private link endpoints route traffic", 2, false)
        .await
        .unwrap();

    // Re-ingesting identical content changes nothing
    let report = service.ingest(&options).await.unwrap();
    assert_eq!(report.documents_indexed, 0);
    assert_eq!(report.skipped, 2);

    let second = service
        .query("how do private link endpoints route traffic", 2, false)
        .await
        .unwrap();

    let order = |r: &crate::service::QueryResponse| {
        r.answer
            .sources
            .iter()
            .map(|s| (s.source.clone(), s.chunk_index))
            .collect::<Vec<_>>()
    };
    assert_eq!(order(&first), order(&second));
    assert_eq!(first.answer.sources[0].source, "networking.md");
}

#[tokio::test]
async fn test_follow_up_failure_never_fails_the_query() {
    let dir = TempDir::new().unwrap();

    // First call answers; the follow-up call yields no parsable questions
    let generator = Arc::new(StubGenerator::with_script(vec![
        "A grounded answer.".to_string(),
        "".to_string(),
    ]));
    let service = service_with(&dir, generator);

    let corpus = write_corpus(&dir, &[("a.md", "Some indexed support content.")]);
    service
        .ingest(&IngestOptions {
            paths: vec![corpus],
            chunk_size: 800,
            chunk_overlap: 150,
        })
        .await
        .unwrap();

    let response = service
        .query("some indexed support content", 1, true)
        .await
        .unwrap();

    // Degraded follow-up set, not an error
    assert_eq!(response.answer.answer, "A grounded answer.");
    assert_eq!(response.follow_ups.unwrap().count(), 0);
}

#[tokio::test]
async fn test_stats_reflect_corpus_size() {
    let dir = TempDir::new().unwrap();
    let generator = Arc::new(StubGenerator::responding("ok"));
    let service = service_with(&dir, generator);

    let long_doc = "support knowledge content ".repeat(60); // ~1560 chars
    let corpus = write_corpus(&dir, &[("long.md", long_doc.as_str()), ("short.md", "tiny")]);

    service
        .ingest(&IngestOptions {
            paths: vec![corpus],
            chunk_size: 800,
            chunk_overlap: 150,
        })
        .await
        .unwrap();

    let stats = service.stats().unwrap();
    assert_eq!(stats.documents, 2);
    // long.md spans three 800-char windows at 650-char steps; short.md is one
    assert_eq!(stats.chunks, 4);
}
