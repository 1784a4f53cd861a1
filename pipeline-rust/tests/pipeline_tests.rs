use cheatsheet_client::{
    cheatsheet_client_test::MockBackend, GenerateResponse, GenerationError, HttpBackend,
    HttpBackendOptions,
};
use cheatsheet_pipeline::{
    fallback_html, BoxedError, CheatSheetPipeline, FailureReason, Identity, InMemoryUserStore,
    Invocation, Liveness, NavigationParams, NoopListener, OutcomeSource, PipelineError,
    PipelineOutcome, Topic, UserRecord, UserStore, DEFAULT_DIFFICULTY,
};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

fn identity() -> Identity {
    Identity::new("ada@example.com")
}

async fn run(
    pipeline: &CheatSheetPipeline,
    invocation: Invocation,
) -> Result<PipelineOutcome, PipelineError> {
    pipeline
        .run(&identity(), invocation, Arc::new(NoopListener), &Liveness::new())
        .await
}

async fn stored(store: &InMemoryUserStore) -> UserRecord {
    store
        .get(identity().key())
        .await
        .unwrap()
        .expect("user record should exist")
}

#[tokio::test]
async fn generated_sheet_is_replayed_without_backend_call() {
    let backend = Arc::new(MockBackend::new());
    backend.enqueue(GenerateResponse::html("<h1>DP</h1>").with_related_topics(["Recursion"]));
    let store = Arc::new(InMemoryUserStore::new());
    let pipeline = CheatSheetPipeline::builder(backend.clone(), store.clone()).build();

    let generated = run(&pipeline, Invocation::Topic("Dynamic Programming".into()))
        .await
        .unwrap();
    assert_eq!(generated.source, OutcomeSource::Generated);
    assert_eq!(generated.artifact.topic, "Dynamic Programming");
    assert_eq!(generated.artifact.difficulty, DEFAULT_DIFFICULTY);
    assert_eq!(generated.artifact.related_topics, vec!["Recursion"]);

    let record = stored(&store).await;
    assert_eq!(record.generated_sheets, vec![generated.artifact.clone()]);
    assert_eq!(record.recent_searches.len(), 1);
    assert_eq!(record.recent_searches[0].title, "Dynamic Programming");
    assert_eq!(record.role, "Student");

    let replayed = run(
        &pipeline,
        Invocation::replay(generated.artifact.generated_at),
    )
    .await
    .unwrap();
    assert_eq!(replayed.source, OutcomeSource::CacheHit);
    assert_eq!(replayed.artifact.html, "<h1>DP</h1>");
    assert_eq!(replayed.artifact, generated.artifact);
    assert_eq!(backend.call_count(), 1);

    // replays do not count as searches
    assert_eq!(stored(&store).await.recent_searches.len(), 1);
}

#[tokio::test]
async fn replay_through_navigation_identifier() {
    let backend = Arc::new(MockBackend::new());
    backend.enqueue(GenerateResponse::html("<h1>BST</h1>"));
    let store = Arc::new(InMemoryUserStore::new());
    let pipeline = CheatSheetPipeline::builder(backend.clone(), store).build();

    let generated = run(&pipeline, Invocation::Topic("Binary Search Trees".into()))
        .await
        .unwrap();

    let params = NavigationParams {
        topic: None,
        generated_at: Some(generated.artifact.generated_at.to_rfc3339()),
    };
    let replayed = run(&pipeline, Invocation::try_from(params).unwrap())
        .await
        .unwrap();

    assert_eq!(replayed.source, OutcomeSource::CacheHit);
    assert_eq!(replayed.artifact.html, "<h1>BST</h1>");
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn unreachable_backend_returns_fallback_template() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = Arc::new(
        HttpBackend::new(HttpBackendOptions {
            base_url: Some(format!("http://{addr}")),
            timeout: Some(Duration::from_secs(5)),
        })
        .unwrap(),
    );
    let store = Arc::new(InMemoryUserStore::new());
    let pipeline = CheatSheetPipeline::builder(backend, store.clone()).build();

    let outcome = run(&pipeline, Invocation::Topic("Graph Algorithms".into()))
        .await
        .unwrap();

    assert_eq!(outcome.source, OutcomeSource::Fallback);
    assert_eq!(outcome.failure, Some(FailureReason::Network));
    assert_eq!(outcome.artifact.html, fallback_html("Graph Algorithms"));
    assert!(outcome.artifact.related_topics.is_empty());
    assert_eq!(
        outcome.retry_invocation(),
        Some(Invocation::Topic("Graph Algorithms".into()))
    );

    // failures are recorded like any other generation
    let record = stored(&store).await;
    assert_eq!(record.generated_sheets.len(), 1);
    assert_eq!(record.recent_searches.len(), 1);
}

#[tokio::test]
async fn failures_are_not_recorded_when_disabled() {
    let backend = Arc::new(MockBackend::new());
    backend.enqueue(GenerationError::Backend("no html".into()));
    let store = Arc::new(InMemoryUserStore::new());
    let pipeline = CheatSheetPipeline::builder(backend, store.clone())
        .record_failures(false)
        .build();

    let outcome = run(&pipeline, Invocation::Topic("Sorting".into()))
        .await
        .unwrap();

    assert_eq!(outcome.failure, Some(FailureReason::Generation));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn related_topics_merge_curated_and_suggested() {
    let backend = Arc::new(MockBackend::new());
    backend.enqueue(
        GenerateResponse::html("<h1>DP</h1>")
            .with_related_topics(["RECURSION", "Graph Algorithms"]),
    );
    let store = Arc::new(InMemoryUserStore::new());
    let pipeline = CheatSheetPipeline::builder(backend, store)
        .curated_topics(vec![
            Topic::new("Recursion", "🔄"),
            Topic::new("Memoization", "💾"),
        ])
        .build();

    let outcome = run(&pipeline, Invocation::Topic("Dynamic Programming".into()))
        .await
        .unwrap();

    let titles: Vec<_> = outcome
        .related_topics
        .iter()
        .map(|topic| topic.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Recursion", "Memoization", "Graph Algorithms"]);
    assert_eq!(outcome.related_topics[0].icon, "🔄");
    assert_eq!(
        outcome.related_topics[2].icon,
        cheatsheet_pipeline::topics::DEFAULT_ICON
    );
}

#[tokio::test]
async fn sequential_generations_are_appended_in_call_order() {
    let backend = Arc::new(MockBackend::new());
    backend
        .enqueue(GenerateResponse::html("<h1>Heaps</h1>"))
        .enqueue(GenerateResponse::html("<h1>Tries</h1>"));
    let store = Arc::new(InMemoryUserStore::new());
    let pipeline = CheatSheetPipeline::builder(backend, store.clone()).build();

    let first = run(&pipeline, Invocation::Topic("Heaps".into()))
        .await
        .unwrap();
    let second = run(&pipeline, Invocation::Topic("Tries".into()))
        .await
        .unwrap();

    let record = stored(&store).await;
    let topics: Vec<_> = record
        .generated_sheets
        .iter()
        .map(|sheet| sheet.topic.as_str())
        .collect();
    assert_eq!(topics, vec!["Heaps", "Tries"]);
    assert!(second.artifact.generated_at > first.artifact.generated_at);
    assert_eq!(record.stats().sheets_created, 2);
}

#[tokio::test(start_paused = true)]
async fn overlapping_generations_are_appended_in_call_order() {
    let backend = Arc::new(MockBackend::new().with_latency(Duration::from_secs(5)));
    backend
        .enqueue(GenerateResponse::html("<h1>Heaps</h1>"))
        .enqueue(GenerateResponse::html("<h1>Tries</h1>"));
    let store = Arc::new(InMemoryUserStore::new());
    let pipeline = CheatSheetPipeline::builder(backend.clone(), store.clone()).build();

    let (first, second) = tokio::join!(
        run(&pipeline, Invocation::Topic("Heaps".into())),
        async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            run(&pipeline, Invocation::Topic("Tries".into())).await
        }
    );
    let (first, second) = (first.unwrap(), second.unwrap());
    assert_eq!(backend.call_count(), 2);

    let record = stored(&store).await;
    assert_eq!(
        record.generated_sheets,
        vec![first.artifact.clone(), second.artifact.clone()]
    );
    assert!(second.artifact.generated_at > first.artifact.generated_at);
    let searches: Vec<_> = record
        .recent_searches
        .iter()
        .map(|entry| entry.title.as_str())
        .collect();
    assert_eq!(searches, vec!["Heaps", "Tries"]);

    for sheet in [&first.artifact, &second.artifact] {
        let replayed = run(
            &pipeline,
            Invocation::Replay {
                generated_at: Some(sheet.generated_at),
                topic: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(replayed.artifact.html, sheet.html);
    }
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn unknown_identifier_falls_back_without_backend_call() {
    let backend = Arc::new(MockBackend::new());
    let store = Arc::new(InMemoryUserStore::new());
    let pipeline = CheatSheetPipeline::builder(backend.clone(), store.clone()).build();
    pipeline.recorder().ensure_user(&identity()).await.unwrap();

    let outcome = run(
        &pipeline,
        Invocation::Replay {
            generated_at: None,
            topic: Some("Recursion".into()),
        },
    )
    .await
    .unwrap();

    assert_eq!(outcome.source, OutcomeSource::Fallback);
    assert_eq!(outcome.failure, Some(FailureReason::NotFound));
    assert_eq!(outcome.artifact.html, fallback_html("Recursion"));
    assert_eq!(outcome.retry_invocation(), None);
    assert_eq!(backend.call_count(), 0);

    let record = stored(&store).await;
    assert!(record.generated_sheets.is_empty());
    assert!(record.recent_searches.is_empty());
}

#[tokio::test]
async fn empty_topic_is_rejected_before_any_work() {
    let backend = Arc::new(MockBackend::new());
    let store = Arc::new(InMemoryUserStore::new());
    let pipeline = CheatSheetPipeline::builder(backend.clone(), store).build();

    let err = run(&pipeline, Invocation::Topic("   ".into()))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::InvalidInput(_)));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn ensure_user_creates_record_once() {
    let store = Arc::new(InMemoryUserStore::new());
    let pipeline = CheatSheetPipeline::builder(Arc::new(MockBackend::new()), store.clone()).build();

    let created = pipeline.recorder().ensure_user(&identity()).await.unwrap();
    assert_eq!(created.email, "ada@example.com");
    assert_eq!(created.role, "Student");
    assert!(created.generated_sheets.is_empty());

    let again = pipeline.recorder().ensure_user(&identity()).await.unwrap();
    assert_eq!(again, created);
    assert_eq!(store.len().await, 1);
}

/// Store whose writes always fail; reads can be switched off as well.
#[derive(Default)]
struct BrokenStore {
    fail_reads: AtomicBool,
}

#[async_trait::async_trait]
impl UserStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<UserRecord>, BoxedError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err("store offline".into());
        }
        Ok(None)
    }

    async fn put(&self, _key: &str, _record: UserRecord) -> Result<(), BoxedError> {
        Err("permission denied".into())
    }
}

#[tokio::test]
async fn persistence_failures_do_not_fail_the_run() {
    let backend = Arc::new(MockBackend::new());
    backend
        .enqueue(GenerateResponse::html("<h1>Greedy</h1>"))
        .enqueue(GenerateResponse::html("<h1>Greedy again</h1>"));
    let store = Arc::new(BrokenStore::default());
    let pipeline = CheatSheetPipeline::builder(backend, store.clone()).build();

    let outcome = run(&pipeline, Invocation::Topic("Greedy".into()))
        .await
        .unwrap();
    assert_eq!(outcome.source, OutcomeSource::Generated);
    assert_eq!(outcome.artifact.html, "<h1>Greedy</h1>");

    store.fail_reads.store(true, Ordering::SeqCst);
    let outcome = run(&pipeline, Invocation::Topic("Greedy".into()))
        .await
        .unwrap();
    assert_eq!(outcome.artifact.html, "<h1>Greedy again</h1>");

    let err = pipeline.recorder().ensure_user(&identity()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Store(_)));
}
