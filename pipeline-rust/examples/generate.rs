use cheatsheet_client::{HttpBackend, HttpBackendOptions};
use cheatsheet_pipeline::{
    topics::POPULAR_SEARCHES, CheatSheetPipeline, Identity, InMemoryUserStore, Invocation,
    Liveness, NoopListener, ProgressUpdate,
};
use dotenvy::dotenv;
use std::{env, sync::Arc};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let topic = env::args()
        .nth(1)
        .unwrap_or_else(|| POPULAR_SEARCHES[1].to_string());
    let identity = Identity::new(
        env::var("CHEATSHEET_USER_EMAIL").unwrap_or_else(|_| "demo@example.com".to_string()),
    );

    let backend = Arc::new(HttpBackend::new(HttpBackendOptions::from_env())?);
    let store = Arc::new(InMemoryUserStore::new());
    let pipeline = CheatSheetPipeline::builder(backend, store).build();

    let listener = Arc::new(|update: &ProgressUpdate| {
        println!("[{:>3}%] {}", update.percent, update.message);
    });
    let outcome = pipeline
        .run(
            &identity,
            Invocation::Topic(topic.clone()),
            listener,
            &Liveness::new(),
        )
        .await?;

    if let Some(failure) = outcome.failure {
        println!("Generation failed: {}", failure.message());
    }
    println!("{}", outcome.artifact.html);
    println!("Related topics:");
    for related in &outcome.related_topics {
        println!("  {} {}", related.icon, related.title);
    }

    // second visit is served from the stored sheet
    let replay = pipeline
        .run(
            &identity,
            Invocation::replay(outcome.artifact.generated_at),
            Arc::new(NoopListener),
            &Liveness::new(),
        )
        .await?;
    println!(
        "Replayed {} ({:?}), saved as {}",
        replay.artifact.topic,
        replay.source,
        replay.artifact.download_file_name()
    );

    Ok(())
}
