//! `docbot context`: Show the context a message would retrieve.

use std::sync::Arc;

use docbot_retrieval::{CorpusStore, FusionQuery};

use super::{CommandResult, load_config};

pub async fn run(message: String, transcript: Option<String>) -> CommandResult {
    let config = load_config()?;

    let corpus = Arc::new(CorpusStore::load(
        &config.corpus.path,
        config.embedding.dimensions,
    )?);
    let router = docbot_providers::build_from_config(&config);
    let embedder = router
        .embedder()
        .ok_or_else(|| format!("Embedding provider '{}' not configured", config.embedding.provider))?;
    let fusion = docbot_agent::fusion_from_config(&config, embedder, corpus)?;

    let transcript = transcript.as_deref().unwrap_or(&message);
    let packed = fusion
        .build(FusionQuery {
            latest: &message,
            transcript,
        })
        .await?;

    eprintln!(
        "{} passages, {} / {} chars",
        packed.passages.len(),
        packed.chars(),
        fusion.budget().max_chars()
    );
    for passage in &packed.passages {
        eprintln!("  {:.4}  {}  ({})", passage.similarity, passage.title, passage.url);
    }
    eprintln!();
    println!("{}", packed.text);

    Ok(())
}
