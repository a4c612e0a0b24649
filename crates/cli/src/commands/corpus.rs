//! `docbot corpus`: Load the corpus and print statistics.

use std::path::PathBuf;

use docbot_retrieval::CorpusStore;

use super::{CommandResult, load_config};

pub async fn run(path_override: Option<PathBuf>) -> CommandResult {
    let config = load_config()?;
    let path = path_override.unwrap_or_else(|| config.corpus.path.clone());

    let store = CorpusStore::load(&path, config.embedding.dimensions)?;
    let total_chars: usize = store.entries().iter().map(|e| e.text().chars().count()).sum();
    let longest = store
        .entries()
        .iter()
        .map(|e| e.text().chars().count())
        .max()
        .unwrap_or(0);

    println!("Corpus:      {}", path.display());
    println!("Entries:     {}", store.len());
    println!("Skipped:     {} (no embedding)", store.skipped());
    println!("Dimensions:  {}", store.dimensions());
    println!("Characters:  {total_chars}");
    println!("Longest:     {longest} chars");
    if longest >= config.retrieval.context_budget {
        println!(
            "Warning:     some passages can never fit the context budget ({})",
            config.retrieval.context_budget
        );
    }

    Ok(())
}
