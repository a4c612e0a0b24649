//! `docbot doctor`: Diagnose system health.

use docbot_agent::PromptTemplate;
use docbot_config::AppConfig;
use docbot_retrieval::CorpusStore;

use super::CommandResult;

pub async fn run() -> CommandResult {
    println!("Docbot Doctor");
    println!("=============\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ok    Config file at {}", config_path.display());
    } else {
        println!("  info  No config file, using defaults (run `docbot config init`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ok    Config valid");
            config
        }
        Err(e) => {
            println!("  FAIL  Config invalid: {e}");
            println!("\n  1 issue found. Fix the config before continuing.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ok    API key configured");
    } else {
        println!("  FAIL  No API key (set DOCBOT_API_KEY or OPENAI_API_KEY)");
        issues += 1;
    }

    match PromptTemplate::from_config(&config.bot) {
        Ok(_) => println!("  ok    Prompt template valid"),
        Err(e) => {
            println!("  FAIL  {e}");
            issues += 1;
        }
    }

    match CorpusStore::load(&config.corpus.path, config.embedding.dimensions) {
        Ok(store) if store.is_empty() => {
            println!("  WARN  Corpus loaded but has no embedded passages");
            issues += 1;
        }
        Ok(store) => println!(
            "  ok    Corpus: {} passages ({} skipped)",
            store.len(),
            store.skipped()
        ),
        Err(e) => {
            println!("  FAIL  {e}");
            issues += 1;
        }
    }

    if config.has_api_key() {
        let router = docbot_providers::build_from_config(&config);
        match router.completion() {
            Some(provider) => match provider.health_check().await {
                Ok(true) => println!("  ok    Provider '{}' reachable", provider.name()),
                Ok(false) => {
                    println!("  WARN  Provider '{}' answered but is not ready", provider.name());
                    issues += 1;
                }
                Err(e) => {
                    println!("  FAIL  Provider '{}': {e}", provider.name());
                    issues += 1;
                }
            },
            None => {
                println!("  FAIL  Provider '{}' not configured", config.default_provider);
                issues += 1;
            }
        }
        if router.embedder().is_none() {
            println!("  FAIL  Embedding provider '{}' not configured", config.embedding.provider);
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
