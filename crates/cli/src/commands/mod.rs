//! Subcommand implementations. Each returns `Result<(), Box<dyn Error>>`.

pub mod chat;
pub mod config_cmd;
pub mod context;
pub mod corpus;
pub mod doctor;
pub mod serve;

use docbot_config::AppConfig;

type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

fn load_config() -> CommandResult<AppConfig> {
    AppConfig::load().map_err(|e| format!("Failed to load config: {e}").into())
}

/// Fail early, with setup instructions, when no key is configured.
fn require_api_key(config: &AppConfig) -> CommandResult {
    if config.has_api_key() {
        return Ok(());
    }

    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    DOCBOT_API_KEY=sk-...");
    eprintln!("    OPENAI_API_KEY=sk-...");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}
