//! `docbot serve`: Start the HTTP API server.

use super::{CommandResult, load_config, require_api_key};

pub async fn run(port_override: Option<u16>) -> CommandResult {
    let mut config = load_config()?;
    require_api_key(&config)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Docbot Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Corpus:    {}", config.corpus.path.display());
    println!("   Model:     {}", config.default_model);

    docbot_gateway::start(config).await?;

    Ok(())
}
