//! `docbot chat`: Interactive or single-message chat.

use std::io::Write;

use docbot_agent::DocBot;
use docbot_core::message::{ConversationId, Message};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{CommandResult, load_config, require_api_key};

pub async fn run(message: Option<String>, thread: Option<String>) -> CommandResult {
    let config = load_config()?;
    require_api_key(&config)?;

    let bot = docbot_gateway::build_bot(&config)?;
    let thread_id = thread.unwrap_or_else(|| ConversationId::new().to_string());
    let greeting = bot.start_thread(&thread_id);

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let reply = bot.respond(&thread_id, Message::user(msg)).await;
        eprint!("\r              \r");
        match reply? {
            Some(reply) => println!("{}", reply.message.content),
            None => eprintln!("  (the bot chose not to answer that message)"),
        }
        return Ok(());
    }

    println!();
    println!("  Docbot Interactive Mode");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.default_model);
    println!("  Corpus:    {} passages", bot.fusion().corpus().len());
    println!("  Thread:    {thread_id}");
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();
    println!("  {} > {}", bot.persona().name, greeting.content);

    interactive(&bot, &thread_id).await
}

async fn interactive(bot: &DocBot, thread_id: &str) -> CommandResult {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        eprint!("  ...");
        let reply = bot.respond(thread_id, Message::user(line)).await;
        eprint!("\r     \r");

        match reply {
            Ok(Some(reply)) => println!("  {} > {}", bot.persona().name, reply.message.content),
            Ok(None) => {}
            Err(e) => eprintln!("  Error: {e}"),
        }
    }

    println!("  Bye!");
    Ok(())
}
