//! `lodestar search` — One-shot question or interactive session.

use std::io::Write;
use std::path::PathBuf;

use lodestar_agent::SearchAgent;
use lodestar_config::{Config, OptimizationMode};
use lodestar_core::message::ChatMessage;
use lodestar_core::response::SearchAgentResponse;

pub async fn run(
    query: Option<String>,
    sources: Option<String>,
    mode: OptimizationMode,
    model: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => Config::load_at(&path)?,
        None => Config::load()?,
    };

    let sources: Vec<String> = match sources {
        Some(list) => list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => config.general.enabled_sources.clone(),
    };

    let agent = SearchAgent::new(config);

    match query {
        Some(query) => {
            let response = agent
                .search(&query, &sources, mode, model.as_deref(), &[], None)
                .await?;
            print_response(&response);
        }
        None => interactive(&agent, &sources, mode, model.as_deref()).await?,
    }

    Ok(())
}

async fn interactive(
    agent: &SearchAgent,
    sources: &[String],
    mode: OptimizationMode,
    model: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("  Lodestar — Interactive Mode");
    println!("  Sources: {}   Mode: {mode}", sources.join(", "));
    println!("  Type your question and press Enter. 'quit' or 'exit' to leave.");
    println!();

    let mut history: Vec<ChatMessage> = Vec::new();
    let stdin = std::io::stdin();

    loop {
        print!("You > ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query == "quit" || query == "exit" {
            break;
        }

        match agent.search(query, sources, mode, model, &history, None).await {
            Ok(response) => {
                println!();
                print_response(&response);
                println!();

                history.push(ChatMessage::user(query));
                history.push(ChatMessage::assistant(&response.answer));
            }
            Err(e) => {
                eprintln!("[Error] {e}");
                println!();
            }
        }
    }

    println!("\nGoodbye!");
    Ok(())
}

fn print_response(response: &SearchAgentResponse) {
    println!("{}", response.answer);

    if !response.sources.is_empty() {
        println!("\nSources:");
        for source in &response.sources {
            println!("  - {}: {}", source.title, source.url);
        }
    }
}
