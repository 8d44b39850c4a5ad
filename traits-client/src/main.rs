use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rustyline::{DefaultEditor, error::ReadlineError};
use tracing::info;
use tracing_subscriber::EnvFilter;
use traits_client::{
    ChatSession, ClientConfig, HttpBackend, SearchSession, SpeciesOptions, TraitsBackend,
    fetch_datasets, render,
};
use traits_core::ChatMode;

const HELP: &str = "\
Commands:
  /species <name>      search by vernacular name
  /scientific <name>   search by scientific name
  /fuzzy <name>        fuzzy species search
  /phylo <group>       search a phylogenetic group
  /mode <standard|grounded|thinking>
  /reset               clear the chat
  /history             show the chat transcript
  /help                show this help
  /quit                exit
Anything else is sent to the chat assistant.";

#[derive(Parser, Debug)]
#[command(name = "traits", about = "Species trait search and chat assistant")]
struct Args {
    /// Backend base URL (overrides API_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Load the three static datasets at start-up
    #[arg(long)]
    fetch_datasets: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let config = match &args.base_url {
        Some(url) => ClientConfig::with_base_url(url),
        None => ClientConfig::from_env(),
    }
    .context("invalid client configuration")?;

    let backend: Arc<dyn TraitsBackend> = Arc::new(HttpBackend::new(config.base_url.clone()));
    let search = SearchSession::new(backend.clone());
    let chat = ChatSession::new(backend.clone());

    print_lines(&render::header_lines());
    println!();

    if args.fetch_datasets {
        let datasets = fetch_datasets(backend.as_ref()).await.context("failed to load datasets")?;
        info!(
            vernacular = entry_count(&datasets.vernacular),
            scientific = entry_count(&datasets.scientific),
            phylo = entry_count(&datasets.phylo),
            "datasets loaded"
        );
        println!("Datasets loaded.");
    }

    print_lines(&render::render_transcript(&chat.messages()));
    println!();
    println!("{HELP}");

    let mut editor = DefaultEditor::new()?;
    loop {
        let prompt = format!("[{}]> ", chat.mode().label());
        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        editor.add_history_entry(line)?;

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "/quit" | "/exit" => break,
            "/help" => println!("{HELP}"),
            "/species" => show_search(search.search_species(rest, SpeciesOptions::default()).await),
            "/scientific" => show_search(
                search
                    .search_species(rest, SpeciesOptions { scientific: true, fuzzy: false })
                    .await,
            ),
            "/fuzzy" => show_search(
                search.search_species(rest, SpeciesOptions { scientific: false, fuzzy: true }).await,
            ),
            "/phylo" => show_search(search.search_phylo(rest).await),
            "/mode" => match rest.parse::<ChatMode>() {
                Ok(mode) => {
                    chat.set_mode(mode);
                    println!("Chat mode: {}", mode.label());
                }
                Err(_) => println!("Unknown mode '{rest}'. Use standard, grounded, or thinking."),
            },
            "/reset" => {
                chat.reset();
                print_lines(&render::render_transcript(&chat.messages()));
            }
            "/history" => print_lines(&render::render_transcript(&chat.messages())),
            _ if command.starts_with('/') => println!("Unknown command '{command}'. Try /help."),
            _ => {
                println!("Thinking...");
                if let Some(reply) = chat.send(line).await {
                    print_lines(&render::render_message(&reply));
                }
            }
        }
        println!();
    }

    Ok(())
}

fn show_search(outcome: Result<Option<traits_client::SearchResult>, traits_client::Busy>) {
    match outcome {
        Ok(Some(result)) => {
            let card = render::render_result(&result);
            let lines = card.to_lines();
            if card.is_error {
                lines.iter().for_each(|line| eprintln!("{line}"));
            } else {
                print_lines(&lines);
            }
        }
        Ok(None) => {}
        Err(busy) => println!("{busy}"),
    }
}

fn entry_count(value: &serde_json::Value) -> usize {
    match value {
        serde_json::Value::Object(map) => map.len(),
        serde_json::Value::Array(items) => items.len(),
        _ => 1,
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
