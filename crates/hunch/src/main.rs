use anyhow::Result;
use clap::Parser;
use colored::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use hunch::controller::{ResolutionController, SuggestionView};
use hunch::fetcher::{ClientConfig, HttpSuggestionSource, SuggestionSource};
use hunch::interest::Interest;

#[derive(Parser)]
#[command(name = "hunch")]
#[command(
  about = "Hunch - Interest Suggestion Engine\nInteractive autocomplete session against a remote suggestion service"
)]
#[command(version)]
struct Cli {
  /// Base URL of the autocomplete service
  #[arg(long, env = "HUNCH_API_URL")]
  base_url: Option<String>,

  /// API key sent with every request
  #[arg(long, env = "HUNCH_API_KEY")]
  api_key: Option<String>,

  /// Page size requested from the service
  #[arg(long)]
  limit: Option<usize>,

  /// Skip the single-letter cache warmup at startup
  #[arg(long)]
  no_warmup: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

  let cli = Cli::parse();

  let mut config = ClientConfig::from_env();
  if let Some(base_url) = cli.base_url {
    config.base_url = base_url;
  }
  if let Some(api_key) = cli.api_key {
    config.api_key = api_key;
  }
  if let Some(limit) = cli.limit {
    config.page_size = limit;
  }

  let source = HttpSuggestionSource::with_config(config);
  let mut controller = ResolutionController::new(source);

  if !cli.no_warmup {
    println!("{}", "warming suggestion cache...".dimmed());
    controller.preload().await;
  }

  print_help();

  let stdin = BufReader::new(tokio::io::stdin());
  let mut lines = stdin.lines();

  while let Some(line) = lines.next_line().await? {
    if !handle_line(&mut controller, line.as_str()).await {
      break;
    }
  }

  Ok(())
}

/// Process one input line; returns false when the session should end.
async fn handle_line<S: SuggestionSource>(
  controller: &mut ResolutionController<S>,
  line: &str,
) -> bool {
  match line.trim() {
    "/quit" => return false,
    "/selected" => print_selected(controller.selected()),
    command if command.starts_with("/add ") => {
      let interest = Interest::custom(&command["/add ".len()..]);
      if interest.name.is_empty() {
        println!("{}", "an interest needs a name".yellow());
      } else {
        println!("added {}", interest.name.green());
        controller.select(interest);
      }
    }
    command if command.starts_with("/select ") => {
      select_by_index(controller, &command["/select ".len()..]);
    }
    command if command.starts_with("/deselect ") => {
      deselect_by_index(controller, &command["/deselect ".len()..]);
    }
    query => {
      controller.on_query_changed(query).await;
      print_view(&controller.view());
    }
  }
  true
}

fn select_by_index<S: SuggestionSource>(controller: &mut ResolutionController<S>, raw: &str) {
  let picked = raw
    .trim()
    .parse::<usize>()
    .ok()
    .and_then(|index| controller.view().results.get(index).cloned());

  match picked {
    Some(interest) => {
      println!("selected {}", interest.name.green());
      controller.select(interest);
    }
    None => println!("{}", "no suggestion at that index".yellow()),
  }
}

fn deselect_by_index<S: SuggestionSource>(controller: &mut ResolutionController<S>, raw: &str) {
  let picked = raw
    .trim()
    .parse::<usize>()
    .ok()
    .and_then(|index| controller.selected().get(index).cloned());

  match picked {
    Some(interest) => {
      println!("removed {}", interest.name.yellow());
      controller.deselect(&interest);
    }
    None => println!("{}", "no selected interest at that index".yellow()),
  }
}

fn print_view(view: &SuggestionView) {
  if let Some(error) = &view.error {
    println!("{}", error.red());
    return;
  }

  if view.loading {
    println!("{}", "loading...".dimmed());
    return;
  }

  if view.results.is_empty() {
    println!("{}", "no suggestions".dimmed());
    return;
  }

  for (index, interest) in view.results.iter().enumerate() {
    let emoji = interest.emoji.as_deref().unwrap_or(" ");
    let secondary = interest
      .secondary_term
      .as_deref()
      .map(|term| format!(" ({term})"))
      .unwrap_or_default();
    println!("{index:>3}. {emoji} {}{}", interest.name.bold(), secondary.dimmed());
  }
}

fn print_selected(selected: &[Interest]) {
  if selected.is_empty() {
    println!("{}", "nothing selected yet".dimmed());
    return;
  }
  for (index, interest) in selected.iter().enumerate() {
    println!("{index:>3}. {}", interest.name.green());
  }
}

fn print_help() {
  println!("type a query and press enter; it is treated as the current search text");
  println!("  /select N    select suggestion N from the last list");
  println!("  /deselect N  remove selected interest N");
  println!("  /add TEXT    add a custom interest (\"Name: Secondary\")");
  println!("  /selected    list selected interests");
  println!("  /quit        exit");
}
