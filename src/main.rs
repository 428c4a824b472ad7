// src/main.rs — tourney entry point

use clap::Parser;
use std::io::IsTerminal;

use tourney::cli::{Cli, Commands};
use tourney::infra::config::Config;
use tourney::infra::logger;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml), then let flags win
    let mut config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };
    cli.apply_to(&mut config);

    // Initialize logging (respects TOURNEY_LOG / RUST_LOG)
    logger::init_logging(&config.logging.level, config.logging.file.as_deref());

    match &cli.command {
        Some(Commands::Init) => return tourney::cli::init::run_init().await,
        Some(Commands::Cache { json }) => {
            return tourney::cli::cache::show_cache(&config.cache.resolved_path(), *json);
        }
        None => {}
    }

    let (n, theme) = build_run_input(&cli)?;
    tourney::cli::run::run_tournament(n, &theme, &config, cli.json, cli.quiet).await
}

/// Count and theme from positional args, prompting for whatever is missing
/// when attached to a terminal.
fn build_run_input(cli: &Cli) -> anyhow::Result<(usize, String)> {
    let interactive = std::io::stdin().is_terminal();
    if !interactive && (cli.count.is_none() || cli.theme_text().is_empty()) {
        eprintln!("Usage: tourney <N> <THEME...>");
        eprintln!("Run tourney --help for all options.");
        std::process::exit(1);
    }

    let n = match cli.count {
        Some(n) => n,
        None => {
            let answer = inquire::Text::new("How many entities should compete?")
                .with_help_message("An integer greater than 1, or press Esc to cancel")
                .prompt()
                .map_err(|_| anyhow::anyhow!("Input cancelled"))?;
            answer
                .trim()
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("'{}' is not a valid number", answer.trim()))?
        }
    };

    let mut theme = cli.theme_text();
    if theme.is_empty() {
        theme = inquire::Text::new("What theme?")
            .with_help_message("e.g. sci-fi movies, epic poems, board games")
            .prompt()
            .map_err(|_| anyhow::anyhow!("Input cancelled"))?
            .trim()
            .to_string();
    }

    Ok((n, theme))
}
