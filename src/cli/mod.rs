// src/cli/mod.rs — CLI definition (clap derive)

pub mod cache;
pub mod init;
pub mod output;
pub mod progress;
pub mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::infra::config::Config;
use crate::provider::ModelRef;

#[derive(Parser)]
#[command(
    name = "tourney",
    about = "Run an LLM-judged single-elimination tournament",
    version,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// How many entities to generate (must be greater than 1)
    pub count: Option<usize>,

    /// Theme of the tournament, e.g. "sci-fi movies"
    #[arg(trailing_var_arg = true)]
    pub theme: Vec<String>,

    /// Model to judge with ("model" or "provider/model")
    #[arg(short, long)]
    pub model: Option<String>,

    /// Seed for the shuffle and random fallbacks
    #[arg(long)]
    pub seed: Option<u64>,

    /// Max comparisons in flight per round
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Cache file path
    #[arg(long, global = true)]
    pub cache: Option<PathBuf>,

    /// Quality the judge compares on ("which is more <criterion>?")
    #[arg(long)]
    pub criterion: Option<String>,

    /// Print the full bracket as JSON
    #[arg(long)]
    pub json: bool,

    /// Suppress round-by-round progress
    #[arg(short, long)]
    pub quiet: bool,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config and store an API key
    Init,
    /// Show what the cache file holds
    Cache {
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Theme words joined back into one string.
    pub fn theme_text(&self) -> String {
        self.theme.join(" ").trim().to_string()
    }

    /// Command-line flags take precedence over config.toml.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(ref model) = self.model {
            match ModelRef::parse(model) {
                Some(model_ref) => {
                    config.oracle.provider = model_ref.provider;
                    config.oracle.model = model_ref.model;
                }
                None => config.oracle.model = model.clone(),
            }
        }
        if let Some(seed) = self.seed {
            config.tournament.seed = Some(seed);
        }
        if let Some(concurrency) = self.concurrency {
            config.tournament.concurrency = concurrency;
        }
        if let Some(ref path) = self.cache {
            config.cache.path = Some(path.clone());
        }
        if let Some(ref criterion) = self.criterion {
            config.tournament.criterion = criterion.clone();
        }
    }
}
