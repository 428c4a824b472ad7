// src/cli/run.rs — Default command: run a tournament

use std::sync::Arc;

use crate::auth;
use crate::cache::CacheStore;
use crate::core::bracket::Tournament;
use crate::core::comparator::Comparator;
use crate::core::entities::EntitySource;
use crate::core::orchestrator::Pipeline;
use crate::core::types::{shared_rng, Bracket};
use crate::infra::config::Config;
use crate::infra::errors::TourneyError;
use crate::provider::openai::OpenAIProvider;
use crate::provider::retry::{RetryConfig, RetryProvider};
use crate::provider::ModelProvider;

use super::output;
use super::progress::terminal_progress;

/// Build the oracle client from config: OpenAI-compatible HTTP client with a
/// request timeout, wrapped in the retry layer.
pub fn build_provider(config: &Config) -> Result<Arc<dyn ModelProvider>, TourneyError> {
    let oracle = &config.oracle;
    let api_key = auth::resolve_api_key(&oracle.provider).ok_or_else(|| TourneyError::NoApiKey {
        provider: oracle.provider.clone(),
    })?;

    let client = OpenAIProvider::with_base_url(
        oracle.provider.clone(),
        api_key,
        oracle.base_url.clone(),
    )
    .with_timeout(oracle.timeout());

    Ok(Arc::new(RetryProvider::with_config(
        Arc::new(client),
        RetryConfig::from(&oracle.retry),
    )))
}

/// Wire source, comparator and engine around one provider and one cache.
/// The shuffle and the comparator's fallback share the same seeded source.
pub fn build_pipeline(
    provider: Arc<dyn ModelProvider>,
    cache: Arc<CacheStore>,
    config: &Config,
    quiet: bool,
) -> Pipeline {
    let oracle = &config.oracle;
    let rng = shared_rng(config.tournament.seed);

    let source = EntitySource::new(provider.clone(), oracle.model.clone(), cache.clone())
        .with_sampling(oracle.temperature, oracle.max_tokens);

    let comparator = Comparator::new(provider, oracle.model.clone(), cache, rng.clone())
        .with_criterion(config.tournament.criterion.clone())
        .with_sampling(oracle.temperature, oracle.max_tokens);

    let mut engine =
        Tournament::new(Arc::new(comparator), rng).with_concurrency(config.tournament.concurrency);
    if !quiet {
        engine = engine.with_progress(terminal_progress());
    }

    Pipeline::new(source, engine)
}

/// Run one tournament end to end and return its bracket.
pub async fn run_with_provider(
    provider: Arc<dyn ModelProvider>,
    n: usize,
    theme: &str,
    config: &Config,
    quiet: bool,
) -> Result<Bracket, TourneyError> {
    let cache = Arc::new(CacheStore::open(config.cache.resolved_path())?);
    tracing::debug!(cache = %cache.path().display(), model = %config.oracle.model, "starting tournament");
    let mut pipeline = build_pipeline(provider, cache, config, quiet);
    pipeline.run(n, theme).await
}

/// Execute `tourney N THEME` against the configured oracle.
pub async fn run_tournament(
    n: usize,
    theme: &str,
    config: &Config,
    json: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let provider = build_provider(config)?;
    if !quiet {
        eprintln!(
            "Generating {} {} with {}...",
            n,
            theme.trim(),
            config.oracle.model
        );
    }
    let bracket = run_with_provider(provider, n, theme, config, quiet).await?;
    output::print_result(&bracket, json)
}
