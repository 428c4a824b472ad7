// src/infra/errors.rs — Error types for tourney

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TourneyError {
    // Oracle errors (retriable)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by '{provider}', retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    // Pipeline errors (fatal)
    #[error("Failed to generate {theme}: {message}")]
    Generation { theme: String, message: String },

    #[error("Tournament needs at least one entity")]
    EmptyPool,

    // User errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No API key for '{provider}'. Set OPENAI_API_KEY or run `tourney init`.")]
    NoApiKey { provider: String },

    // Infra
    #[error("Cache file {path}: {message}")]
    Cache { path: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TourneyError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            TourneyError::Provider {
                retriable: true,
                ..
            } | TourneyError::RateLimited { .. }
        )
    }
}
