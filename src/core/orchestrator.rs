// src/core/orchestrator.rs — Pipeline: validate → generate → run the bracket

use super::bracket::Tournament;
use super::entities::EntitySource;
use super::types::Bracket;
use crate::infra::errors::TourneyError;

/// Wires the Entity Source into the Tournament Engine.
pub struct Pipeline {
    source: EntitySource,
    engine: Tournament,
}

impl Pipeline {
    pub fn new(source: EntitySource, engine: Tournament) -> Self {
        Self { source, engine }
    }

    /// Generate `n` entities for `theme` and run them to a champion.
    ///
    /// A generation failure is returned as-is and the engine never starts.
    pub async fn run(&mut self, n: usize, theme: &str) -> Result<Bracket, TourneyError> {
        let theme = validate(n, theme)?;

        let entities = self.source.generate(n, theme).await?;
        if entities.is_empty() {
            return Err(TourneyError::Generation {
                theme: theme.to_string(),
                message: "no entities to compete".into(),
            });
        }
        tracing::info!(theme, requested = n, generated = entities.len(), "entity pool ready");

        self.engine.run(entities, theme).await
    }
}

/// Check run inputs; returns the trimmed theme.
pub fn validate(n: usize, theme: &str) -> Result<&str, TourneyError> {
    if n < 2 {
        return Err(TourneyError::InvalidInput(format!(
            "number of entities must be greater than 1 (got {n})"
        )));
    }
    let theme = theme.trim();
    if theme.is_empty() {
        return Err(TourneyError::InvalidInput("theme must not be empty".into()));
    }
    Ok(theme)
}
