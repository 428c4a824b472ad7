// src/core/comparator.rs — Resolve one pairwise match via cache, oracle, or coin flip

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

use crate::cache::{CacheStore, CacheValue};
use crate::core::bracket::PairJudge;
use crate::core::types::{MatchKey, SharedRng};
use crate::provider::{ChatRequest, ModelProvider};

/// How a winner was reached. Only used for logging; callers see a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Cached,
    Oracle,
    /// Oracle call failed.
    FallbackError,
    /// Oracle answered with neither candidate.
    FallbackUnmatched,
}

pub struct Comparator {
    provider: Arc<dyn ModelProvider>,
    model: String,
    cache: Arc<CacheStore>,
    /// Base for per-match coin flips.
    fallback_seed: u64,
    criterion: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl Comparator {
    /// Takes one draw from `rng` here; every later coin flip is derived from
    /// it and the match key, so outcomes don't depend on completion order.
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        model: String,
        cache: Arc<CacheStore>,
        rng: SharedRng,
    ) -> Self {
        let fallback_seed = rng.lock().unwrap_or_else(|e| e.into_inner()).gen::<u64>();
        Self {
            provider,
            model,
            cache,
            fallback_seed,
            criterion: "notable".into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_criterion(mut self, criterion: impl Into<String>) -> Self {
        self.criterion = criterion.into();
        self
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Decide `left` vs `right` under `theme`. The result is always one of
    /// the two and is cached under the order-sensitive match key, fallbacks
    /// included.
    pub async fn resolve(&self, left: &str, right: &str, theme: &str) -> (String, Resolution) {
        let key = MatchKey::new(theme, left, right);
        let cache_key = key.cache_key();

        match self.cache.get(theme, &cache_key) {
            Some(CacheValue::Winner(w)) if w == left || w == right => {
                return (w, Resolution::Cached);
            }
            Some(other) => {
                tracing::warn!(theme, key = %cache_key, "ignoring malformed cache entry {:?}", other);
            }
            None => {}
        }

        let (winner, resolution) = match self.provider.chat(self.build_request(left, right, theme)).await {
            Ok(response) => match match_answer(&response.content, left, right) {
                Some(w) => (w.to_string(), Resolution::Oracle),
                None => {
                    tracing::warn!(
                        theme,
                        left,
                        right,
                        answer = crate::util::truncate_str(response.content.trim(), 120),
                        "oracle answer names neither candidate, picking at random"
                    );
                    (self.coin_flip(&key, left, right), Resolution::FallbackUnmatched)
                }
            },
            Err(e) => {
                tracing::warn!(theme, left, right, "oracle call failed, picking at random: {e}");
                (self.coin_flip(&key, left, right), Resolution::FallbackError)
            }
        };

        if let Err(e) = self
            .cache
            .set(theme, &cache_key, CacheValue::Winner(winner.clone()))
        {
            tracing::warn!(theme, key = %cache_key, "could not persist match result: {e}");
        }
        (winner, resolution)
    }

    fn build_request(&self, left: &str, right: &str, theme: &str) -> ChatRequest {
        let criterion = &self.criterion;
        let mut request = ChatRequest::instruct(
            self.model.clone(),
            format!("You are judging a head-to-head tournament of {theme}."),
            format!(
                "Compare {left} and {right} as {theme}. Which one is more {criterion}? \
                 A {theme} counts as more {criterion} if it is more influential, \
                 groundbreaking, or culturally significant. \
                 Respond with only the name or title of the winner."
            ),
        );
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;
        request
    }

    fn coin_flip(&self, key: &MatchKey, left: &str, right: &str) -> String {
        let mut rng = StdRng::seed_from_u64(self.fallback_seed ^ match_hash(key));
        let winner = if rng.gen_bool(0.5) { left } else { right };
        winner.to_string()
    }
}

#[async_trait]
impl PairJudge for Comparator {
    async fn compare(&self, left: &str, right: &str, theme: &str) -> String {
        let (winner, resolution) = self.resolve(left, right, theme).await;
        tracing::debug!(theme, left, right, winner = %winner, ?resolution, "match resolved");
        winner
    }
}

/// FNV-1a over theme and cache key; stable across runs and platforms.
fn match_hash(key: &MatchKey) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    key.theme
        .bytes()
        .chain(std::iter::once(0xff))
        .chain(key.cache_key().into_bytes())
        .fold(OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(PRIME))
}

/// The winner named by `answer`, if it is exactly one of the candidates
/// after trimming whitespace.
pub fn match_answer<'a>(answer: &str, left: &'a str, right: &'a str) -> Option<&'a str> {
    let answer = answer.trim();
    if answer == left {
        Some(left)
    } else if answer == right {
        Some(right)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::shared_rng;
    use crate::infra::errors::TourneyError;
    use crate::provider::ChatResponse;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FixedProvider {
        answer: Option<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModelProvider for FixedProvider {
        fn id(&self) -> &str {
            "fixed"
        }
        fn name(&self) -> &str {
            "Fixed"
        }
        async fn chat(&self, _req: ChatRequest) -> Result<ChatResponse, TourneyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.answer {
                Some(a) => Ok(ChatResponse {
                    content: a.clone(),
                    ..Default::default()
                }),
                None => Err(TourneyError::Provider {
                    provider: "fixed".into(),
                    message: "connection refused".into(),
                    retriable: true,
                }),
            }
        }
    }

    fn comparator(answer: Option<&str>) -> (TempDir, Arc<FixedProvider>, Comparator) {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(CacheStore::open(dir.path().join("cache.json")).unwrap());
        let provider = Arc::new(FixedProvider {
            answer: answer.map(str::to_string),
            calls: AtomicUsize::new(0),
        });
        let cmp = Comparator::new(provider.clone(), "m".into(), cache, shared_rng(Some(1)));
        (dir, provider, cmp)
    }

    #[test]
    fn test_match_answer_exact_after_trim() {
        assert_eq!(match_answer("  Heat\n", "Alien", "Heat"), Some("Heat"));
        assert_eq!(match_answer("Alien", "Alien", "Heat"), Some("Alien"));
        assert_eq!(match_answer("alien", "Alien", "Heat"), None);
        assert_eq!(match_answer("Heat is better", "Alien", "Heat"), None);
    }

    #[tokio::test]
    async fn test_oracle_answer_wins_and_is_cached() {
        let (_dir, provider, cmp) = comparator(Some("Heat"));
        assert_eq!(cmp.resolve("Alien", "Heat", "movies").await, ("Heat".into(), Resolution::Oracle));
        assert_eq!(cmp.resolve("Alien", "Heat", "movies").await, ("Heat".into(), Resolution::Cached));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reversed_pair_is_a_separate_entry() {
        let (_dir, provider, cmp) = comparator(Some("Heat"));
        cmp.resolve("Alien", "Heat", "movies").await;
        cmp.resolve("Heat", "Alien", "movies").await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unmatched_answer_falls_back_and_memoizes() {
        let (_dir, provider, cmp) = comparator(Some("Neither, obviously"));
        let (first, how) = cmp.resolve("Alien", "Heat", "movies").await;
        assert_eq!(how, Resolution::FallbackUnmatched);
        assert!(first == "Alien" || first == "Heat");

        for _ in 0..5 {
            let (again, how) = cmp.resolve("Alien", "Heat", "movies").await;
            assert_eq!(again, first);
            assert_eq!(how, Resolution::Cached);
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_oracle_error_falls_back_and_memoizes() {
        let (_dir, _provider, cmp) = comparator(None);
        let (first, how) = cmp.resolve("Alien", "Heat", "movies").await;
        assert_eq!(how, Resolution::FallbackError);
        assert!(first == "Alien" || first == "Heat");
        assert_eq!(cmp.compare("Alien", "Heat", "movies").await, first);
    }

    #[tokio::test]
    async fn test_malformed_cache_entry_is_replaced() {
        let (_dir, _provider, cmp) = comparator(Some("Alien"));
        let key = MatchKey::new("movies", "Alien", "Heat").cache_key();
        cmp.cache
            .set("movies", &key, CacheValue::Winner("Jaws".into()))
            .unwrap();
        assert_eq!(cmp.resolve("Alien", "Heat", "movies").await.0, "Alien");
        assert_eq!(
            cmp.cache.get("movies", &key),
            Some(CacheValue::Winner("Alien".into()))
        );
    }

    #[tokio::test]
    async fn test_identical_names_always_resolve() {
        let (_dir, _provider, cmp) = comparator(None);
        assert_eq!(cmp.compare("Echo", "Echo", "myths").await, "Echo");
    }

    fn failing_comparator(cache_path: std::path::PathBuf, seed: u64) -> Comparator {
        let cache = Arc::new(CacheStore::open(cache_path).unwrap());
        let provider = Arc::new(FixedProvider {
            answer: None,
            calls: AtomicUsize::new(0),
        });
        Comparator::new(provider, "m".into(), cache, shared_rng(Some(seed)))
    }

    #[tokio::test]
    async fn test_fallback_does_not_depend_on_call_order() {
        let pairs: Vec<(String, String)> = (0..12)
            .map(|i| (format!("L{i}"), format!("R{i}")))
            .collect();
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        let a = failing_comparator(dir_a.path().join("cache.json"), 42);
        let b = failing_comparator(dir_b.path().join("cache.json"), 42);

        let mut forward = Vec::new();
        for (l, r) in &pairs {
            forward.push(a.compare(l, r, "things").await);
        }
        let mut backward = Vec::new();
        for (l, r) in pairs.iter().rev() {
            backward.push(b.compare(l, r, "things").await);
        }
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[tokio::test]
    async fn test_fallback_varies_across_matches() {
        let dir = TempDir::new().unwrap();
        let cmp = failing_comparator(dir.path().join("cache.json"), 7);
        let mut lefts = 0;
        for i in 0..32 {
            if cmp.compare(&format!("L{i}"), &format!("R{i}"), "things").await == format!("L{i}") {
                lefts += 1;
            }
        }
        assert!(lefts > 0 && lefts < 32, "lefts = {lefts}");
    }

    #[tokio::test]
    async fn test_cache_write_failure_keeps_the_winner() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let cache = Arc::new(CacheStore::open(blocker.join("cache.json")).unwrap());
        let provider = Arc::new(FixedProvider {
            answer: Some("Heat".into()),
            calls: AtomicUsize::new(0),
        });
        let cmp = Comparator::new(provider, "m".into(), cache, shared_rng(Some(1)));

        assert_eq!(
            cmp.resolve("Alien", "Heat", "movies").await,
            ("Heat".to_string(), Resolution::Oracle)
        );

        let down = failing_comparator(blocker.join("cache.json"), 1);
        let winner = down.compare("Alien", "Heat", "movies").await;
        assert!(winner == "Alien" || winner == "Heat");
    }

    #[test]
    fn test_prompt_mentions_both_candidates_and_criterion() {
        let (_dir, _provider, cmp) = comparator(None);
        let cmp = cmp.with_criterion("chad");
        let req = cmp.build_request("Alien", "Heat", "movies");
        let user = &req.messages[0].content;
        assert!(user.contains("Compare Alien and Heat as movies"));
        assert!(user.contains("more chad"));
        assert!(req.system.unwrap().contains("tournament of movies"));
    }
}
