// src/core/bracket.rs — Single-elimination tournament engine
//
// Shuffle once, then pair neighbours (2i, 2i+1) round after round. Every
// match of a round runs as its own task; the round ends only when all of
// them have produced a winner.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::types::{Bracket, MatchRecord, Phase, ProgressEvent, RoundRecord, SharedRng};
use crate::infra::errors::TourneyError;

/// Decides a single match. Must return `left` or `right`.
#[async_trait]
pub trait PairJudge: Send + Sync {
    async fn compare(&self, left: &str, right: &str, theme: &str) -> String;
}

const DEFAULT_CONCURRENCY: usize = 16;

pub struct Tournament {
    judge: Arc<dyn PairJudge>,
    rng: SharedRng,
    concurrency: usize,
    phase: Phase,
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send>>,
}

impl Tournament {
    pub fn new(judge: Arc<dyn PairJudge>, rng: SharedRng) -> Self {
        Self {
            judge,
            rng,
            concurrency: DEFAULT_CONCURRENCY,
            phase: Phase::Seeded,
            on_progress: None,
        }
    }

    /// Max matches in flight within one round, clamped to what a semaphore holds.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        tracing::debug!(from = %self.phase, to = %phase, "tournament phase");
        self.phase = phase;
    }

    /// Run the whole bracket and return it with its champion.
    pub async fn run(&mut self, entities: Vec<String>, theme: &str) -> Result<Bracket, TourneyError> {
        if entities.is_empty() {
            return Err(TourneyError::EmptyPool);
        }
        self.set_phase(Phase::Seeded);
        self.emit(ProgressEvent::PoolReady {
            theme: theme.to_string(),
            entities: entities.clone(),
        });

        let mut pool = entities;
        {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            pool.shuffle(&mut *rng);
        }
        let seeding = pool.clone();
        tracing::info!(theme, entrants = pool.len(), "tournament seeded");

        let mut rounds: Vec<RoundRecord> = Vec::new();
        while pool.len() > 1 {
            let number = rounds.len() + 1;
            let record = self.play_round(number, pool, theme).await?;
            pool = record.advancing();
            self.set_phase(Phase::RoundComplete(number));
            self.emit(ProgressEvent::RoundCompleted {
                round: number,
                remaining: pool.len(),
            });
            rounds.push(record);
        }

        let champion = pool.pop().ok_or(TourneyError::EmptyPool)?;
        self.set_phase(Phase::Finished);
        tracing::info!(theme, champion = %champion, rounds = rounds.len(), "tournament finished");
        self.emit(ProgressEvent::Champion {
            entity: champion.clone(),
            rounds: rounds.len(),
        });

        Ok(Bracket {
            theme: theme.to_string(),
            seeding,
            rounds,
            champion,
        })
    }

    async fn play_round(
        &mut self,
        number: usize,
        entrants: Vec<String>,
        theme: &str,
    ) -> Result<RoundRecord, TourneyError> {
        let (pairs, bye) = pair_up(&entrants);
        self.set_phase(Phase::RoundInProgress(number));
        self.emit(ProgressEvent::RoundStarted {
            round: number,
            entrants: entrants.len(),
            matches: pairs.len(),
        });
        if let Some(ref entity) = bye {
            self.emit(ProgressEvent::AutoAdvanced {
                round: number,
                entity: entity.clone(),
            });
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let handles: Vec<_> = pairs
            .iter()
            .map(|(left, right)| {
                let judge = self.judge.clone();
                let semaphore = semaphore.clone();
                let (left, right, theme) = (left.clone(), right.clone(), theme.to_string());
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    judge.compare(&left, &right, &theme).await
                })
            })
            .collect();

        // Barrier: every match of this round, in dispatch order.
        let results = futures::future::join_all(handles).await;

        let mut matches = Vec::with_capacity(pairs.len());
        for ((left, right), joined) in pairs.into_iter().zip(results) {
            let winner = joined.map_err(|e| {
                TourneyError::Other(anyhow::anyhow!(
                    "comparison task for '{left}' vs '{right}' failed: {e}"
                ))
            })?;
            if winner != left && winner != right {
                return Err(TourneyError::Other(anyhow::anyhow!(
                    "judge returned '{winner}' for '{left}' vs '{right}'"
                )));
            }
            self.emit(ProgressEvent::MatchDecided {
                round: number,
                left: left.clone(),
                right: right.clone(),
                winner: winner.clone(),
            });
            matches.push(MatchRecord {
                left,
                right,
                winner,
            });
        }

        Ok(RoundRecord {
            number,
            entrants,
            matches,
            bye,
        })
    }
}

/// Pair neighbours (2i, 2i+1); an odd trailing entity is returned as the bye.
pub fn pair_up(entrants: &[String]) -> (Vec<(String, String)>, Option<String>) {
    let mut pairs = Vec::with_capacity(entrants.len() / 2);
    let mut bye = None;
    for chunk in entrants.chunks(2) {
        match chunk {
            [left, right] => pairs.push((left.clone(), right.clone())),
            [single] => bye = Some(single.clone()),
            _ => {}
        }
    }
    (pairs, bye)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{expected_rounds, shared_rng};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("E{i}")).collect()
    }

    /// Alphabetically smaller name wins; records every call.
    #[derive(Default)]
    struct LexJudge {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl PairJudge for LexJudge {
        async fn compare(&self, left: &str, right: &str, _theme: &str) -> String {
            self.calls
                .lock()
                .unwrap()
                .push((left.to_string(), right.to_string()));
            left.min(right).to_string()
        }
    }

    #[test]
    fn test_pair_up_even() {
        let (pairs, bye) = pair_up(&names(4));
        assert_eq!(
            pairs,
            vec![
                ("E1".to_string(), "E2".to_string()),
                ("E3".to_string(), "E4".to_string())
            ]
        );
        assert!(bye.is_none());
    }

    #[test]
    fn test_pair_up_odd() {
        let (pairs, bye) = pair_up(&names(3));
        assert_eq!(pairs.len(), 1);
        assert_eq!(bye.as_deref(), Some("E3"));
    }

    #[tokio::test]
    async fn test_empty_pool_is_an_error() {
        let mut t = Tournament::new(Arc::new(LexJudge::default()), shared_rng(Some(1)));
        assert!(matches!(
            t.run(vec![], "x").await,
            Err(TourneyError::EmptyPool)
        ));
    }

    #[tokio::test]
    async fn test_single_entity_is_champion_without_rounds() {
        let judge = Arc::new(LexJudge::default());
        let mut t = Tournament::new(judge.clone(), shared_rng(Some(1)));
        let bracket = t.run(vec!["Solo".into()], "x").await.unwrap();
        assert_eq!(bracket.champion, "Solo");
        assert!(bracket.rounds.is_empty());
        assert!(judge.calls.lock().unwrap().is_empty());
        assert_eq!(t.phase(), Phase::Finished);
    }

    #[tokio::test]
    async fn test_round_count_and_membership() {
        for n in 2..=33 {
            let pool = names(n);
            let mut t = Tournament::new(Arc::new(LexJudge::default()), shared_rng(Some(n as u64)));
            let bracket = t.run(pool.clone(), "x").await.unwrap();
            assert_eq!(bracket.rounds.len(), expected_rounds(n), "n = {n}");
            assert!(pool.contains(&bracket.champion));
            assert_eq!(bracket.total_matches(), n - 1);
        }
    }

    #[tokio::test]
    async fn test_rounds_shrink_and_chain() {
        let mut t = Tournament::new(Arc::new(LexJudge::default()), shared_rng(Some(3)));
        let bracket = t.run(names(11), "x").await.unwrap();

        let seeded: HashSet<_> = bracket.seeding.iter().cloned().collect();
        assert_eq!(seeded, names(11).into_iter().collect::<HashSet<_>>());
        assert_eq!(bracket.rounds[0].entrants, bracket.seeding);

        for pair in bracket.rounds.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            assert_eq!(next.entrants, prev.advancing());
            assert_eq!(next.entrants.len(), (prev.entrants.len() + 1) / 2);
        }
    }

    #[tokio::test]
    async fn test_bye_is_last_and_never_compared() {
        let judge = Arc::new(LexJudge::default());
        let mut t = Tournament::new(judge.clone(), shared_rng(Some(9)));
        let bracket = t.run(names(5), "x").await.unwrap();

        let round1 = &bracket.rounds[0];
        let bye = round1.bye.clone().unwrap();
        assert_eq!(round1.entrants.last(), Some(&bye));
        assert!(round1
            .matches
            .iter()
            .all(|m| m.left != bye && m.right != bye));
        assert_eq!(bracket.rounds[1].entrants.last(), Some(&bye));
    }

    #[tokio::test]
    async fn test_same_seed_same_bracket() {
        let run = |seed| async move {
            let mut t = Tournament::new(Arc::new(LexJudge::default()), shared_rng(Some(seed)));
            t.run(names(9), "x").await.unwrap()
        };
        assert_eq!(run(42).await, run(42).await);
    }

    /// Sleeps inside every comparison and tracks concurrency.
    struct SlowJudge {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        log: Mutex<Vec<(bool, String)>>,
    }

    #[async_trait]
    impl PairJudge for SlowJudge {
        async fn compare(&self, left: &str, right: &str, _theme: &str) -> String {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.log.lock().unwrap().push((true, left.to_string()));
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            self.log.lock().unwrap().push((false, left.to_string()));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            right.to_string()
        }
    }

    fn slow_judge() -> Arc<SlowJudge> {
        Arc::new(SlowJudge {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_huge_concurrency_is_clamped() {
        let mut t = Tournament::new(Arc::new(LexJudge::default()), shared_rng(Some(1)))
            .with_concurrency(usize::MAX);
        assert_eq!(t.concurrency, Semaphore::MAX_PERMITS);
        assert_eq!(t.run(names(4), "x").await.unwrap().rounds.len(), 2);

        let t = Tournament::new(Arc::new(LexJudge::default()), shared_rng(Some(1)))
            .with_concurrency(0);
        assert_eq!(t.concurrency, 1);
    }

    #[tokio::test]
    async fn test_fan_out_respects_concurrency_limit() {
        let judge = slow_judge();
        let mut t = Tournament::new(judge.clone(), shared_rng(Some(5))).with_concurrency(2);
        t.run(names(16), "x").await.unwrap();
        let max = judge.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 2, "max in flight was {max}");
    }

    #[tokio::test]
    async fn test_round_matches_run_concurrently() {
        let judge = slow_judge();
        let mut t = Tournament::new(judge.clone(), shared_rng(Some(5))).with_concurrency(8);
        t.run(names(8), "x").await.unwrap();
        assert!(judge.max_in_flight.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_round_is_a_barrier() {
        let judge = slow_judge();
        let mut t = Tournament::new(judge.clone(), shared_rng(Some(5)));
        let bracket = t.run(names(8), "x").await.unwrap();

        let log = judge.log.lock().unwrap();
        let round1_calls = bracket.rounds[0].matches.len();
        // First 2 * round1_calls events are exactly round 1's starts and ends.
        let (round1, rest) = log.split_at(2 * round1_calls);
        let round1_lefts: HashSet<_> = bracket.rounds[0].matches.iter().map(|m| m.left.clone()).collect();
        assert!(round1.iter().all(|(_, l)| round1_lefts.contains(l)));
        assert!(rest.first().map(|(start, _)| *start).unwrap_or(true));
    }

    struct RogueJudge;

    #[async_trait]
    impl PairJudge for RogueJudge {
        async fn compare(&self, _left: &str, _right: &str, _theme: &str) -> String {
            "Somebody else".into()
        }
    }

    #[tokio::test]
    async fn test_winner_outside_pair_is_rejected() {
        let mut t = Tournament::new(Arc::new(RogueJudge), shared_rng(Some(1)));
        assert!(t.run(names(2), "x").await.is_err());
    }

    #[tokio::test]
    async fn test_progress_events() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let mut t = Tournament::new(Arc::new(LexJudge::default()), shared_rng(Some(2)))
            .with_progress(move |e| sink.lock().unwrap().push(e));
        t.run(names(3), "x").await.unwrap();

        let events = events.lock().unwrap();
        let started = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::RoundStarted { .. }))
            .count();
        let byes = events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::AutoAdvanced { round: 1, .. }))
            .count();
        assert_eq!(started, 2);
        assert_eq!(byes, 1);
        match events.first() {
            Some(ProgressEvent::PoolReady { theme, entities }) => {
                assert_eq!(theme, "x");
                assert_eq!(entities, &names(3));
            }
            other => panic!("expected the pool first, got {other:?}"),
        }
        assert!(matches!(
            events.last(),
            Some(ProgressEvent::Champion { rounds: 2, .. })
        ));
    }
}
