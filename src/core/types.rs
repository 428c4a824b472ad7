// src/core/types.rs — Core data types for the tournament engine

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Random source shared by the shuffle and the comparator fallback.
pub type SharedRng = Arc<Mutex<StdRng>>;

/// Seeded when a seed is given, otherwise from OS entropy.
pub fn shared_rng(seed: Option<u64>) -> SharedRng {
    let rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    Arc::new(Mutex::new(rng))
}

/// Identifies one cacheable pairwise decision. Order-sensitive:
/// (a, b) and (b, a) are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchKey {
    pub theme: String,
    pub left: String,
    pub right: String,
}

impl MatchKey {
    pub fn new(theme: &str, left: &str, right: &str) -> Self {
        Self {
            theme: theme.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        }
    }

    /// Key within the theme partition of the cache.
    pub fn cache_key(&self) -> String {
        format!("compare:{}", serde_json::json!([self.left, self.right]))
    }
}

/// Key for a cached entity list of size `n`.
pub fn generation_key(n: usize) -> String {
    format!("generate_{n}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub left: String,
    pub right: String,
    pub winner: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based round number.
    pub number: usize,
    pub entrants: Vec<String>,
    pub matches: Vec<MatchRecord>,
    /// Trailing entity of an odd round, advanced without a match.
    pub bye: Option<String>,
}

impl RoundRecord {
    /// Next round's entrants: match winners in order, then the bye.
    pub fn advancing(&self) -> Vec<String> {
        let mut next: Vec<String> = self.matches.iter().map(|m| m.winner.clone()).collect();
        if let Some(bye) = &self.bye {
            next.push(bye.clone());
        }
        next
    }
}

/// The full round sequence from the shuffled pool to the champion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub theme: String,
    /// Pool after the one-time shuffle.
    pub seeding: Vec<String>,
    pub rounds: Vec<RoundRecord>,
    pub champion: String,
}

impl Bracket {
    pub fn total_matches(&self) -> usize {
        self.rounds.iter().map(|r| r.matches.len()).sum()
    }
}

/// Engine lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Seeded,
    RoundInProgress(usize),
    RoundComplete(usize),
    Finished,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Seeded => write!(f, "seeded"),
            Phase::RoundInProgress(r) => write!(f, "round {r} in progress"),
            Phase::RoundComplete(r) => write!(f, "round {r} complete"),
            Phase::Finished => write!(f, "finished"),
        }
    }
}

/// Progress events emitted by the engine.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The generated pool, in generation order, before the shuffle.
    PoolReady {
        theme: String,
        entities: Vec<String>,
    },
    RoundStarted {
        round: usize,
        entrants: usize,
        matches: usize,
    },
    MatchDecided {
        round: usize,
        left: String,
        right: String,
        winner: String,
    },
    AutoAdvanced {
        round: usize,
        entity: String,
    },
    RoundCompleted {
        round: usize,
        remaining: usize,
    },
    Champion {
        entity: String,
        rounds: usize,
    },
}

/// Number of rounds a pool of `n` needs: ⌈log₂ n⌉.
pub fn expected_rounds(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}
