// src/cli/progress.rs — Terminal progress renderer for tournament rounds

use crate::core::types::ProgressEvent;

/// Build a progress callback that writes formatted output to stderr.
///
/// All progress output goes to stderr so stdout carries only the result.
/// Returns a closure suitable for `Tournament::with_progress()`.
pub fn terminal_progress() -> impl Fn(ProgressEvent) + Send + 'static {
    move |event| eprintln!("{}", format_event(&event))
}

/// One line per event.
pub fn format_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::PoolReady { theme, entities } => {
            format!("[pool] Generated list of {}: {}", theme, entities.join(", "))
        }
        ProgressEvent::RoundStarted {
            round,
            entrants,
            matches,
        } => format!(
            "[round {}] {} entrant(s), {} match(es)",
            round, entrants, matches
        ),
        ProgressEvent::MatchDecided {
            round,
            left,
            right,
            winner,
        } => format!("[round {}]   {} vs {} -> {}", round, left, right, winner),
        ProgressEvent::AutoAdvanced { round, entity } => {
            format!("[round {}]   {} advances (bye)", round, entity)
        }
        ProgressEvent::RoundCompleted { round, remaining } => {
            format!("[round {}] done, {} remaining", round, remaining)
        }
        ProgressEvent::Champion { entity, rounds } => {
            format!("[done] {} after {} round(s)", entity, rounds)
        }
    }
}
