//! Winner determination
//!
//! A team wins when its score equals the match-wide maximum. Exact numeric
//! equality decides ties, no epsilon: callers must not feed lossy float
//! representations for scores that are meant to be integral.

use super::validation::NormalizedTeam;

/// A normalized team annotated with its winner flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTeam {
    pub number: u32,
    pub players: Vec<String>,
    pub score: f64,
    pub is_winner: bool,
}

/// Annotate each team with `is_winner = score == max(scores)`.
///
/// Total function: since the maximum is drawn from the set itself, at least
/// one team always wins and multi-way ties are allowed. An empty input
/// (rejected upstream by validation) yields an empty output.
pub fn determine_winners(teams: Vec<NormalizedTeam>) -> Vec<ScoredTeam> {
    let max_score = teams
        .iter()
        .map(|t| t.score)
        .fold(f64::NEG_INFINITY, f64::max);

    teams
        .into_iter()
        .map(|t| ScoredTeam {
            is_winner: t.score == max_score,
            number: t.number,
            players: t.players,
            score: t.score,
        })
        .collect()
}
