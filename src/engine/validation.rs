//! Match submission validation
//!
//! Checks a proposed match result before it becomes a record:
//! - a game mode is selected
//! - at least 2 teams were submitted
//! - every team keeps at least one player after blank slots are dropped
//! - every score parses as a finite, non-negative number
//! - no player is listed on two different teams
//!
//! On success the submission is normalized: player lists trimmed of blank
//! entries, scores coerced to `f64`. Game-mode team-size constraints are
//! caller policy and are not enforced here.

use thiserror::Error;

/// Rejection reasons for a match submission.
///
/// All variants are recoverable: the submitter corrects the form and tries
/// again. Nothing is persisted on failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no game mode selected")]
    MissingGameMode,
    #[error("a match needs at least 2 teams, got {got}")]
    NoTeams { got: usize },
    #[error("team {team} has no players")]
    EmptyTeam { team: u32 },
    #[error("team {team} has an invalid score: {raw:?}")]
    InvalidScore { team: u32, raw: String },
    #[error("player {player_id} is listed on more than one team")]
    DuplicatePlayer { player_id: String },
}

/// A team as entered on the submission form: players may contain blank
/// slots and the score is still raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSubmission {
    pub number: u32,
    pub players: Vec<String>,
    pub score: String,
}

impl TeamSubmission {
    pub fn new(number: u32, players: &[&str], score: &str) -> Self {
        TeamSubmission {
            number,
            players: players.iter().map(|p| p.to_string()).collect(),
            score: score.to_string(),
        }
    }
}

/// A validated team: non-blank players, numeric score.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTeam {
    pub number: u32,
    pub players: Vec<String>,
    pub score: f64,
}

/// Validate and normalize a match submission. Pure function.
///
/// Checks run game mode first, then team count, then each team in order,
/// then cross-team duplicates, so the first problem on the form is the one
/// reported. A player repeated *within* one team is accepted; each
/// occurrence scores separately during aggregation.
pub fn validate(
    game_mode_id: &str,
    teams: &[TeamSubmission],
) -> Result<Vec<NormalizedTeam>, ValidationError> {
    if game_mode_id.trim().is_empty() {
        return Err(ValidationError::MissingGameMode);
    }

    if teams.len() < 2 {
        return Err(ValidationError::NoTeams { got: teams.len() });
    }

    let mut normalized = Vec::with_capacity(teams.len());
    for team in teams {
        let players: Vec<String> = team
            .players
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(|p| p.to_string())
            .collect();

        if players.is_empty() {
            return Err(ValidationError::EmptyTeam { team: team.number });
        }

        let score = parse_score(&team.score).ok_or_else(|| ValidationError::InvalidScore {
            team: team.number,
            raw: team.score.clone(),
        })?;

        normalized.push(NormalizedTeam {
            number: team.number,
            players,
            score,
        });
    }

    if let Some(player_id) = find_cross_team_duplicate(&normalized) {
        return Err(ValidationError::DuplicatePlayer { player_id });
    }

    Ok(normalized)
}

/// Parse a score field: finite and non-negative, or None.
fn parse_score(raw: &str) -> Option<f64> {
    let score: f64 = raw.trim().parse().ok()?;
    if score.is_finite() && score >= 0.0 {
        Some(score)
    } else {
        None
    }
}

/// First player assigned to two different teams, if any.
fn find_cross_team_duplicate(teams: &[NormalizedTeam]) -> Option<String> {
    use std::collections::HashMap;

    let mut seen: HashMap<&str, u32> = HashMap::new();
    for team in teams {
        for player in &team.players {
            match seen.get(player.as_str()) {
                Some(&other) if other != team.number => return Some(player.clone()),
                _ => {
                    seen.insert(player, team.number);
                }
            }
        }
    }
    None
}
