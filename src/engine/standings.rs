//! Standings aggregation and ranking
//!
//! Folds a group's match history into per-player cumulative statistics,
//! then orders them and assigns dense competition ranks. Derived data only:
//! recomputed from roster + history on every read, never persisted.
//!
//! The aggregator never fails. Slots it cannot resolve (a team ordinal with
//! no stored score, a player no longer on the roster) are skipped so one
//! broken record cannot blank the whole scoreboard.

use std::collections::HashMap;

use log::{debug, warn};

use crate::model::{MatchRecord, RosterMember};

/// Per-player accumulator produced by [`aggregate`]. Unordered.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerTotals {
    pub player_id: String,
    pub display_name: String,
    pub wins: u32,
    pub total_points: f64,
}

/// One row of the ranked scoreboard.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStanding {
    pub player_id: String,
    pub display_name: String,
    pub wins: u32,
    pub total_points: f64,
    pub rank: u32,
}

/// Fold match history into per-player totals.
///
/// Every roster member gets an accumulator, so members with no matches
/// still appear (with zeros). For each player slot of each record: the
/// slot's team score is added to the player's points and, if the team won,
/// the win count goes up by one. A player occupying several slots on the
/// same team accumulates once per slot.
pub fn aggregate(roster: &[RosterMember], matches: &[MatchRecord]) -> Vec<PlayerTotals> {
    let mut totals: HashMap<&str, PlayerTotals> = roster
        .iter()
        .map(|member| {
            (
                member.player_id.as_str(),
                PlayerTotals {
                    player_id: member.player_id.clone(),
                    display_name: member.label(),
                    wins: 0,
                    total_points: 0.0,
                },
            )
        })
        .collect();

    for record in matches {
        for slot in &record.players {
            let team = match record.team(slot.team_number) {
                Some(team) => team,
                None => {
                    warn!(
                        "match {}: player {} assigned to team {} which has no score, skipping",
                        record.id.to_hex(),
                        slot.player_id,
                        slot.team_number
                    );
                    continue;
                }
            };

            let entry = match totals.get_mut(slot.player_id.as_str()) {
                Some(entry) => entry,
                None => {
                    // Not on the current roster: ex-members stay off the board.
                    debug!(
                        "match {}: player {} is not on the roster, skipping",
                        record.id.to_hex(),
                        slot.player_id
                    );
                    continue;
                }
            };

            entry.total_points += team.score;
            if team.is_winner {
                entry.wins += 1;
            }
        }
    }

    totals.into_values().collect()
}

/// Order totals and assign dense competition ranks.
///
/// Sort order: wins descending, then total points descending, then player
/// id ascending. The id is a tertiary key for deterministic output only;
/// rank ties are decided purely by `(wins, total_points)`.
///
/// Ranking walks the sorted sequence: the first row gets rank 1, a row
/// shares the previous row's rank exactly when both wins and points are
/// equal, and otherwise gets its 1-based position. Ties therefore produce
/// gaps ("1, 2, 2, 4"), never "1, 2, 2, 3".
pub fn rank(mut totals: Vec<PlayerTotals>) -> Vec<PlayerStanding> {
    totals.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then(
                b.total_points
                    .partial_cmp(&a.total_points)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then_with(|| a.player_id.cmp(&b.player_id))
    });

    let mut standings: Vec<PlayerStanding> = Vec::with_capacity(totals.len());
    let mut current_rank = 1;
    for (i, row) in totals.into_iter().enumerate() {
        if i > 0 {
            let prev = &standings[i - 1];
            if row.wins != prev.wins || row.total_points != prev.total_points {
                current_rank = i as u32 + 1;
            }
        }
        standings.push(PlayerStanding {
            player_id: row.player_id,
            display_name: row.display_name,
            wins: row.wins,
            total_points: row.total_points,
            rank: current_rank,
        });
    }
    standings
}
