//! Core data model: identifiers, groups, rosters, game modes, match records
//!
//! Everything here is plain data. Group, roster and game-mode state is
//! looked up by id, never owned by a match record: deleting a game mode or
//! removing a member leaves old records in place and the read path simply
//! skips what it can no longer resolve.

use crate::engine::winners::ScoredTeam;

/// A unique 16-byte random identifier, rendered as hex for storage.
///
/// Server-assigned: generated when the record is created, never derived
/// from user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uid(pub [u8; 16]);

impl Uid {
    /// Generate a new random identifier.
    pub fn generate() -> Self {
        use rand::Rng;
        let mut bytes = [0u8; 16];
        rand::rng().fill(&mut bytes);
        Uid(bytes)
    }

    /// Parse a 32-character hex string back into an identifier.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 32 || !hex.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 16];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk).ok()?;
            bytes[i] = u8::from_str_radix(pair, 16).ok()?;
        }
        Some(Uid(bytes))
    }

    /// Convert to a hex string for storage and display.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Current unix timestamp in milliseconds.
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// A group of players sharing game modes and match history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub created_by: String,
}

/// One entry in a group's roster.
///
/// The roster is authoritative for who appears on the scoreboard; players
/// found in match history but missing from the roster are not shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterMember {
    pub player_id: String,
    pub display_name: Option<String>,
}

impl RosterMember {
    pub fn new(player_id: impl Into<String>, display_name: Option<&str>) -> Self {
        RosterMember {
            player_id: player_id.into(),
            display_name: display_name.map(|n| n.to_string()),
        }
    }

    /// Name shown on the scoreboard.
    ///
    /// Falls back to a truncated player id when no display name is set,
    /// and to "unknown" when even the id is empty.
    pub fn label(&self) -> String {
        match &self.display_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ if !self.player_id.is_empty() => self.player_id.chars().take(8).collect(),
            _ => "unknown".to_string(),
        }
    }
}

/// A named competition format scoped to one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameMode {
    pub id: String,
    pub group_id: String,
    pub name: String,
}

/// A finalized team inside a match record: ordinal, score, winner flag.
///
/// The winner flag is computed once when the record is created and never
/// recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamResult {
    pub number: u32,
    pub score: f64,
    pub is_winner: bool,
}

/// Assignment of one player to one team of a match.
///
/// Kept separate from [`TeamResult`] so a dangling team reference (a slot
/// naming a team with no stored score) stays representable; aggregation
/// skips such slots instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSlot {
    pub player_id: String,
    pub team_number: u32,
}

/// The immutable, persisted unit of match history.
///
/// Built once from a validated submission plus its winner annotations and
/// a server-assigned id and timestamp. Corrections require a new match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub id: Uid,
    pub game_mode_id: String,
    pub recorded_by: String,
    /// Unix timestamp (milliseconds) when the match was recorded.
    pub played_at: i64,
    pub teams: Vec<TeamResult>,
    pub players: Vec<PlayerSlot>,
}

impl MatchRecord {
    /// Build a record from winner-annotated teams, flattening each team's
    /// player list into per-player slots.
    pub fn new(
        id: Uid,
        game_mode_id: impl Into<String>,
        recorded_by: impl Into<String>,
        played_at: i64,
        scored: Vec<ScoredTeam>,
    ) -> Self {
        let mut teams = Vec::with_capacity(scored.len());
        let mut players = Vec::new();
        for team in scored {
            teams.push(TeamResult {
                number: team.number,
                score: team.score,
                is_winner: team.is_winner,
            });
            for player_id in team.players {
                players.push(PlayerSlot {
                    player_id,
                    team_number: team.number,
                });
            }
        }
        MatchRecord {
            id,
            game_mode_id: game_mode_id.into(),
            recorded_by: recorded_by.into(),
            played_at,
            teams,
            players,
        }
    }

    /// Look up a team by its ordinal.
    pub fn team(&self, number: u32) -> Option<&TeamResult> {
        self.teams.iter().find(|t| t.number == number)
    }

    /// Player ids assigned to the given team, in slot order.
    pub fn team_players(&self, number: u32) -> Vec<&str> {
        self.players
            .iter()
            .filter(|p| p.team_number == number)
            .map(|p| p.player_id.as_str())
            .collect()
    }

    /// Ordinals of the winning team(s). Never empty for a well-formed record.
    pub fn winning_teams(&self) -> Vec<u32> {
        self.teams
            .iter()
            .filter(|t| t.is_winner)
            .map(|t| t.number)
            .collect()
    }
}
