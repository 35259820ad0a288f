//! Persistent storage using SQLite (rusqlite)
//!
//! The storage layer plays the collaborator roles the engine stays out of:
//! roster provider, match history provider, and match submission sink. It
//! also carries the group / game-mode bookkeeping around them.
//!
//! - OS-standard data directory location (via `directories` crate)
//! - SQLite database with schema versioning
//! - Normalized match layout: `matches`, `match_teams`, `match_players`
//! - Match rows are append-only; corrections are new matches

use std::path::PathBuf;

use directories::ProjectDirs;
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::model::{
    now_millis, GameMode, Group, MatchRecord, PlayerSlot, RosterMember, TeamResult, Uid,
};

/// Current schema version. Bump this when making schema changes.
/// Version history:
/// - v1: Initial schema with groups, members, game modes and match tables
const SCHEMA_VERSION: u32 = 1;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Could not determine data directory
    #[error("could not determine data directory")]
    NoDataDirectory,
    /// Failed to create data directory
    #[error("failed to create data directory: {0}")]
    CreateDirFailed(std::io::Error),
    /// Schema version mismatch (future version)
    #[error("database schema version {found} is newer than supported version {supported}")]
    FutureSchemaVersion { found: u32, supported: u32 },
    /// Migration failed
    #[error("migration from v{from} to v{to} failed: {reason}")]
    MigrationFailed { from: u32, to: u32, reason: String },
    /// Write referenced a group that does not exist
    #[error("unknown group: {0}")]
    UnknownGroup(String),
    /// Write referenced a game mode that does not exist
    #[error("unknown game mode: {0}")]
    UnknownGameMode(String),
}

/// The main storage handle for scoreboard data.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open or create the storage database.
    ///
    /// Uses OS-standard directories:
    /// - Linux: `$XDG_DATA_HOME/tally/` or `~/.local/share/tally/`
    /// - macOS: `~/Library/Application Support/tally/`
    pub fn open() -> Result<Self, StorageError> {
        let data_dir = Self::data_dir()?;

        // Ensure directory exists
        std::fs::create_dir_all(&data_dir).map_err(StorageError::CreateDirFailed)?;

        let db_path = data_dir.join("tally.db");
        debug!("opening database at {}", db_path.display());
        let conn = Connection::open(&db_path)?;

        let storage = Storage { conn };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Storage { conn };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Get the OS-standard data directory.
    pub fn data_dir() -> Result<PathBuf, StorageError> {
        ProjectDirs::from("", "", "tally")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(StorageError::NoDataDirectory)
    }

    // === Groups ===

    /// Create a new group and return it with its generated id.
    pub fn create_group(&self, name: &str, created_by: &str) -> Result<Group, StorageError> {
        let id = Uid::generate().to_hex();
        self.conn.execute(
            "INSERT INTO groups (id, name, created_by, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, name, created_by, now_millis()],
        )?;
        Ok(Group {
            id,
            name: name.to_string(),
            created_by: created_by.to_string(),
        })
    }

    /// Look up a group by id.
    pub fn group(&self, group_id: &str) -> Result<Option<Group>, StorageError> {
        let group = self
            .conn
            .query_row(
                "SELECT id, name, created_by FROM groups WHERE id = ?1",
                params![group_id],
                |row| {
                    Ok(Group {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_by: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(group)
    }

    /// Delete a group together with its roster and game modes.
    ///
    /// Match rows are left behind; history reads join through game modes,
    /// so orphaned matches drop out of every scoreboard.
    pub fn delete_group(&mut self, group_id: &str) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM group_members WHERE group_id = ?1",
            params![group_id],
        )?;
        tx.execute(
            "DELETE FROM game_modes WHERE group_id = ?1",
            params![group_id],
        )?;
        tx.execute("DELETE FROM groups WHERE id = ?1", params![group_id])?;
        tx.commit()?;
        Ok(())
    }

    // === Roster ===

    /// Add a player to a group's roster, or refresh their display name if
    /// they are already on it.
    pub fn add_member(
        &self,
        group_id: &str,
        player_id: &str,
        display_name: Option<&str>,
    ) -> Result<(), StorageError> {
        if !self.group_exists(group_id)? {
            return Err(StorageError::UnknownGroup(group_id.to_string()));
        }
        self.conn.execute(
            "INSERT INTO group_members (group_id, player_id, display_name, joined_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (group_id, player_id)
             DO UPDATE SET display_name = excluded.display_name",
            params![group_id, player_id, display_name, now_millis()],
        )?;
        Ok(())
    }

    /// Remove a player from a group's roster.
    ///
    /// Their past matches stay in history but no longer surface on the
    /// scoreboard (the roster is authoritative for who is shown).
    pub fn remove_member(&self, group_id: &str, player_id: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "DELETE FROM group_members WHERE group_id = ?1 AND player_id = ?2",
            params![group_id, player_id],
        )?;
        Ok(())
    }

    /// Update a player's display name in every group they belong to.
    pub fn set_display_name(&self, player_id: &str, name: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "UPDATE group_members SET display_name = ?2 WHERE player_id = ?1",
            params![player_id, name],
        )?;
        Ok(())
    }

    /// The full roster of a group, in join order.
    pub fn roster(&self, group_id: &str) -> Result<Vec<RosterMember>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT player_id, display_name FROM group_members
             WHERE group_id = ?1 ORDER BY joined_at, player_id",
        )?;
        let rows = stmt.query_map(params![group_id], |row| {
            Ok(RosterMember {
                player_id: row.get(0)?,
                display_name: row.get(1)?,
            })
        })?;

        let mut roster = Vec::new();
        for row in rows {
            roster.push(row?);
        }
        Ok(roster)
    }

    // === Game modes ===

    /// Create a game mode in a group and return it with its generated id.
    pub fn create_game_mode(&self, group_id: &str, name: &str) -> Result<GameMode, StorageError> {
        if !self.group_exists(group_id)? {
            return Err(StorageError::UnknownGroup(group_id.to_string()));
        }
        let id = Uid::generate().to_hex();
        self.conn.execute(
            "INSERT INTO game_modes (id, group_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, group_id, name, now_millis()],
        )?;
        Ok(GameMode {
            id,
            group_id: group_id.to_string(),
            name: name.to_string(),
        })
    }

    /// All game modes of a group, in creation order.
    pub fn game_modes(&self, group_id: &str) -> Result<Vec<GameMode>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, group_id, name FROM game_modes
             WHERE group_id = ?1 ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map(params![group_id], |row| {
            Ok(GameMode {
                id: row.get(0)?,
                group_id: row.get(1)?,
                name: row.get(2)?,
            })
        })?;

        let mut modes = Vec::new();
        for row in rows {
            modes.push(row?);
        }
        Ok(modes)
    }

    /// Delete a game mode. Its matches are orphaned, not removed, and stop
    /// appearing in history reads.
    pub fn delete_game_mode(&self, game_mode_id: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "DELETE FROM game_modes WHERE id = ?1",
            params![game_mode_id],
        )?;
        Ok(())
    }

    // === Matches ===

    /// Store a finalized match record across the three match tables in one
    /// transaction. The record is never updated afterwards.
    pub fn record_match(&mut self, record: &MatchRecord) -> Result<(), StorageError> {
        if !self.game_mode_exists(&record.game_mode_id)? {
            return Err(StorageError::UnknownGameMode(record.game_mode_id.clone()));
        }

        let match_id = record.id.to_hex();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO matches (id, game_mode_id, recorded_by, played_at) VALUES (?1, ?2, ?3, ?4)",
            params![match_id, record.game_mode_id, record.recorded_by, record.played_at],
        )?;
        for team in &record.teams {
            tx.execute(
                "INSERT INTO match_teams (match_id, team_number, score, is_winner) VALUES (?1, ?2, ?3, ?4)",
                params![match_id, team.number, team.score, team.is_winner],
            )?;
        }
        for slot in &record.players {
            tx.execute(
                "INSERT INTO match_players (match_id, team_number, player_id) VALUES (?1, ?2, ?3)",
                params![match_id, slot.team_number, slot.player_id],
            )?;
        }
        tx.commit()?;

        debug!(
            "recorded match {} ({} teams, {} players)",
            match_id,
            record.teams.len(),
            record.players.len()
        );
        Ok(())
    }

    /// All match records of a group, newest first.
    ///
    /// Joins through game modes, so matches whose mode was deleted are
    /// excluded. Rows with a malformed id are skipped rather than failing
    /// the read.
    pub fn match_history(&self, group_id: &str) -> Result<Vec<MatchRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT m.id, m.game_mode_id, m.recorded_by, m.played_at
             FROM matches m
             JOIN game_modes g ON g.id = m.game_mode_id
             WHERE g.group_id = ?1
             ORDER BY m.played_at DESC, m.id",
        )?;
        let rows = stmt.query_map(params![group_id], |row| {
            let id: String = row.get(0)?;
            let game_mode_id: String = row.get(1)?;
            let recorded_by: String = row.get(2)?;
            let played_at: i64 = row.get(3)?;
            Ok((id, game_mode_id, recorded_by, played_at))
        })?;

        let mut heads = Vec::new();
        for row in rows {
            heads.push(row?);
        }

        let mut team_stmt = self.conn.prepare(
            "SELECT team_number, score, is_winner FROM match_teams
             WHERE match_id = ?1 ORDER BY team_number",
        )?;
        let mut player_stmt = self.conn.prepare(
            "SELECT player_id, team_number FROM match_players
             WHERE match_id = ?1 ORDER BY rowid",
        )?;

        let mut records = Vec::new();
        for (hex, game_mode_id, recorded_by, played_at) in heads {
            let id = match Uid::from_hex(&hex) {
                Some(id) => id,
                None => {
                    warn!("skipping match with malformed id {:?}", hex);
                    continue;
                }
            };

            let team_rows = team_stmt.query_map(params![hex], |row| {
                Ok(TeamResult {
                    number: row.get(0)?,
                    score: row.get(1)?,
                    is_winner: row.get(2)?,
                })
            })?;
            let mut teams = Vec::new();
            for row in team_rows {
                teams.push(row?);
            }

            let player_rows = player_stmt.query_map(params![hex], |row| {
                Ok(PlayerSlot {
                    player_id: row.get(0)?,
                    team_number: row.get(1)?,
                })
            })?;
            let mut players = Vec::new();
            for row in player_rows {
                players.push(row?);
            }

            records.push(MatchRecord {
                id,
                game_mode_id,
                recorded_by,
                played_at,
                teams,
                players,
            });
        }
        Ok(records)
    }

    /// Total number of stored matches (orphaned ones included).
    pub fn match_count(&self) -> Result<i64, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?;
        Ok(count)
    }

    // Private helper methods

    fn group_exists(&self, group_id: &str) -> Result<bool, StorageError> {
        let exists: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM groups WHERE id = ?1",
            params![group_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn game_mode_exists(&self, game_mode_id: &str) -> Result<bool, StorageError> {
        let exists: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM game_modes WHERE id = ?1",
            params![game_mode_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn initialize_schema(&self) -> Result<(), StorageError> {
        // Check current schema version
        let current_version = self.get_schema_version()?;

        if current_version == 0 {
            // Fresh database, create schema
            self.create_schema_v1()?;
        } else if current_version < SCHEMA_VERSION {
            // Need to migrate
            self.migrate_schema(current_version)?;
        } else if current_version > SCHEMA_VERSION {
            // Database is from a newer version
            return Err(StorageError::FutureSchemaVersion {
                found: current_version,
                supported: SCHEMA_VERSION,
            });
        }

        Ok(())
    }

    fn get_schema_version(&self) -> Result<u32, StorageError> {
        // Check if meta table exists
        let table_exists: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='meta'",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        let version: u32 = self
            .conn
            .query_row("SELECT schema_version FROM meta LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        Ok(version)
    }

    fn create_schema_v1(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            r#"
            -- Meta table: stores the schema version
            CREATE TABLE meta (
                schema_version INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            );

            -- Groups of players sharing game modes and match history
            CREATE TABLE groups (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_by TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            -- Roster: who appears on a group's scoreboard
            CREATE TABLE group_members (
                group_id TEXT NOT NULL,
                player_id TEXT NOT NULL,
                display_name TEXT,
                joined_at INTEGER NOT NULL,
                PRIMARY KEY (group_id, player_id)
            );

            -- Competition formats, scoped to one group
            CREATE TABLE game_modes (
                id TEXT PRIMARY KEY,
                group_id TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            -- Match header rows; append-only
            CREATE TABLE matches (
                id TEXT PRIMARY KEY,
                game_mode_id TEXT NOT NULL,
                recorded_by TEXT NOT NULL,
                played_at INTEGER NOT NULL
            );

            -- Per-team final score and winner flag
            CREATE TABLE match_teams (
                match_id TEXT NOT NULL,
                team_number INTEGER NOT NULL,
                score REAL NOT NULL,
                is_winner INTEGER NOT NULL,
                PRIMARY KEY (match_id, team_number)
            );

            -- Player-to-team assignments; duplicate rows are legitimate
            CREATE TABLE match_players (
                match_id TEXT NOT NULL,
                team_number INTEGER NOT NULL,
                player_id TEXT NOT NULL
            );

            -- Index for group-scoped mode listings
            CREATE INDEX idx_game_modes_group ON game_modes (group_id);

            -- Indexes for history reads
            CREATE INDEX idx_matches_mode ON matches (game_mode_id);
            CREATE INDEX idx_matches_played ON matches (played_at);
            CREATE INDEX idx_match_players_match ON match_players (match_id);
            "#,
        )?;

        // Insert initial meta row
        self.conn.execute(
            "INSERT INTO meta (schema_version, created_at) VALUES (?1, ?2)",
            params![SCHEMA_VERSION, now_millis()],
        )?;

        Ok(())
    }

    fn migrate_schema(&self, from_version: u32) -> Result<(), StorageError> {
        // No migration paths yet; v1 is the only released schema.
        Err(StorageError::MigrationFailed {
            from: from_version,
            to: SCHEMA_VERSION,
            reason: format!("no migration path from version {}", from_version),
        })
    }
}
