//! Service boundary: wires storage to the pure engine
//!
//! The caller identity travels in an explicit [`RequestContext`] handed to
//! each write, never in ambient session state.

use log::debug;
use thiserror::Error;

use crate::engine::standings::{aggregate, rank, PlayerStanding};
use crate::engine::validation::{validate, TeamSubmission, ValidationError};
use crate::engine::winners::determine_winners;
use crate::model::{now_millis, MatchRecord, Uid};
use crate::storage::{Storage, StorageError};

/// Errors surfaced at the service boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Who is performing a write. Request-scoped, passed explicitly.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: String,
}

impl RequestContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        RequestContext {
            user_id: user_id.into(),
        }
    }
}

/// The scoreboard service: match submission and standings reads over one
/// storage handle.
pub struct Scoreboard<'a> {
    storage: &'a mut Storage,
}

impl<'a> Scoreboard<'a> {
    pub fn new(storage: &'a mut Storage) -> Self {
        Scoreboard { storage }
    }

    /// Validate a submission, compute winners, and store the resulting
    /// match record. Returns the record as stored.
    ///
    /// Nothing is persisted when validation fails; duplicate submissions
    /// are not deduplicated and simply produce two records.
    pub fn submit_match(
        &mut self,
        ctx: &RequestContext,
        game_mode_id: &str,
        teams: &[TeamSubmission],
    ) -> Result<MatchRecord, ServiceError> {
        let normalized = validate(game_mode_id, teams)?;
        let scored = determine_winners(normalized);

        let record = MatchRecord::new(
            Uid::generate(),
            game_mode_id,
            &ctx.user_id,
            now_millis(),
            scored,
        );
        self.storage.record_match(&record)?;

        debug!(
            "user {} recorded match {} in mode {}",
            ctx.user_id,
            record.id.to_hex(),
            game_mode_id
        );
        Ok(record)
    }

    /// The ranked scoreboard for a group, recomputed from the current
    /// roster and full match history on every call.
    pub fn standings(&self, group_id: &str) -> Result<Vec<PlayerStanding>, ServiceError> {
        let roster = self.storage.roster(group_id)?;
        let history = self.storage.match_history(group_id)?;
        Ok(rank(aggregate(&roster, &history)))
    }

    /// A group's match records, newest first.
    pub fn recent_matches(&self, group_id: &str) -> Result<Vec<MatchRecord>, ServiceError> {
        Ok(self.storage.match_history(group_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Storage, String, String) {
        let storage = Storage::open_in_memory().unwrap();
        let group = storage.create_group("Office League", "alice").unwrap();
        storage
            .add_member(&group.id, "alice", Some("Alice"))
            .unwrap();
        storage.add_member(&group.id, "bob", Some("Bob")).unwrap();
        let mode = storage.create_game_mode(&group.id, "Ping Pong").unwrap();
        (storage, group.id, mode.id)
    }

    #[test]
    fn test_submit_then_read_standings() {
        let (mut storage, group_id, mode_id) = setup();
        let mut board = Scoreboard::new(&mut storage);
        let ctx = RequestContext::new("alice");

        let record = board
            .submit_match(
                &ctx,
                &mode_id,
                &[
                    TeamSubmission::new(1, &["alice"], "21"),
                    TeamSubmission::new(2, &["bob"], "15"),
                ],
            )
            .unwrap();
        assert_eq!(record.winning_teams(), vec![1]);
        assert_eq!(record.recorded_by, "alice");

        let standings = board.standings(&group_id).unwrap();
        assert_eq!(standings[0].display_name, "Alice");
        assert_eq!(standings[0].rank, 1);
        assert_eq!(standings[1].display_name, "Bob");
        assert_eq!(standings[1].rank, 2);
    }

    #[test]
    fn test_invalid_submission_persists_nothing() {
        let (mut storage, group_id, mode_id) = setup();
        let mut board = Scoreboard::new(&mut storage);
        let ctx = RequestContext::new("alice");

        let err = board
            .submit_match(&ctx, &mode_id, &[TeamSubmission::new(1, &["alice"], "21")])
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::NoTeams { got: 1 })
        ));
        assert!(board.recent_matches(&group_id).unwrap().is_empty());
    }

    #[test]
    fn test_submit_unknown_mode_fails() {
        let (mut storage, _group_id, _mode_id) = setup();
        let mut board = Scoreboard::new(&mut storage);
        let ctx = RequestContext::new("alice");

        let err = board
            .submit_match(
                &ctx,
                "missing",
                &[
                    TeamSubmission::new(1, &["alice"], "1"),
                    TeamSubmission::new(2, &["bob"], "0"),
                ],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Storage(StorageError::UnknownGameMode(_))
        ));
    }

    #[test]
    fn test_duplicate_submissions_both_count() {
        let (mut storage, group_id, mode_id) = setup();
        let mut board = Scoreboard::new(&mut storage);
        let ctx = RequestContext::new("alice");

        let teams = [
            TeamSubmission::new(1, &["alice"], "10"),
            TeamSubmission::new(2, &["bob"], "5"),
        ];
        board.submit_match(&ctx, &mode_id, &teams).unwrap();
        board.submit_match(&ctx, &mode_id, &teams).unwrap();

        assert_eq!(board.recent_matches(&group_id).unwrap().len(), 2);
        let standings = board.standings(&group_id).unwrap();
        assert_eq!(standings[0].wins, 2);
        assert_eq!(standings[0].total_points, 20.0);
    }
}
