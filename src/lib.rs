//! Tally - match recording and scoreboard aggregation for casual game groups
//!
//! Record who played, who scored what, and who won; read back a ranked
//! standings table. The engine is pure computation:
//!
//! - [`engine::validation`] checks and normalizes a submitted result
//! - [`engine::winners`] flags every team matching the top score
//! - [`engine::standings`] folds history into ranked per-player stats
//!
//! [`storage`] is the SQLite collaborator behind it (roster, game modes,
//! match records) and [`service`] ties the two together behind a
//! request-scoped context. Transport, authentication and presentation are
//! the caller's business.

pub mod engine;
pub mod model;
pub mod service;
pub mod storage;

pub use engine::standings::{aggregate, rank, PlayerStanding, PlayerTotals};
pub use engine::validation::{validate, NormalizedTeam, TeamSubmission, ValidationError};
pub use engine::winners::{determine_winners, ScoredTeam};
pub use model::{MatchRecord, RosterMember, Uid};
pub use service::{RequestContext, Scoreboard, ServiceError};
pub use storage::{Storage, StorageError};
