//! Match engine: submission validation, winner determination, standings
//!
//! Everything in this module is a pure, synchronous computation over data
//! the caller has already fetched. The write path runs
//! [`validation::validate`] then [`winners::determine_winners`]; the read
//! path runs [`standings::aggregate`] then [`standings::rank`].

pub mod standings;
pub mod validation;
pub mod winners;
