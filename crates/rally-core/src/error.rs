//! Error kinds shared by the rating engine and its store collaborators.

use crate::Side;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by the rating, valuation and balancing computations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RatingError {
    #[error("participant not found: {0}")]
    ParticipantNotFound(String),

    #[error("insufficient history: {match_count} matches for a window of {window}")]
    InsufficientHistory { match_count: u32, window: usize },

    #[error("balance failed: placed {placed} of {expected} participants")]
    BalanceFailed { expected: usize, placed: usize },

    #[error("roster is empty")]
    EmptyRoster,

    #[error("{0} has no players")]
    EmptyTeam(Side),

    #[error("participant listed more than once: {0}")]
    DuplicateParticipant(String),

    #[error("rating history must hold at least the seed rating")]
    EmptyHistory,
}

/// Errors raised by a rating or match store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no rating state for participant: {0}")]
    ParticipantNotFound(String),

    #[error("no match played at {0}")]
    MatchNotFound(DateTime<Utc>),

    #[error("a match played at {0} is already recorded")]
    DuplicateMatch(DateTime<Utc>),

    /// The backing storage failed; the source carries the driver error.
    #[error("storage backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a driver error as a backend failure.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_error_messages() {
        assert_eq!(
            RatingError::ParticipantNotFound("ada".into()).to_string(),
            "participant not found: ada"
        );
        assert_eq!(
            RatingError::InsufficientHistory {
                match_count: 3,
                window: 3
            }
            .to_string(),
            "insufficient history: 3 matches for a window of 3"
        );
        assert_eq!(
            RatingError::BalanceFailed {
                expected: 6,
                placed: 5
            }
            .to_string(),
            "balance failed: placed 5 of 6 participants"
        );
        assert_eq!(
            RatingError::EmptyTeam(Side::TeamB).to_string(),
            "team B has no players"
        );
    }

    #[test]
    fn backend_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = StoreError::backend(io);
        assert_eq!(err.to_string(), "storage backend failure: disk gone");
        assert!(std::error::Error::source(&err).is_some());
    }
}
