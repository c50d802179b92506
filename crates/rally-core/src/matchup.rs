//! Matches between two rosters.

use crate::RatingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One of the two sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    TeamA,
    TeamB,
}

impl Side {
    /// Returns the other side.
    #[inline]
    pub const fn opponent(self) -> Self {
        match self {
            Side::TeamA => Side::TeamB,
            Side::TeamB => Side::TeamA,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::TeamA => write!(f, "team A"),
            Side::TeamB => write!(f, "team B"),
        }
    }
}

/// Result of a match once a tie policy has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(Side),
    Draw,
}

/// A recorded match.
///
/// `played_at` is the match identity: a match is deleted by its timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub team_a: Vec<String>,
    pub team_b: Vec<String>,
    pub score_a: u32,
    pub score_b: u32,
    pub played_at: DateTime<Utc>,
}

impl Match {
    /// Builds a match after checking the rosters.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::EmptyTeam`] if either roster is empty and
    /// [`RatingError::DuplicateParticipant`] if an identifier appears twice,
    /// on the same side or on both.
    pub fn new(
        team_a: Vec<String>,
        team_b: Vec<String>,
        score_a: u32,
        score_b: u32,
        played_at: DateTime<Utc>,
    ) -> Result<Self, RatingError> {
        let m = Match {
            team_a,
            team_b,
            score_a,
            score_b,
            played_at,
        };
        m.validate()?;
        Ok(m)
    }

    /// Checks that both rosters are non-empty and disjoint.
    pub fn validate(&self) -> Result<(), RatingError> {
        if self.team_a.is_empty() {
            return Err(RatingError::EmptyTeam(Side::TeamA));
        }
        if self.team_b.is_empty() {
            return Err(RatingError::EmptyTeam(Side::TeamB));
        }
        let mut seen = HashSet::new();
        for id in self.participants() {
            if !seen.insert(id) {
                return Err(RatingError::DuplicateParticipant(id.to_string()));
            }
        }
        Ok(())
    }

    /// Returns the roster of `side`.
    pub fn roster(&self, side: Side) -> &[String] {
        match side {
            Side::TeamA => &self.team_a,
            Side::TeamB => &self.team_b,
        }
    }

    /// Returns the side `id` played on, if any.
    pub fn side_of(&self, id: &str) -> Option<Side> {
        if self.team_a.iter().any(|p| p == id) {
            Some(Side::TeamA)
        } else if self.team_b.iter().any(|p| p == id) {
            Some(Side::TeamB)
        } else {
            None
        }
    }

    /// Iterates team A then team B, each in roster order.
    pub fn participants(&self) -> impl Iterator<Item = &str> {
        self.team_a
            .iter()
            .chain(self.team_b.iter())
            .map(String::as_str)
    }

    /// Compares the scores without any tie policy.
    pub fn raw_outcome(&self) -> Outcome {
        use std::cmp::Ordering;
        match self.score_a.cmp(&self.score_b) {
            Ordering::Greater => Outcome::Winner(Side::TeamA),
            Ordering::Less => Outcome::Winner(Side::TeamB),
            Ordering::Equal => Outcome::Draw,
        }
    }
}
