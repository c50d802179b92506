//! Participants and their rating trajectories.

use crate::RatingError;
use serde::{Deserialize, Serialize};

/// Rating given to a participant on first appearance.
pub const DEFAULT_SEED_RATING: f64 = 100.0;

/// Chronological rating trajectory, oldest first.
///
/// A history always holds at least the seed rating, so [`current`](Self::current)
/// never fails. Updates produce a new history instead of mutating a shared one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct RatingHistory(Vec<f64>);

impl RatingHistory {
    /// Creates a single-entry history holding the seed rating.
    pub fn seeded(seed: f64) -> Self {
        RatingHistory(vec![seed])
    }

    /// Wraps a stored trajectory.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::EmptyHistory`] if `values` is empty.
    pub fn from_vec(values: Vec<f64>) -> Result<Self, RatingError> {
        if values.is_empty() {
            return Err(RatingError::EmptyHistory);
        }
        Ok(RatingHistory(values))
    }

    /// Returns the most recent rating.
    #[inline]
    pub fn current(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Returns the seed rating.
    #[inline]
    pub fn seed(&self) -> f64 {
        self.0[0]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for parity with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns a new history with `rating` appended.
    pub fn with_appended(&self, rating: f64) -> Self {
        let mut values = Vec::with_capacity(self.0.len() + 1);
        values.extend_from_slice(&self.0);
        values.push(rating);
        RatingHistory(values)
    }

    /// Returns a new history without the newest entry.
    ///
    /// Returns `None` when only the seed is left.
    pub fn truncated(&self) -> Option<Self> {
        if self.0.len() <= 1 {
            return None;
        }
        Some(RatingHistory(self.0[..self.0.len() - 1].to_vec()))
    }
}

impl TryFrom<Vec<f64>> for RatingHistory {
    type Error = RatingError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        RatingHistory::from_vec(values)
    }
}

impl From<RatingHistory> for Vec<f64> {
    fn from(history: RatingHistory) -> Self {
        history.0
    }
}

/// Rating state of one participant within a league scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Stable unique identifier (the player name in a league).
    pub id: String,
    /// Rating trajectory; the last entry is the current rating.
    pub history: RatingHistory,
    /// Number of recorded matches.
    pub match_count: u32,
    /// Number of recorded wins, never above `match_count`.
    pub win_count: u32,
}

impl Participant {
    /// Creates the row for a participant's first appearance.
    pub fn new(id: impl Into<String>, seed: f64) -> Self {
        Participant {
            id: id.into(),
            history: RatingHistory::seeded(seed),
            match_count: 0,
            win_count: 0,
        }
    }

    #[inline]
    pub fn current_rating(&self) -> f64 {
        self.history.current()
    }

    /// Fraction of recorded matches won, 0.0 with no matches.
    pub fn win_rate(&self) -> f64 {
        if self.match_count == 0 {
            0.0
        } else {
            self.win_count as f64 / self.match_count as f64
        }
    }

    /// Returns true if the history holds one entry per match plus the seed.
    ///
    /// Reversed matches that append a correction entry break this.
    pub fn is_consistent(&self) -> bool {
        self.history.len() == self.match_count as usize + 1
    }
}
