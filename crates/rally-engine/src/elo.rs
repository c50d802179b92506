//! Team Elo rating updates.
//!
//! Every participant moves by `k * (score - expected) * weight`, where the
//! expected score compares the two team totals and `weight` is the
//! participant's share of their own team total. Reversing a match subtracts
//! the same delta computed from the ratings as they stand at deletion time.

use rally_core::{Match, Outcome, Participant, RatingError, Side};
use std::collections::HashMap;

/// Default K-factor.
pub const K_FACTOR: f64 = 32.0;

/// Default logistic scale of the expected score.
pub const RATING_SCALE: f64 = 400.0;

/// Constants of the update rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingParams {
    pub k_factor: f64,
    pub scale: f64,
}

impl Default for RatingParams {
    fn default() -> Self {
        RatingParams {
            k_factor: K_FACTOR,
            scale: RATING_SCALE,
        }
    }
}

/// How a tied score is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiePolicy {
    /// Team A wins only with a strictly higher score, so a tie goes to team B.
    #[default]
    FavorTeamB,
    /// A tie scores 0.5 for everybody and counts as nobody's win.
    Draw,
}

/// How deleting a match rewrites rating histories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReversalPolicy {
    /// Append the corrected rating as a new entry. Histories keep growing and
    /// the corrected rating only approximates the pre-match one.
    #[default]
    AppendCorrection,
    /// Drop the newest entry. Exact when the deleted match is the
    /// participant's most recent one.
    Truncate,
}

/// Whether a match is being recorded or deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Apply,
    Reverse,
}

/// Expected score of a side rated `own` against a side rated `opponent`.
#[inline]
pub fn expected_score(own: f64, opponent: f64, scale: f64) -> f64 {
    1.0 / (1.0 + 10_f64.powf((opponent - own) / scale))
}

/// Rating change for one participant.
///
/// # Arguments
/// * `k` - K-factor
/// * `score` - Actual score (1.0 = win, 0.5 = draw, 0.0 = loss)
/// * `expected` - Expected score of the participant's team
/// * `weight` - Participant's share of their team's total rating
#[inline]
pub fn rating_delta(k: f64, score: f64, expected: f64, weight: f64) -> f64 {
    k * (score - expected) * weight
}

/// Applies or reverses the effect of a match on its participants.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatingUpdater {
    params: RatingParams,
    tie_policy: TiePolicy,
    reversal_policy: ReversalPolicy,
}

impl RatingUpdater {
    pub fn new(params: RatingParams) -> Self {
        RatingUpdater {
            params,
            ..Default::default()
        }
    }

    pub fn with_tie_policy(mut self, policy: TiePolicy) -> Self {
        self.tie_policy = policy;
        self
    }

    pub fn with_reversal_policy(mut self, policy: ReversalPolicy) -> Self {
        self.reversal_policy = policy;
        self
    }

    pub fn params(&self) -> RatingParams {
        self.params
    }

    pub fn tie_policy(&self) -> TiePolicy {
        self.tie_policy
    }

    pub fn reversal_policy(&self) -> ReversalPolicy {
        self.reversal_policy
    }

    /// Decides the outcome of `m` under the configured tie policy.
    pub fn outcome(&self, m: &Match) -> Outcome {
        outcome_with(m, self.tie_policy)
    }

    /// Computes the updated rating state of every participant of `m`.
    ///
    /// `participants` must hold the current state of every identifier on
    /// either roster; extra entries are ignored. The result lists team A then
    /// team B in roster order. The inputs are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::ParticipantNotFound`] for the first roster
    /// identifier missing from `participants`, and the roster errors of
    /// [`Match::validate`].
    pub fn apply_match(
        &self,
        m: &Match,
        participants: &[Participant],
        direction: Direction,
    ) -> Result<Vec<Participant>, RatingError> {
        m.validate()?;

        let by_id: HashMap<&str, &Participant> =
            participants.iter().map(|p| (p.id.as_str(), p)).collect();

        let mut roster: Vec<(Side, &Participant)> =
            Vec::with_capacity(m.team_a.len() + m.team_b.len());
        for side in [Side::TeamA, Side::TeamB] {
            for id in m.roster(side) {
                let p = by_id
                    .get(id.as_str())
                    .copied()
                    .ok_or_else(|| RatingError::ParticipantNotFound(id.clone()))?;
                roster.push((side, p));
            }
        }

        // Team totals always use the ratings before this update.
        let team_rating = |side: Side| -> f64 {
            roster
                .iter()
                .filter(|(s, _)| *s == side)
                .map(|(_, p)| p.current_rating())
                .sum()
        };
        let rating_a = team_rating(Side::TeamA);
        let rating_b = team_rating(Side::TeamB);
        let outcome = self.outcome(m);

        let updated = roster
            .into_iter()
            .map(|(side, p)| {
                let (own, opponent) = match side {
                    Side::TeamA => (rating_a, rating_b),
                    Side::TeamB => (rating_b, rating_a),
                };
                let (score, won) = match outcome {
                    Outcome::Winner(winner) if winner == side => (1.0, true),
                    Outcome::Winner(_) => (0.0, false),
                    Outcome::Draw => (0.5, false),
                };
                let expected = expected_score(own, opponent, self.params.scale);
                let weight = p.current_rating() / own;
                let delta = rating_delta(self.params.k_factor, score, expected, weight);
                let next = self.step(p, delta, won, direction);
                tracing::debug!(
                    participant = %p.id,
                    ?side,
                    ?direction,
                    expected,
                    weight,
                    delta,
                    rating = next.current_rating(),
                    "rating updated"
                );
                next
            })
            .collect();

        Ok(updated)
    }

    fn step(&self, p: &Participant, delta: f64, won: bool, direction: Direction) -> Participant {
        let current = p.current_rating();
        match direction {
            Direction::Apply => Participant {
                id: p.id.clone(),
                history: p.history.with_appended(current + delta),
                match_count: p.match_count.saturating_add(1),
                win_count: p.win_count.saturating_add(u32::from(won)),
            },
            Direction::Reverse => {
                let history = match self.reversal_policy {
                    ReversalPolicy::AppendCorrection => p.history.with_appended(current - delta),
                    ReversalPolicy::Truncate => {
                        p.history.truncated().unwrap_or_else(|| p.history.clone())
                    }
                };
                Participant {
                    id: p.id.clone(),
                    history,
                    match_count: p.match_count.saturating_sub(1),
                    win_count: p.win_count.saturating_sub(u32::from(won)),
                }
            }
        }
    }
}

/// Decides the outcome of `m` under `policy`.
pub fn outcome_with(m: &Match, policy: TiePolicy) -> Outcome {
    match (m.raw_outcome(), policy) {
        (Outcome::Draw, TiePolicy::FavorTeamB) => Outcome::Winner(Side::TeamB),
        (outcome, _) => outcome,
    }
}
