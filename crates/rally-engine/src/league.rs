//! League orchestration over an injected store.
//!
//! [`League`] reads working copies from its store, runs the rating, value
//! and balancing computations, and writes the results back. It holds no lock
//! across an operation: callers serialise writes that touch the same league.

use crate::balance::{Balance, TeamBalancer};
use crate::elo::{Direction, RatingUpdater};
use crate::standings::{self, FriendAndFoe};
use crate::value::ValueEstimator;
use chrono::{DateTime, Utc};
use rally_core::{
    LeagueStore, Match, Participant, RatingError, StoreError, DEFAULT_SEED_RATING,
};
use std::collections::HashSet;
use thiserror::Error;

/// Errors returned by league operations.
#[derive(Debug, Error)]
pub enum LeagueError {
    #[error(transparent)]
    Rating(#[from] RatingError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Tunables of a league.
#[derive(Debug, Clone, Copy)]
pub struct LeagueSettings {
    /// Rating given on first appearance.
    pub seed_rating: f64,
    pub updater: RatingUpdater,
    pub estimator: ValueEstimator,
    pub balancer: TeamBalancer,
}

impl Default for LeagueSettings {
    fn default() -> Self {
        LeagueSettings {
            seed_rating: DEFAULT_SEED_RATING,
            updater: RatingUpdater::default(),
            estimator: ValueEstimator::default(),
            balancer: TeamBalancer::default(),
        }
    }
}

/// Ratings, matches and squad building for one league scope.
pub struct League<S> {
    store: S,
    settings: LeagueSettings,
}

impl<S: LeagueStore> League<S> {
    pub fn new(store: S, settings: LeagueSettings) -> Self {
        League { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &LeagueSettings {
        &self.settings
    }

    /// Adds `id` with the seed rating, or returns the existing row.
    pub fn register(&self, id: &str) -> Result<Participant, LeagueError> {
        Ok(self.store.register(id, self.settings.seed_rating)?)
    }

    pub fn participant(&self, id: &str) -> Result<Participant, LeagueError> {
        self.fetch(id)
    }

    pub fn participants(&self) -> Result<Vec<Participant>, LeagueError> {
        Ok(self.store.list()?)
    }

    /// Records `m` and applies it to the ratings of its participants.
    ///
    /// Every participant is fetched before anything is written, so a missing
    /// one aborts the operation with no side effects. Persisting is not
    /// atomic across participants.
    pub fn record_match(&self, m: Match) -> Result<Vec<Participant>, LeagueError> {
        m.validate()?;
        let current = self.fetch_roster(&m)?;
        let updated = self
            .settings
            .updater
            .apply_match(&m, &current, Direction::Apply)?;

        self.store.record(&m)?;
        self.persist_all(&updated)?;
        tracing::info!(
            played_at = %m.played_at,
            score_a = m.score_a,
            score_b = m.score_b,
            participants = updated.len(),
            "match recorded"
        );
        Ok(updated)
    }

    /// Deletes the match played at `played_at` and reverses its effect.
    pub fn delete_match(&self, played_at: DateTime<Utc>) -> Result<Vec<Participant>, LeagueError> {
        let m = self.store.find(played_at)?;
        let current = self.fetch_roster(&m)?;
        let reversed = self
            .settings
            .updater
            .apply_match(&m, &current, Direction::Reverse)?;

        self.store.remove(played_at)?;
        self.persist_all(&reversed)?;
        tracing::info!(
            %played_at,
            policy = ?self.settings.updater.reversal_policy(),
            participants = reversed.len(),
            "match deleted"
        );
        Ok(reversed)
    }

    /// Current value of every listed participant, in roster order.
    ///
    /// Repeated identifiers are kept once, at their first position.
    pub fn values(&self, roster: &[String]) -> Result<Vec<(String, f64)>, LeagueError> {
        let mut seen = HashSet::new();
        let mut values = Vec::with_capacity(roster.len());
        for id in roster {
            if !seen.insert(id.as_str()) {
                continue;
            }
            let p = self.fetch(id)?;
            values.push((p.id.clone(), self.settings.estimator.value_of(&p)));
        }
        Ok(values)
    }

    /// Splits `roster` into two squads of similar value.
    ///
    /// # Errors
    ///
    /// [`RatingError::EmptyRoster`] for an empty roster,
    /// [`RatingError::ParticipantNotFound`] for an unknown identifier and
    /// [`RatingError::BalanceFailed`] if the squads do not hold every
    /// participant.
    pub fn balanced_teams(&self, roster: &[String]) -> Result<Balance, LeagueError> {
        let values = self.values(roster)?;
        if values.is_empty() {
            return Err(RatingError::EmptyRoster.into());
        }

        let balance = self.settings.balancer.balance(&values);
        if balance.placed() != values.len() {
            return Err(RatingError::BalanceFailed {
                expected: values.len(),
                placed: balance.placed(),
            }
            .into());
        }

        tracing::info!(
            players = values.len(),
            team1 = balance.team1.total,
            team2 = balance.team2.total,
            residual = balance.residual_diff,
            swaps = balance.swaps,
            "squads balanced"
        );
        Ok(balance)
    }

    /// League table: participants with at least one match, best first.
    pub fn ranking(&self) -> Result<Vec<Participant>, LeagueError> {
        let participants = self.store.list()?;
        Ok(standings::ranking(&participants)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Matches in chronological order, optionally only those of `participant`.
    pub fn matches(&self, participant: Option<&str>) -> Result<Vec<Match>, LeagueError> {
        Ok(self.store.matches_of(participant)?)
    }

    /// Best friend and worst foe of `id`, `None` before their first match.
    pub fn friend_and_foe(&self, id: &str) -> Result<Option<FriendAndFoe>, LeagueError> {
        self.fetch(id)?;
        let matches = self.store.matches_of(Some(id))?;
        Ok(standings::friend_and_foe(
            id,
            &matches,
            self.settings.updater.tie_policy(),
        ))
    }

    fn fetch(&self, id: &str) -> Result<Participant, LeagueError> {
        self.store.fetch(id).map_err(|err| match err {
            StoreError::ParticipantNotFound(id) => RatingError::ParticipantNotFound(id).into(),
            other => LeagueError::Store(other),
        })
    }

    fn fetch_roster(&self, m: &Match) -> Result<Vec<Participant>, LeagueError> {
        m.participants().map(|id| self.fetch(id)).collect()
    }

    fn persist_all(&self, participants: &[Participant]) -> Result<(), LeagueError> {
        for p in participants {
            self.store.persist(p)?;
        }
        Ok(())
    }
}
