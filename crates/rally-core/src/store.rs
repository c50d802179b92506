//! Store collaborators consumed by the rating engine.
//!
//! The engine never owns storage. It receives a store through these traits,
//! reads working copies of participants, and hands updated copies back.

use crate::{Match, Participant, StoreError};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// Access to participant rating state.
pub trait RatingStore {
    /// Returns the rating state of `id`.
    fn fetch(&self, id: &str) -> Result<Participant, StoreError>;

    /// Writes back the rating state of one participant.
    fn persist(&self, participant: &Participant) -> Result<(), StoreError>;

    /// Creates `id` with a seeded history unless it already exists.
    ///
    /// Returns the stored row in both cases.
    fn register(&self, id: &str, seed: f64) -> Result<Participant, StoreError>;

    /// Returns every participant, ordered by identifier.
    fn list(&self) -> Result<Vec<Participant>, StoreError>;
}

/// Access to the match log.
pub trait MatchStore {
    /// Appends a match to the log.
    fn record(&self, m: &Match) -> Result<(), StoreError>;

    /// Returns the match played at `played_at`.
    fn find(&self, played_at: DateTime<Utc>) -> Result<Match, StoreError>;

    /// Removes and returns the match played at `played_at`.
    fn remove(&self, played_at: DateTime<Utc>) -> Result<Match, StoreError>;

    /// Returns matches in chronological order, only those involving
    /// `participant` when given.
    fn matches_of(&self, participant: Option<&str>) -> Result<Vec<Match>, StoreError>;
}

/// A store that serves both participants and matches.
pub trait LeagueStore: RatingStore + MatchStore {}

impl<T: RatingStore + MatchStore> LeagueStore for T {}

#[derive(Debug, Default)]
struct Tables {
    participants: BTreeMap<String, Participant>,
    matches: Vec<Match>,
}

/// In-memory store, useful for tests and one-shot computations.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `participants`.
    pub fn with_participants<I>(participants: I) -> Self
    where
        I: IntoIterator<Item = Participant>,
    {
        let store = Self::new();
        {
            let mut tables = store.lock();
            for p in participants {
                tables.participants.insert(p.id.clone(), p);
            }
        }
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RatingStore for MemoryStore {
    fn fetch(&self, id: &str) -> Result<Participant, StoreError> {
        self.lock()
            .participants
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::ParticipantNotFound(id.to_string()))
    }

    fn persist(&self, participant: &Participant) -> Result<(), StoreError> {
        let mut tables = self.lock();
        match tables.participants.get_mut(&participant.id) {
            Some(row) => {
                *row = participant.clone();
                Ok(())
            }
            None => Err(StoreError::ParticipantNotFound(participant.id.clone())),
        }
    }

    fn register(&self, id: &str, seed: f64) -> Result<Participant, StoreError> {
        let mut tables = self.lock();
        let row = tables
            .participants
            .entry(id.to_string())
            .or_insert_with(|| Participant::new(id, seed));
        Ok(row.clone())
    }

    fn list(&self) -> Result<Vec<Participant>, StoreError> {
        Ok(self.lock().participants.values().cloned().collect())
    }
}

impl MatchStore for MemoryStore {
    fn record(&self, m: &Match) -> Result<(), StoreError> {
        let mut tables = self.lock();
        if tables.matches.iter().any(|x| x.played_at == m.played_at) {
            return Err(StoreError::DuplicateMatch(m.played_at));
        }
        let pos = tables
            .matches
            .partition_point(|x| x.played_at < m.played_at);
        tables.matches.insert(pos, m.clone());
        Ok(())
    }

    fn find(&self, played_at: DateTime<Utc>) -> Result<Match, StoreError> {
        self.lock()
            .matches
            .iter()
            .find(|m| m.played_at == played_at)
            .cloned()
            .ok_or(StoreError::MatchNotFound(played_at))
    }

    fn remove(&self, played_at: DateTime<Utc>) -> Result<Match, StoreError> {
        let mut tables = self.lock();
        let pos = tables
            .matches
            .iter()
            .position(|m| m.played_at == played_at)
            .ok_or(StoreError::MatchNotFound(played_at))?;
        Ok(tables.matches.remove(pos))
    }

    fn matches_of(&self, participant: Option<&str>) -> Result<Vec<Match>, StoreError> {
        let tables = self.lock();
        let matches = match participant {
            None => tables.matches.clone(),
            Some(id) => tables
                .matches
                .iter()
                .filter(|m| m.side_of(id).is_some())
                .cloned()
                .collect(),
        };
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn game(a: &[&str], b: &[&str], hour: u32) -> Match {
        Match::new(
            a.iter().map(|s| s.to_string()).collect(),
            b.iter().map(|s| s.to_string()).collect(),
            21,
            18,
            Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn register_is_idempotent() {
        let store = MemoryStore::new();
        let first = store.register("ada", 100.0).unwrap();
        assert_eq!(first.current_rating(), 100.0);

        let mut changed = first.clone();
        changed.history = changed.history.with_appended(116.0);
        changed.match_count = 1;
        store.persist(&changed).unwrap();

        let again = store.register("ada", 100.0).unwrap();
        assert_eq!(again, changed);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn fetch_unknown_participant() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.fetch("ghost"),
            Err(StoreError::ParticipantNotFound(id)) if id == "ghost"
        ));
        assert!(store.persist(&Participant::new("ghost", 100.0)).is_err());
    }

    #[test]
    fn list_is_ordered_by_id() {
        let store = MemoryStore::with_participants(vec![
            Participant::new("zoe", 100.0),
            Participant::new("ada", 100.0),
            Participant::new("max", 100.0),
        ]);
        let ids: Vec<String> = store.list().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["ada", "max", "zoe"]);
    }

    #[test]
    fn matches_are_chronological() {
        let store = MemoryStore::new();
        store.record(&game(&["ada"], &["bo"], 20)).unwrap();
        store.record(&game(&["ada"], &["cy"], 18)).unwrap();
        store.record(&game(&["bo"], &["cy"], 19)).unwrap();

        let hours: Vec<u32> = store
            .matches_of(None)
            .unwrap()
            .iter()
            .map(|m| chrono::Timelike::hour(&m.played_at))
            .collect();
        assert_eq!(hours, vec![18, 19, 20]);

        let with_ada = store.matches_of(Some("ada")).unwrap();
        assert_eq!(with_ada.len(), 2);
    }

    #[test]
    fn duplicate_timestamp_rejected() {
        let store = MemoryStore::new();
        store.record(&game(&["ada"], &["bo"], 20)).unwrap();
        assert!(matches!(
            store.record(&game(&["cy"], &["di"], 20)),
            Err(StoreError::DuplicateMatch(_))
        ));
    }

    #[test]
    fn remove_returns_match() {
        let store = MemoryStore::new();
        let m = game(&["ada"], &["bo"], 20);
        store.record(&m).unwrap();
        assert_eq!(store.find(m.played_at).unwrap(), m);
        assert_eq!(store.remove(m.played_at).unwrap(), m);
        assert!(matches!(
            store.remove(m.played_at),
            Err(StoreError::MatchNotFound(_))
        ));
    }
}
