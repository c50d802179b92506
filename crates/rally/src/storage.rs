//! SQLite storage for participants and matches.
//!
//! Every row is scoped by league and sport, so one database file can hold
//! many independent leagues. Rating histories and rosters are stored as JSON
//! arrays.

use chrono::{DateTime, SecondsFormat, Utc};
use rally_core::{Match, MatchStore, Participant, RatingHistory, RatingStore, StoreError};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Thread-safe database connection pool.
pub type DbPool = Arc<Mutex<Connection>>;

/// Opens or creates the database at `path` and initializes the schema.
///
/// Use `:memory:` for an in-memory database.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or schema creation fails.
pub fn init_db<P: AsRef<Path>>(path: P) -> Result<DbPool, StoreError> {
    let conn = Connection::open(path).map_err(StoreError::backend)?;
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS participants (
            league TEXT NOT NULL,
            sport TEXT NOT NULL,
            id TEXT NOT NULL,
            history TEXT NOT NULL,
            match_count INTEGER NOT NULL DEFAULT 0,
            win_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (league, sport, id)
        );

        CREATE TABLE IF NOT EXISTS matches (
            id TEXT PRIMARY KEY,
            league TEXT NOT NULL,
            sport TEXT NOT NULL,
            team_a TEXT NOT NULL,
            team_b TEXT NOT NULL,
            score_a INTEGER NOT NULL,
            score_b INTEGER NOT NULL,
            played_at TEXT NOT NULL,
            UNIQUE (league, sport, played_at)
        );
        ",
    )
    .map_err(StoreError::backend)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Timestamps are stored with a fixed width so text order is time order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(StoreError::backend)
}

/// Participant row as read from SQLite, before decoding.
type ParticipantRow = (String, String, u32, u32);

/// Match row as read from SQLite, before decoding.
type MatchRow = (String, String, u32, u32, String);

/// SQLite-backed store for one league and sport.
///
/// Cloning is cheap and shares the underlying connection.
///
/// # Example
///
/// ```ignore
/// let db = init_db("data/rally.db")?;
/// let store = SqliteStore::new(db, "friday-night", "beachvolley");
/// store.register("ada", 100.0)?;
/// ```
#[derive(Clone)]
pub struct SqliteStore {
    db: DbPool,
    league: String,
    sport: String,
}

impl SqliteStore {
    pub fn new(db: DbPool, league: impl Into<String>, sport: impl Into<String>) -> Self {
        SqliteStore {
            db,
            league: league.into(),
            sport: sport.into(),
        }
    }

    /// Opens the database at `path` and scopes a store to it.
    pub fn open<P: AsRef<Path>>(
        path: P,
        league: impl Into<String>,
        sport: impl Into<String>,
    ) -> Result<Self, StoreError> {
        Ok(Self::new(init_db(path)?, league, sport))
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn decode_participant(row: ParticipantRow) -> Result<Participant, StoreError> {
        let (id, history, match_count, win_count) = row;
        let values: Vec<f64> = serde_json::from_str(&history).map_err(StoreError::backend)?;
        Ok(Participant {
            id,
            history: RatingHistory::from_vec(values).map_err(StoreError::backend)?,
            match_count,
            win_count,
        })
    }

    fn decode_match(row: MatchRow) -> Result<Match, StoreError> {
        let (team_a, team_b, score_a, score_b, played_at) = row;
        Ok(Match {
            team_a: serde_json::from_str(&team_a).map_err(StoreError::backend)?,
            team_b: serde_json::from_str(&team_b).map_err(StoreError::backend)?,
            score_a,
            score_b,
            played_at: parse_timestamp(&played_at)?,
        })
    }

    fn participant_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ParticipantRow> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }

    fn match_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MatchRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
        ))
    }
}

impl RatingStore for SqliteStore {
    fn fetch(&self, id: &str) -> Result<Participant, StoreError> {
        let row = self
            .conn()
            .query_row(
                "SELECT id, history, match_count, win_count FROM participants
                 WHERE league = ?1 AND sport = ?2 AND id = ?3",
                params![self.league, self.sport, id],
                Self::participant_row,
            )
            .optional()
            .map_err(StoreError::backend)?;
        match row {
            Some(row) => Self::decode_participant(row),
            None => Err(StoreError::ParticipantNotFound(id.to_string())),
        }
    }

    fn persist(&self, participant: &Participant) -> Result<(), StoreError> {
        let history =
            serde_json::to_string(&participant.history).map_err(StoreError::backend)?;
        let updated = self
            .conn()
            .execute(
                "UPDATE participants SET history = ?1, match_count = ?2, win_count = ?3
                 WHERE league = ?4 AND sport = ?5 AND id = ?6",
                params![
                    history,
                    participant.match_count,
                    participant.win_count,
                    self.league,
                    self.sport,
                    participant.id
                ],
            )
            .map_err(StoreError::backend)?;
        if updated == 0 {
            return Err(StoreError::ParticipantNotFound(participant.id.clone()));
        }
        tracing::debug!(
            participant = %participant.id,
            rating = participant.current_rating(),
            "participant persisted"
        );
        Ok(())
    }

    fn register(&self, id: &str, seed: f64) -> Result<Participant, StoreError> {
        let history =
            serde_json::to_string(&RatingHistory::seeded(seed)).map_err(StoreError::backend)?;
        let inserted = self
            .conn()
            .execute(
                "INSERT OR IGNORE INTO participants (league, sport, id, history)
                 VALUES (?1, ?2, ?3, ?4)",
                params![self.league, self.sport, id, history],
            )
            .map_err(StoreError::backend)?;
        if inserted > 0 {
            tracing::info!(participant = id, seed, "participant registered");
        }
        self.fetch(id)
    }

    fn list(&self) -> Result<Vec<Participant>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, history, match_count, win_count FROM participants
                 WHERE league = ?1 AND sport = ?2 ORDER BY id ASC",
            )
            .map_err(StoreError::backend)?;
        let rows = stmt
            .query_map(params![self.league, self.sport], Self::participant_row)
            .map_err(StoreError::backend)?;

        let mut participants = Vec::new();
        for row in rows {
            participants.push(Self::decode_participant(row.map_err(StoreError::backend)?)?);
        }
        Ok(participants)
    }
}

impl MatchStore for SqliteStore {
    fn record(&self, m: &Match) -> Result<(), StoreError> {
        let team_a = serde_json::to_string(&m.team_a).map_err(StoreError::backend)?;
        let team_b = serde_json::to_string(&m.team_b).map_err(StoreError::backend)?;
        let result = self.conn().execute(
            "INSERT INTO matches (id, league, sport, team_a, team_b, score_a, score_b, played_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                Uuid::new_v4().to_string(),
                self.league,
                self.sport,
                team_a,
                team_b,
                m.score_a,
                m.score_b,
                timestamp(m.played_at)
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StoreError::DuplicateMatch(m.played_at))
            }
            Err(e) => Err(StoreError::backend(e)),
        }
    }

    fn find(&self, played_at: DateTime<Utc>) -> Result<Match, StoreError> {
        let row = self
            .conn()
            .query_row(
                "SELECT team_a, team_b, score_a, score_b, played_at FROM matches
                 WHERE league = ?1 AND sport = ?2 AND played_at = ?3",
                params![self.league, self.sport, timestamp(played_at)],
                Self::match_row,
            )
            .optional()
            .map_err(StoreError::backend)?;
        match row {
            Some(row) => Self::decode_match(row),
            None => Err(StoreError::MatchNotFound(played_at)),
        }
    }

    fn remove(&self, played_at: DateTime<Utc>) -> Result<Match, StoreError> {
        let m = self.find(played_at)?;
        self.conn()
            .execute(
                "DELETE FROM matches WHERE league = ?1 AND sport = ?2 AND played_at = ?3",
                params![self.league, self.sport, timestamp(played_at)],
            )
            .map_err(StoreError::backend)?;
        Ok(m)
    }

    fn matches_of(&self, participant: Option<&str>) -> Result<Vec<Match>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT team_a, team_b, score_a, score_b, played_at FROM matches
                 WHERE league = ?1 AND sport = ?2
                   AND (?3 IS NULL
                        OR EXISTS (SELECT 1 FROM json_each(team_a) WHERE value = ?3)
                        OR EXISTS (SELECT 1 FROM json_each(team_b) WHERE value = ?3))
                 ORDER BY played_at ASC",
            )
            .map_err(StoreError::backend)?;
        let rows = stmt
            .query_map(params![self.league, self.sport, participant], Self::match_row)
            .map_err(StoreError::backend)?;

        let mut matches = Vec::new();
        for row in rows {
            matches.push(Self::decode_match(row.map_err(StoreError::backend)?)?);
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Helper function to create an in-memory store for testing.
    fn create_test_store() -> SqliteStore {
        SqliteStore::open(":memory:", "test-league", "beachvolley")
            .expect("Failed to create in-memory store")
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    fn game(a: &[&str], b: &[&str], hour: u32) -> Match {
        Match::new(
            a.iter().map(|s| s.to_string()).collect(),
            b.iter().map(|s| s.to_string()).collect(),
            21,
            17,
            at(hour),
        )
        .unwrap()
    }

    #[test]
    fn test_init_creates_tables() {
        let store = create_test_store();
        let conn = store.conn();
        for table in ["participants", "matches"] {
            let count: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "{table} table should exist");
        }
    }

    #[test]
    fn test_register_and_fetch() {
        let store = create_test_store();
        let ada = store.register("ada", 100.0).unwrap();
        assert_eq!(ada, Participant::new("ada", 100.0));
        assert_eq!(store.fetch("ada").unwrap(), ada);
    }

    #[test]
    fn test_register_is_idempotent() {
        let store = create_test_store();
        let mut ada = store.register("ada", 100.0).unwrap();
        ada.history = ada.history.with_appended(116.0);
        ada.match_count = 1;
        ada.win_count = 1;
        store.persist(&ada).unwrap();

        let again = store.register("ada", 100.0).unwrap();
        assert_eq!(again, ada);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_fetch_unknown_participant() {
        let store = create_test_store();
        assert!(matches!(
            store.fetch("ghost"),
            Err(StoreError::ParticipantNotFound(id)) if id == "ghost"
        ));
    }

    #[test]
    fn test_persist_unknown_participant() {
        let store = create_test_store();
        assert!(matches!(
            store.persist(&Participant::new("ghost", 100.0)),
            Err(StoreError::ParticipantNotFound(_))
        ));
    }

    #[test]
    fn test_history_roundtrip_keeps_precision() {
        let store = create_test_store();
        let mut ada = store.register("ada", 100.0).unwrap();
        ada.history = ada.history.with_appended(101.46949766851337);
        ada.match_count = 1;
        store.persist(&ada).unwrap();
        assert_eq!(
            store.fetch("ada").unwrap().history.as_slice(),
            &[100.0, 101.46949766851337]
        );
    }

    #[test]
    fn test_scopes_are_isolated() {
        let db = init_db(":memory:").unwrap();
        let friday = SqliteStore::new(db.clone(), "friday", "beachvolley");
        let sunday = SqliteStore::new(db, "sunday", "beachvolley");

        friday.register("ada", 100.0).unwrap();
        friday.record(&game(&["ada"], &["bo"], 18)).unwrap();

        assert!(sunday.fetch("ada").is_err());
        assert!(sunday.list().unwrap().is_empty());
        assert!(sunday.matches_of(None).unwrap().is_empty());
        // Same timestamp is free in another scope.
        sunday.record(&game(&["cy"], &["di"], 18)).unwrap();
    }

    #[test]
    fn test_list_ordered_by_id() {
        let store = create_test_store();
        for id in ["zoe", "ada", "max"] {
            store.register(id, 100.0).unwrap();
        }
        let ids: Vec<String> = store.list().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["ada", "max", "zoe"]);
    }

    #[test]
    fn test_record_and_find_match() {
        let store = create_test_store();
        let m = game(&["ada", "bo"], &["cy", "di"], 18);
        store.record(&m).unwrap();
        assert_eq!(store.find(m.played_at).unwrap(), m);
    }

    #[test]
    fn test_subsecond_timestamp_roundtrip() {
        let store = create_test_store();
        let mut m = game(&["ada"], &["bo"], 18);
        m.played_at = Utc.timestamp_opt(1_717_266_600, 123_456_789).unwrap();
        store.record(&m).unwrap();
        assert_eq!(store.find(m.played_at).unwrap().played_at, m.played_at);
    }

    #[test]
    fn test_duplicate_match_rejected() {
        let store = create_test_store();
        store.record(&game(&["ada"], &["bo"], 18)).unwrap();
        assert!(matches!(
            store.record(&game(&["cy"], &["di"], 18)),
            Err(StoreError::DuplicateMatch(_))
        ));
    }

    #[test]
    fn test_remove_match() {
        let store = create_test_store();
        let m = game(&["ada"], &["bo"], 18);
        store.record(&m).unwrap();
        assert_eq!(store.remove(m.played_at).unwrap(), m);
        assert!(matches!(
            store.find(m.played_at),
            Err(StoreError::MatchNotFound(_))
        ));
        assert!(matches!(
            store.remove(m.played_at),
            Err(StoreError::MatchNotFound(_))
        ));
    }

    #[test]
    fn test_matches_of_filters_and_orders() {
        let store = create_test_store();
        store.record(&game(&["ada", "bo"], &["cy"], 20)).unwrap();
        store.record(&game(&["cy"], &["ada"], 18)).unwrap();
        store.record(&game(&["bo"], &["di"], 19)).unwrap();

        let all = store.matches_of(None).unwrap();
        let hours: Vec<DateTime<Utc>> = all.iter().map(|m| m.played_at).collect();
        assert_eq!(hours, vec![at(18), at(19), at(20)]);

        let ada = store.matches_of(Some("ada")).unwrap();
        assert_eq!(ada.len(), 2);
        assert_eq!(ada[0].played_at, at(18));
        assert_eq!(ada[1].played_at, at(20));

        assert!(store.matches_of(Some("nobody")).unwrap().is_empty());
    }
}
