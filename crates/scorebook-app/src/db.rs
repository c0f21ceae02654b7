// SQLite persistence for the roster and the batting event log.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};
use tracing::debug;

use scorebook_core::{
    BattingEvent, EventId, PendingEvent, PlateResult, Player, PolicyVersion, Rate, Registration,
    RunnerSituation,
};

use crate::legacy::LegacyRecord;

/// SQLite-backed store for players, batting records and key-value settings.
///
/// The `players` and `records` tables keep the column layout of the original
/// scorebook database, so an existing `softball.db` opens unchanged.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        // AUTOINCREMENT keeps ids from being reused after a delete.
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                number TEXT PRIMARY KEY,
                name   TEXT
            );

            CREATE TABLE IF NOT EXISTS records (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                number         TEXT,
                name           TEXT,
                date           TEXT,
                average        REAL,
                result         TEXT,
                has_runner     TEXT,
                rbi            INTEGER,
                policy_version TEXT
            );

            CREATE TABLE IF NOT EXISTS settings (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        // Migration: databases written by the original program lack
        // policy_version. ALTER TABLE fails with "duplicate column name" once
        // the column exists.
        conn.execute_batch("ALTER TABLE records ADD COLUMN policy_version TEXT;")
            .ok();

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// The roster, ordered by jersey number (text order).
    pub fn list_players(&self) -> Result<Vec<Player>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT number, name FROM players ORDER BY number ASC")
            .context("failed to prepare list_players query")?;

        let players = stmt
            .query_map([], |row| {
                Ok(Player {
                    number: row.get(0)?,
                    name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                })
            })
            .context("failed to query players")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map player rows")?;

        Ok(players)
    }

    /// Register a player. A number that is already taken leaves the roster
    /// untouched and returns [`Registration::AlreadyExists`].
    pub fn add_player(&self, player: &Player) -> Result<Registration> {
        let conn = self.conn();
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO players (number, name) VALUES (?1, ?2)",
                params![player.number, player.name],
            )
            .context("failed to insert player")?;

        Ok(if inserted == 0 {
            Registration::AlreadyExists
        } else {
            Registration::Added
        })
    }

    // ------------------------------------------------------------------
    // Batting records
    // ------------------------------------------------------------------

    /// All batting events in insertion order.
    ///
    /// Rows whose date cannot be parsed load with `date: None`; they still
    /// count toward summaries and running averages.
    pub fn list_events(&self) -> Result<Vec<BattingEvent>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, number, name, date, average, result, has_runner, rbi, policy_version
                 FROM records ORDER BY id",
            )
            .context("failed to prepare list_events query")?;

        let rows = stmt
            .query_map([], RawRecord::from_row)
            .context("failed to query records")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map record rows")?;

        Ok(rows.into_iter().map(RawRecord::into_event).collect())
    }

    /// Append a computed event and return it with its new id.
    pub fn append_event(&self, event: PendingEvent) -> Result<BattingEvent> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO records (number, name, date, average, result, has_runner, rbi, policy_version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event.player_number,
                event.player_name,
                event.date.to_string(),
                event.running_average.as_f64(),
                event.result.code(),
                event.has_runner.code(),
                event.rbi,
                event.policy_version.as_str(),
            ],
        )
        .context("failed to insert batting record")?;

        let id = EventId(conn.last_insert_rowid());
        Ok(event.into_event(id))
    }

    /// Delete one event by id. Returns `false` if no such event exists.
    pub fn delete_event(&self, id: EventId) -> Result<bool> {
        let conn = self.conn();
        let deleted = conn
            .execute("DELETE FROM records WHERE id = ?1", params![id.0])
            .context("failed to delete batting record")?;
        Ok(deleted > 0)
    }

    pub fn event_count(&self) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .context("failed to count records")?;
        Ok(count as usize)
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Key under which the active classification policy version is kept.
    const POLICY_VERSION_KEY: &'static str = "policy_version";

    /// Persist an arbitrary JSON value under `key`, replacing any previous value.
    pub fn save_setting(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str =
            serde_json::to_string(value).context("failed to serialize setting value")?;
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save setting")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`.
    pub fn load_setting(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM settings WHERE key = ?1")
            .context("failed to prepare load_setting query")?;

        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query settings")?;

        match rows.next() {
            Some(row_result) => {
                let json_str = row_result.context("failed to read setting row")?;
                let value = serde_json::from_str(&json_str)
                    .context("failed to deserialize setting value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Store the policy version this deployment runs under and return the
    /// one recorded by the previous run, if any.
    pub fn record_policy_version(&self, version: PolicyVersion) -> Result<Option<PolicyVersion>> {
        let previous: Option<PolicyVersion> = self
            .load_setting(Self::POLICY_VERSION_KEY)?
            .and_then(|v| v.as_str().and_then(|s| s.parse().ok()));
        self.save_setting(
            Self::POLICY_VERSION_KEY,
            &serde_json::Value::String(version.as_str().to_string()),
        )?;
        Ok(previous)
    }

    // ------------------------------------------------------------------
    // Legacy import
    // ------------------------------------------------------------------

    /// Import a flat-file roster and record log in a single transaction.
    ///
    /// Players whose number already exists are skipped. Records keep their
    /// stored averages and get fresh ids in file order. Returns the number
    /// of (players, records) inserted.
    pub fn import_legacy(
        &self,
        players: &[Player],
        records: &[LegacyRecord],
    ) -> Result<(usize, usize)> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin import transaction")?;

        let mut player_count = 0;
        for player in players {
            player_count += tx
                .execute(
                    "INSERT OR IGNORE INTO players (number, name) VALUES (?1, ?2)",
                    params![player.number, player.name],
                )
                .context("failed to import player")?;
        }

        for record in records {
            tx.execute(
                "INSERT INTO records (number, name, date, average, result, has_runner, rbi, policy_version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL)",
                params![
                    record.player_number,
                    record.player_name,
                    record.date,
                    record.running_average.as_f64(),
                    record.result.code(),
                    record.has_runner.code(),
                    record.rbi,
                ],
            )
            .context("failed to import batting record")?;
        }

        tx.commit().context("failed to commit legacy import")?;
        Ok((player_count, records.len()))
    }
}

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

/// A `records` row with loosely typed columns. Legacy files stored RBI and
/// averages as whatever the form submitted, so every column is read through
/// SQLite's dynamic [`Value`].
struct RawRecord {
    id: i64,
    number: Value,
    name: Value,
    date: Value,
    average: Value,
    result: Value,
    has_runner: Value,
    rbi: Value,
    policy_version: Value,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RawRecord {
            id: row.get(0)?,
            number: row.get(1)?,
            name: row.get(2)?,
            date: row.get(3)?,
            average: row.get(4)?,
            result: row.get(5)?,
            has_runner: row.get(6)?,
            rbi: row.get(7)?,
            policy_version: row.get(8)?,
        })
    }

    fn into_event(self) -> BattingEvent {
        let date_text = value_text(&self.date);
        let date = NaiveDate::parse_from_str(date_text.trim(), "%Y-%m-%d").ok();
        if date.is_none() {
            debug!(id = self.id, date = %date_text, "record has no parseable date");
        }

        BattingEvent {
            id: EventId(self.id),
            player_number: value_text(&self.number),
            player_name: value_text(&self.name),
            date,
            running_average: value_rate(&self.average),
            result: PlateResult::parse(&value_text(&self.result)),
            has_runner: RunnerSituation::parse(&value_text(&self.has_runner)),
            rbi: value_text(&self.rbi),
            policy_version: value_text(&self.policy_version).parse().ok(),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(n) => n.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => String::from_utf8_lossy(b).into_owned(),
    }
}

fn value_rate(value: &Value) -> Rate {
    match value {
        Value::Integer(n) => Rate::from_f64(*n as f64),
        Value::Real(f) => Rate::from_f64(*f),
        Value::Text(s) => s.parse().unwrap_or(Rate::ZERO),
        Value::Null | Value::Blob(_) => Rate::ZERO,
    }
}
