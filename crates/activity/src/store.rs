//! SQLite-backed activity store

use crate::models::{ActivityRecord, ActivityStats};
use crate::{Result, StoreError};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS user_activity (
    user_id       INTEGER PRIMARY KEY,
    is_group      INTEGER NOT NULL DEFAULT 0,
    last_activity INTEGER NOT NULL,
    daily         INTEGER NOT NULL DEFAULT 0,
    weekly        INTEGER NOT NULL DEFAULT 0,
    monthly       INTEGER NOT NULL DEFAULT 0,
    yearly        INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_user_activity_last ON user_activity(last_activity);
";

/// Shared handle to the activity database
///
/// Calls block on SQLite; async callers should go through
/// `tokio::task::spawn_blocking`.
#[derive(Clone)]
pub struct ActivityStore {
    conn: Arc<Mutex<Connection>>,
}

impl ActivityStore {
    /// Open (or create) the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let store = Self::from_connection(conn)?;
        tracing::info!("Activity database opened at {}", path.display());
        Ok(store)
    }

    /// In-memory database, used by tests
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&mut conn)
    }

    /// Record activity for `user_id`
    ///
    /// Returns `true` when this was the first contact.
    pub fn record(&self, user_id: i64, is_group: bool, now: DateTime<Utc>) -> Result<bool> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let existing = tx
                .query_row(
                    "SELECT user_id, is_group, last_activity, daily, weekly, monthly, yearly
                     FROM user_activity WHERE user_id = ?1",
                    params![user_id],
                    raw_row,
                )
                .optional()?;

            let (record, created) = match existing {
                Some(raw) => {
                    let mut record = raw.into_record()?;
                    record.touch(is_group, now);
                    (record, false)
                }
                None => (ActivityRecord::new(user_id, is_group, now), true),
            };

            tx.execute(
                "INSERT INTO user_activity (user_id, is_group, last_activity, daily, weekly, monthly, yearly)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(user_id) DO UPDATE SET
                    is_group = excluded.is_group,
                    last_activity = excluded.last_activity,
                    daily = excluded.daily,
                    weekly = excluded.weekly,
                    monthly = excluded.monthly,
                    yearly = excluded.yearly",
                params![
                    record.user_id,
                    record.is_group,
                    record.last_activity.timestamp(),
                    record.daily,
                    record.weekly,
                    record.monthly,
                    record.yearly
                ],
            )?;
            tx.commit()?;

            if created {
                tracing::debug!("New activity record for {} (group: {})", user_id, is_group);
            }
            Ok(created)
        })
    }

    /// Fetch a single record
    pub fn get(&self, user_id: i64) -> Result<Option<ActivityRecord>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT user_id, is_group, last_activity, daily, weekly, monthly, yearly
                 FROM user_activity WHERE user_id = ?1",
                params![user_id],
                raw_row,
            )
            .optional()?
            .map(RawRecord::into_record)
            .transpose()
        })
    }

    /// Every recorded user and group id, each exactly once
    pub fn recipients(&self) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT user_id FROM user_activity ORDER BY user_id")?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<i64>, _>>()?;
            Ok(ids)
        })
    }

    /// Usage numbers relative to `now`
    pub fn stats(&self, now: DateTime<Utc>) -> Result<ActivityStats> {
        self.with_conn(|conn| {
            let active_since = |days: i64| -> Result<u64> {
                let since = (now - Duration::days(days)).timestamp();
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM user_activity WHERE last_activity > ?1",
                    params![since],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            };

            let (total_groups, total_records): (i64, i64) = conn.query_row(
                "SELECT COALESCE(SUM(is_group), 0), COUNT(*) FROM user_activity",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            Ok(ActivityStats {
                daily: active_since(1)?,
                weekly: active_since(7)?,
                monthly: active_since(30)?,
                yearly: active_since(365)?,
                total_groups: total_groups as u64,
                total_records: total_records as u64,
            })
        })
    }
}

/// Row as stored, before timestamp conversion
struct RawRecord {
    user_id: i64,
    is_group: bool,
    last_activity: i64,
    counters: [i64; 4],
}

impl RawRecord {
    fn into_record(self) -> Result<ActivityRecord> {
        let last_activity = Utc
            .timestamp_opt(self.last_activity, 0)
            .single()
            .ok_or(StoreError::InvalidTimestamp(self.user_id))?;
        let [daily, weekly, monthly, yearly] = self.counters;

        Ok(ActivityRecord {
            user_id: self.user_id,
            is_group: self.is_group,
            last_activity,
            daily,
            weekly,
            monthly,
            yearly,
        })
    }
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        user_id: row.get(0)?,
        is_group: row.get(1)?,
        last_activity: row.get(2)?,
        counters: [row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_first_contact_creates_record() {
        let store = ActivityStore::open_in_memory().unwrap();
        assert!(store.record(7, false, now()).unwrap());
        assert!(!store.record(7, false, now()).unwrap());

        let record = store.get(7).unwrap().unwrap();
        assert_eq!(record.daily, 1);
        assert_eq!(record.yearly, 1);
        assert_eq!(record.last_activity, now());
        assert!(!record.is_group);
    }

    #[test]
    fn test_missing_record() {
        let store = ActivityStore::open_in_memory().unwrap();
        assert!(store.get(1).unwrap().is_none());
    }

    #[test]
    fn test_recipients_are_unique() {
        let store = ActivityStore::open_in_memory().unwrap();
        store.record(3, false, now()).unwrap();
        store.record(-1001, true, now()).unwrap();
        store.record(3, false, now()).unwrap();
        store.record(1, false, now()).unwrap();

        assert_eq!(store.recipients().unwrap(), vec![-1001, 1, 3]);
    }

    #[test]
    fn test_stats_windows() {
        let store = ActivityStore::open_in_memory().unwrap();
        let now = now();

        store.record(1, false, now - Duration::hours(2)).unwrap();
        store.record(2, false, now - Duration::days(3)).unwrap();
        store.record(3, false, now - Duration::days(20)).unwrap();
        store.record(4, false, now - Duration::days(200)).unwrap();
        store.record(5, false, now - Duration::days(400)).unwrap();
        store.record(-100, true, now - Duration::hours(1)).unwrap();

        let stats = store.stats(now).unwrap();
        assert_eq!(
            stats,
            ActivityStats {
                daily: 2,
                weekly: 3,
                monthly: 4,
                yearly: 5,
                total_groups: 1,
                total_records: 6,
            }
        );
    }

    #[test]
    fn test_stats_empty() {
        let store = ActivityStore::open_in_memory().unwrap();
        assert_eq!(store.stats(now()).unwrap(), ActivityStats::default());
    }

    #[test]
    fn test_group_flag_persists() {
        let store = ActivityStore::open_in_memory().unwrap();
        store.record(-100, true, now()).unwrap();
        store.record(-100, false, now()).unwrap();
        assert!(store.get(-100).unwrap().unwrap().is_group);
    }

    #[test]
    fn test_open_file_database() {
        let path = std::env::temp_dir().join(format!("activity-test-{}.db", std::process::id()));
        {
            let store = ActivityStore::open(&path).unwrap();
            store.record(42, false, now()).unwrap();
        }
        let store = ActivityStore::open(&path).unwrap();
        assert_eq!(store.recipients().unwrap(), vec![42]);

        drop(store);
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
    }
}
