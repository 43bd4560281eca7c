use crate::error::Result;
use crate::record::DeliveryRecord;
use rusqlite::types::Type;
use rusqlite::{Connection, params};
use sha2::{Digest, Sha256};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

/// Append-only persistence for delivery records.
pub trait DeliveryStore {
    /// Append a record, returning its row id.
    fn append(&self, record: &DeliveryRecord, source_digest: Option<&str>) -> Result<i64>;

    /// Every record in insertion order.
    fn read_all(&self) -> Result<Vec<DeliveryRecord>>;

    fn count(&self) -> Result<usize>;
}

/// Fingerprint of a screenshot pair, used to spot re-submitted uploads.
pub fn source_digest(before_text: &str, after_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(before_text.as_bytes());
    hasher.update([0u8]);
    hasher.update(after_text.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub struct SqliteDeliveryStore {
    conn: Connection,
}

impl SqliteDeliveryStore {
    /// Open (or create) the delivery database at `db_path`.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS deliveries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                money REAL NOT NULL,
                expected_minutes INTEGER NOT NULL,
                actual_minutes INTEGER NOT NULL,
                miles REAL NOT NULL,
                created_at TEXT NOT NULL,
                source_digest TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_deliveries_source_digest ON deliveries(source_digest)",
            [],
        )?;

        info!("Database initialized successfully");
        Ok(Self { conn })
    }

    pub fn digest_exists(&self, digest: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM deliveries WHERE source_digest = ?1",
            params![digest],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<DeliveryRecord> {
        let created_at: String = row.get(4)?;
        let created_at = OffsetDateTime::parse(&created_at, &Rfc3339)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
        Ok(DeliveryRecord {
            money: row.get(0)?,
            expected_minutes: row.get(1)?,
            actual_minutes: row.get(2)?,
            miles: row.get(3)?,
            created_at,
        })
    }
}

impl DeliveryStore for SqliteDeliveryStore {
    fn append(&self, record: &DeliveryRecord, source_digest: Option<&str>) -> Result<i64> {
        if let Some(digest) = source_digest {
            if self.digest_exists(digest)? {
                warn!(digest = %digest, "Screenshot pair already recorded, appending anyway");
            }
        }

        let created_at = record
            .created_at
            .format(&Rfc3339)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        self.conn.execute(
            "INSERT INTO deliveries
                (money, expected_minutes, actual_minutes, miles, created_at, source_digest)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.money,
                record.expected_minutes,
                record.actual_minutes,
                record.miles,
                created_at,
                source_digest,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(id = id, money = record.money, "Delivery stored");
        Ok(id)
    }

    fn read_all(&self) -> Result<Vec<DeliveryRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT money, expected_minutes, actual_minutes, miles, created_at
             FROM deliveries
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], Self::row_to_record)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn count(&self) -> Result<usize> {
        let count: usize =
            self.conn
                .query_row("SELECT COUNT(*) FROM deliveries", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn record(money: f64, minute: u32) -> DeliveryRecord {
        DeliveryRecord {
            money,
            expected_minutes: 30,
            actual_minutes: minute,
            miles: 2.5,
            created_at: datetime!(2025-05-01 18:30:00 UTC),
        }
    }

    #[test]
    fn test_digest_generation() {
        let d1 = source_digest("before", "after");
        let d2 = source_digest("before", "after");
        let d3 = source_digest("beforeafter", "");

        assert_eq!(d1, d2);
        assert_ne!(d1, d3);
    }

    #[test]
    fn test_append_then_read_all_in_order() {
        let store = SqliteDeliveryStore::open_in_memory().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.read_all().unwrap().is_empty());

        let first = store.append(&record(8.5, 20), None).unwrap();
        let second = store.append(&record(12.0, 25), Some("abc")).unwrap();
        assert!(second > first);

        let history = store.read_all().unwrap();
        assert_eq!(history, vec![record(8.5, 20), record(12.0, 25)]);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_duplicate_digest_still_appends() {
        let store = SqliteDeliveryStore::open_in_memory().unwrap();
        let digest = source_digest("a", "b");
        assert!(!store.digest_exists(&digest).unwrap());

        store.append(&record(8.5, 20), Some(&digest)).unwrap();
        assert!(store.digest_exists(&digest).unwrap());
        store.append(&record(8.5, 20), Some(&digest)).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }
}
