//! SQLite-backed entity store
//!
//! Durable storage for the simulated ledger. Records live in a single
//! `address_records` table; scans follow rowid order, which upserts
//! preserve, so the ledger sees stable insertion order across restarts.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::amount::parse_amount;
use crate::storage::entity_store::{EntityStore, StorageError};
use crate::storage::models::{AddressRecord, RecordFilter};

const UPSERT_SQL: &str = "INSERT INTO address_records (address, owner, balance, updated_at)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT(address) DO UPDATE SET
         owner = excluded.owner,
         balance = excluded.balance,
         updated_at = excluded.updated_at";

/// Entity store persisted to a SQLite database file
pub struct SqliteEntityStore {
    conn: Mutex<Connection>,
}

impl SqliteEntityStore {
    /// Open (or create) the ledger database at `db_path`
    ///
    /// Parent directories are created as needed.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        log::info!("Opening ledger database: {}", db_path.display());

        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database (tests, throwaway ledgers)
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StorageError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS address_records (
                address TEXT PRIMARY KEY NOT NULL,
                owner TEXT NOT NULL,
                balance TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_address_records_owner ON address_records(owner)",
            [],
        )?;

        log::debug!("✓ Ledger schema initialized");

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<AddressRecord> {
    let address: String = row.get(0)?;
    let owner: String = row.get(1)?;
    let raw_balance: String = row.get(2)?;
    let balance = parse_amount(&raw_balance).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(AddressRecord {
        address,
        owner,
        balance,
    })
}

#[async_trait]
impl EntityStore for SqliteEntityStore {
    async fn get(&self, address: &str) -> Result<Option<AddressRecord>, StorageError> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                "SELECT address, owner, balance FROM address_records WHERE address = ?1",
                params![address],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    async fn set(&self, record: &AddressRecord) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute(
            UPSERT_SQL,
            params![
                &record.address,
                &record.owner,
                record.balance_string(),
                now_secs()
            ],
        )?;
        Ok(())
    }

    async fn set_many(&self, records: &[AddressRecord]) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let updated_at = now_secs();
        {
            let mut stmt = tx.prepare(UPSERT_SQL)?;
            for record in records {
                stmt.execute(params![
                    &record.address,
                    &record.owner,
                    record.balance_string(),
                    updated_at
                ])?;
            }
        }
        tx.commit()?;

        log::debug!("✓ Persisted {} record(s) in one transaction", records.len());

        Ok(())
    }

    async fn query(&self, filter: &RecordFilter) -> Result<Vec<AddressRecord>, StorageError> {
        let conn = self.lock()?;
        let records = match &filter.owner {
            Some(owner) => {
                let mut stmt = conn.prepare(
                    "SELECT address, owner, balance FROM address_records
                     WHERE owner = ?1 ORDER BY rowid",
                )?;
                let rows = stmt.query_map(params![owner], row_to_record)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn
                    .prepare("SELECT address, owner, balance FROM address_records ORDER BY rowid")?;
                let rows = stmt.query_map([], row_to_record)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(records)
    }
}
