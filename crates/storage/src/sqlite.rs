use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::error::StorageError;
use crate::traits::LedgerStore;

/// Convert Vec<u8> to fixed-size array with proper error handling.
fn to_array<const N: usize>(v: Vec<u8>, label: &str) -> Result<[u8; N], StorageError> {
    v.try_into()
        .map_err(|_| StorageError::Serialization(format!("invalid {label} length")))
}

fn checksum(payload: &str) -> [u8; 32] {
    *blake3::hash(payload.as_bytes()).as_bytes()
}

pub struct SqliteLedgerStore {
    conn: Connection,
}

impl SqliteLedgerStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Millisecond timestamp of the last stored change for `board_key`.
    pub fn updated_at(&self, board_key: &str) -> Result<Option<i64>, StorageError> {
        let updated = self
            .conn
            .query_row(
                "SELECT updated_at FROM ledger_records WHERE board_key = ?1",
                rusqlite::params![board_key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated)
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn read_record(&self, board_key: &str) -> Result<Option<String>, StorageError> {
        let row: Option<(String, Vec<u8>)> = self
            .conn
            .query_row(
                "SELECT payload, checksum FROM ledger_records WHERE board_key = ?1",
                rusqlite::params![board_key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((payload, stored)) = row else {
            return Ok(None);
        };
        let stored = to_array::<32>(stored, "checksum")?;
        if stored != checksum(&payload) {
            return Err(StorageError::ChecksumMismatch {
                board_key: board_key.to_string(),
            });
        }
        Ok(Some(payload))
    }

    fn write_record(&mut self, board_key: &str, payload: &str) -> Result<(), StorageError> {
        // Identical payloads leave the row (and updated_at) untouched.
        self.conn.execute(
            "INSERT INTO ledger_records (board_key, payload, checksum) VALUES (?1, ?2, ?3)
             ON CONFLICT(board_key) DO UPDATE SET payload = excluded.payload, checksum = excluded.checksum, updated_at = excluded.updated_at
             WHERE ledger_records.checksum != excluded.checksum",
            rusqlite::params![board_key, payload, checksum(payload).as_slice()],
        )?;
        Ok(())
    }

    fn delete_record(&mut self, board_key: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "DELETE FROM ledger_records WHERE board_key = ?1",
            rusqlite::params![board_key],
        )?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteLedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLedgerStore")
            .field("path", &self.conn.path())
            .finish()
    }
}
