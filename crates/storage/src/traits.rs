use crate::error::StorageError;

/// Durable home for one JSON ledger record per board.
pub trait LedgerStore {
    /// The stored record for `board_key`, or `None` if there is none.
    fn read_record(&self, board_key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the record for `board_key`. Last writer wins.
    fn write_record(&mut self, board_key: &str, payload: &str) -> Result<(), StorageError>;

    /// Remove the record for `board_key`. Removing a missing record is not an error.
    fn delete_record(&mut self, board_key: &str) -> Result<(), StorageError>;
}
