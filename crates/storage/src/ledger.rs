//! Best-effort persistence of the order ledger.
//!
//! Manual order is cosmetic: a lost or corrupt record is rebuilt by the
//! reconciler from the entity store. None of these functions fail; problems
//! are logged and otherwise ignored.

use dealboard_core::OrderLedger;
use tracing::{debug, warn};

use crate::traits::LedgerStore;

/// Read the ledger for `board_key`, falling back to an empty ledger when the
/// record is missing, unreadable, or malformed.
pub fn load_ledger<S: LedgerStore + ?Sized>(store: &S, board_key: &str) -> OrderLedger {
    let raw = match store.read_record(board_key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(board = board_key, "no stored ledger, starting empty");
            return OrderLedger::empty();
        }
        Err(e) => {
            warn!(board = board_key, error = %e, "ledger record unreadable, starting empty");
            return OrderLedger::empty();
        }
    };

    match OrderLedger::from_json(&raw) {
        Ok(ledger) => ledger,
        Err(e) => {
            warn!(board = board_key, error = %e, "ledger record malformed, starting empty");
            OrderLedger::empty()
        }
    }
}

/// Persist the full ledger for `board_key`. Returns whether the write landed.
pub fn save_ledger<S: LedgerStore + ?Sized>(
    store: &mut S,
    board_key: &str,
    ledger: &OrderLedger,
) -> bool {
    let payload = match ledger.to_json() {
        Ok(payload) => payload,
        Err(e) => {
            warn!(board = board_key, error = %e, "failed to encode ledger");
            return false;
        }
    };
    match store.write_record(board_key, &payload) {
        Ok(()) => true,
        Err(e) => {
            warn!(board = board_key, error = %e, "failed to persist ledger");
            false
        }
    }
}

/// Drop the stored record for `board_key`. Returns whether the delete landed.
pub fn reset_ledger<S: LedgerStore + ?Sized>(store: &mut S, board_key: &str) -> bool {
    match store.delete_record(board_key) {
        Ok(()) => true,
        Err(e) => {
            warn!(board = board_key, error = %e, "failed to delete ledger record");
            false
        }
    }
}
