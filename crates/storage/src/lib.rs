pub mod error;
pub mod ledger;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use error::StorageError;
pub use ledger::{load_ledger, reset_ledger, save_ledger};
pub use sqlite::SqliteLedgerStore;
pub use traits::*;
