pub mod deal;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod projection;
pub mod reconcile;
pub mod stage;

pub use deal::Deal;
pub use error::CoreError;
pub use ids::*;
pub use ledger::OrderLedger;
pub use projection::ordered_deals_by_stage;
pub use reconcile::{reconcile, ReconcileReport};
pub use stage::Stage;
