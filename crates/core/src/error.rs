use thiserror::Error;

use crate::ids::DealId;
use crate::stage::Stage;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("unknown stage: {0}")]
    UnknownStage(String),

    #[error("deal {deal_id} is not in stage {stage}")]
    NotInStage { deal_id: DealId, stage: Stage },

    #[error("anchor deal {anchor} is not in stage {stage}")]
    UnknownAnchor { anchor: DealId, stage: Stage },

    #[error("invalid data: {0}")]
    InvalidData(String),
}
