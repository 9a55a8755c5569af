use dealboard_core::{CoreError, DealId, Stage};
use dealboard_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("deal not found: {0}")]
    DealNotFound(DealId),

    #[error("deal {deal_id} is in {actual}, not {expected}")]
    StageMismatch {
        deal_id: DealId,
        expected: Stage,
        actual: Stage,
    },

    #[error("deal {0} is already in {1}")]
    SameStage(DealId, Stage),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by the entity store. Carries no structure beyond a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RemoteError(pub String);

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
