use async_trait::async_trait;
use dealboard_core::{Deal, DealId, Stage};

use crate::error::RemoteError;

/// The hosted backend that owns deal records.
///
/// It knows nothing about manual order. Both calls may suspend on network I/O.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Every deal visible to the current user, unpaginated.
    async fn list_deals(&self) -> Result<Vec<Deal>, RemoteError>;

    /// Set a single deal's stage.
    async fn update_deal_stage(&self, deal_id: DealId, stage: Stage) -> Result<(), RemoteError>;
}
