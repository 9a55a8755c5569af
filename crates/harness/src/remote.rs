use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dealboard_core::{Deal, DealId, Stage};
use dealboard_engine::{EntityStore, RemoteError};
use tokio::sync::RwLock;

const EPOCH_MS: i64 = 1_700_000_000_000;

/// One `update_deal_stage` call as seen by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageWrite {
    pub deal_id: DealId,
    pub stage: Stage,
    pub accepted: bool,
}

#[derive(Debug, Default)]
struct RemoteState {
    deals: Vec<Deal>,
    writes: Vec<StageWrite>,
    failing_writes: usize,
    failing_lists: usize,
}

/// Entity store double with a call log and scripted failures.
#[derive(Debug)]
pub struct InMemoryEntityStore {
    state: RwLock<RemoteState>,
    clock: AtomicI64,
}

impl Default for InMemoryEntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RemoteState::default()),
            clock: AtomicI64::new(EPOCH_MS),
        }
    }

    /// Create a deal whose creation time is strictly after every earlier one.
    pub async fn create(&self, title: &str, stage: Stage) -> Deal {
        let created_at = self.clock.fetch_add(1_000, Ordering::SeqCst);
        let deal = Deal::new(title, 10_000, stage, created_at);
        self.state.write().await.deals.push(deal.clone());
        deal
    }

    pub async fn insert(&self, deal: Deal) {
        self.state.write().await.deals.push(deal);
    }

    /// Delete a deal as another session would.
    pub async fn remove(&self, deal_id: DealId) -> bool {
        let mut state = self.state.write().await;
        let before = state.deals.len();
        state.deals.retain(|deal| deal.id != deal_id);
        state.deals.len() != before
    }

    /// Change a deal's stage as another session would.
    pub async fn set_stage(&self, deal_id: DealId, stage: Stage) -> bool {
        let mut state = self.state.write().await;
        match state.deals.iter_mut().find(|deal| deal.id == deal_id) {
            Some(deal) => {
                deal.stage = stage;
                true
            }
            None => false,
        }
    }

    pub async fn stage_of(&self, deal_id: DealId) -> Option<Stage> {
        let state = self.state.read().await;
        state.deals.iter().find(|deal| deal.id == deal_id).map(|deal| deal.stage)
    }

    pub async fn snapshot(&self) -> Vec<Deal> {
        self.state.read().await.deals.clone()
    }

    /// Make the next `n` stage writes fail.
    pub async fn fail_next_writes(&self, n: usize) {
        self.state.write().await.failing_writes = n;
    }

    /// Make the next `n` list calls fail.
    pub async fn fail_next_lists(&self, n: usize) {
        self.state.write().await.failing_lists = n;
    }

    /// Every stage write attempted so far, accepted or not.
    pub async fn writes(&self) -> Vec<StageWrite> {
        self.state.read().await.writes.clone()
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn list_deals(&self) -> Result<Vec<Deal>, RemoteError> {
        let mut state = self.state.write().await;
        if state.failing_lists > 0 {
            state.failing_lists -= 1;
            return Err(RemoteError::new("list unavailable"));
        }
        Ok(state.deals.clone())
    }

    async fn update_deal_stage(&self, deal_id: DealId, stage: Stage) -> Result<(), RemoteError> {
        let mut state = self.state.write().await;
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            state.writes.push(StageWrite { deal_id, stage, accepted: false });
            return Err(RemoteError::new("service unavailable"));
        }
        let accepted = match state.deals.iter_mut().find(|deal| deal.id == deal_id) {
            Some(deal) => {
                deal.stage = stage;
                true
            }
            None => false,
        };
        state.writes.push(StageWrite { deal_id, stage, accepted });
        if accepted {
            Ok(())
        } else {
            Err(RemoteError::new(format!("deal {deal_id} not found")))
        }
    }
}
