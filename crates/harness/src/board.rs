use std::collections::HashSet;

use dealboard_core::{DealId, Stage};
use dealboard_engine::{Board, BoardConfig, DropOutcome, EngineError, EntityStore, HoverTarget};
use dealboard_storage::{LedgerStore, SqliteLedgerStore};

use crate::remote::InMemoryEntityStore;

pub const TEST_BOARD_KEY: &str = "pipeline:test";

/// A board mounted against an in-memory entity store.
pub struct TestBoard {
    pub board: Board<SqliteLedgerStore>,
    pub remote: InMemoryEntityStore,
}

impl TestBoard {
    /// Seed the remote with one deal per entry of `stages`, in order, and mount.
    pub async fn with_stages(
        stages: &[Stage],
    ) -> Result<(Self, Vec<DealId>), Box<dyn std::error::Error>> {
        let remote = InMemoryEntityStore::new();
        let mut ids = Vec::with_capacity(stages.len());
        for (n, stage) in stages.iter().enumerate() {
            ids.push(remote.create(&format!("deal {}", n + 1), *stage).await.id);
        }
        let deals = remote.list_deals().await?;
        let board = Board::open(&BoardConfig::new(TEST_BOARD_KEY), deals)?;
        Ok((Self { board, remote }, ids))
    }

    /// Mount a fresh board over `store` using the current remote contents.
    pub async fn remount(&mut self, store: SqliteLedgerStore) -> Result<(), Box<dyn std::error::Error>> {
        let deals = self.remote.list_deals().await?;
        self.board = Board::mount(&BoardConfig::new(TEST_BOARD_KEY), store, deals);
        Ok(())
    }

    pub fn ids(&self, stage: Stage) -> Vec<DealId> {
        self.board.ledger().sequence(stage).to_vec()
    }

    /// The persisted JSON record, exactly as stored.
    pub fn record(&self) -> Option<String> {
        self.board.store().read_record(TEST_BOARD_KEY).ok().flatten()
    }

    /// Pick up `deal_id`, hover `target`, release.
    pub fn drag(&mut self, deal_id: DealId, target: HoverTarget) -> DropOutcome {
        self.board.on_drag_start(deal_id);
        self.board.on_drag_over_target(target);
        self.board.on_drop()
    }

    /// Like `drag`, but also runs any resulting stage write to completion.
    pub async fn drag_and_settle(&mut self, deal_id: DealId, target: HoverTarget) -> DropOutcome {
        let outcome = self.drag(deal_id, target);
        if let DropOutcome::TransferStarted(pending) = &outcome {
            self.board.complete(&self.remote, pending.clone()).await;
        }
        outcome
    }

    pub async fn refetch(&mut self) -> Result<(), EngineError> {
        self.board.refetch(&self.remote).await.map(|_| ())
    }

    /// Every shadow deal sits in exactly one ledger sequence, the one
    /// matching its shadow stage, and nothing else is in the ledger.
    pub fn check_invariants(&self) -> Result<(), String> {
        let ledger = self.board.ledger();
        let mut seen = HashSet::new();
        for (stage, ids) in ledger.iter() {
            for id in ids {
                if !seen.insert(*id) {
                    return Err(format!("{id} appears more than once (again in {stage})"));
                }
            }
        }

        let deals = self.board.shadow_deals();
        for deal in &deals {
            match ledger.stage_of(deal.id) {
                Some(stage) if stage == deal.stage => {}
                Some(stage) => {
                    return Err(format!("{} is in {stage} but its stage is {}", deal.id, deal.stage));
                }
                None => return Err(format!("{} is missing from the ledger", deal.id)),
            }
        }
        if seen.len() != deals.len() {
            return Err(format!("ledger holds {} ids for {} deals", seen.len(), deals.len()));
        }
        Ok(())
    }
}
