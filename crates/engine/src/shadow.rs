use std::collections::BTreeMap;

use dealboard_core::{Deal, DealId, Stage, TransitionId};

/// One optimistic stage change awaiting the entity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingStage {
    pub transition_id: TransitionId,
    pub from: Stage,
    pub to: Stage,
}

/// The last-known authoritative deal list with optimistic stage overrides
/// layered on top.
///
/// Each deal carries a stack of pending overrides in issue order; the top
/// one is what the board shows. Overrides for deals missing from the
/// authoritative list are kept but have no visible effect.
#[derive(Debug, Default)]
pub struct OptimisticShadow {
    authoritative: Vec<Deal>,
    pending: BTreeMap<DealId, Vec<PendingStage>>,
}

impl OptimisticShadow {
    pub fn new(authoritative: Vec<Deal>) -> Self {
        Self {
            authoritative,
            pending: BTreeMap::new(),
        }
    }

    pub fn authoritative(&self) -> &[Deal] {
        &self.authoritative
    }

    pub fn replace_authoritative(&mut self, deals: Vec<Deal>) {
        self.authoritative = deals;
    }

    /// Record that `deal_id` should read as `to` until the write settles.
    pub fn apply(&mut self, deal_id: DealId, from: Stage, to: Stage) -> TransitionId {
        let transition_id = TransitionId::new();
        self.pending.entry(deal_id).or_default().push(PendingStage {
            transition_id,
            from,
            to,
        });
        transition_id
    }

    /// The write for `transition_id` landed. Drops it and every older
    /// override for the same deal. Returns false if it was not pending.
    pub fn confirm(&mut self, deal_id: DealId, transition_id: TransitionId) -> bool {
        let Some(stack) = self.pending.get_mut(&deal_id) else {
            return false;
        };
        let Some(pos) = stack.iter().position(|p| p.transition_id == transition_id) else {
            return false;
        };
        stack.drain(..=pos);
        if stack.is_empty() {
            self.pending.remove(&deal_id);
        }
        true
    }

    /// The write for `transition_id` failed. Drops only that override, so the
    /// deal falls back to the previous override or the authoritative stage.
    pub fn revert(&mut self, deal_id: DealId, transition_id: TransitionId) -> bool {
        let Some(stack) = self.pending.get_mut(&deal_id) else {
            return false;
        };
        let before = stack.len();
        stack.retain(|p| p.transition_id != transition_id);
        let removed = stack.len() != before;
        if stack.is_empty() {
            self.pending.remove(&deal_id);
        }
        removed
    }

    /// Write a confirmed stage into the last-known authoritative copy.
    pub fn patch_authoritative(&mut self, deal_id: DealId, stage: Stage) -> bool {
        match self.authoritative.iter_mut().find(|deal| deal.id == deal_id) {
            Some(deal) => {
                deal.stage = stage;
                true
            }
            None => false,
        }
    }

    /// Stage the board should show for `deal_id`.
    pub fn stage_of(&self, deal_id: DealId) -> Option<Stage> {
        let deal = self.authoritative.iter().find(|deal| deal.id == deal_id)?;
        Some(self.effective_stage(deal))
    }

    pub fn deal(&self, deal_id: DealId) -> Option<Deal> {
        let deal = self.authoritative.iter().find(|deal| deal.id == deal_id)?;
        Some(self.overlaid(deal))
    }

    /// The full deal list as the board should render it.
    pub fn deals(&self) -> Vec<Deal> {
        self.authoritative.iter().map(|deal| self.overlaid(deal)).collect()
    }

    pub fn is_pending(&self, deal_id: DealId) -> bool {
        self.pending.contains_key(&deal_id)
    }

    /// Number of transitions still awaiting the entity store.
    pub fn pending_count(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    fn effective_stage(&self, deal: &Deal) -> Stage {
        self.pending
            .get(&deal.id)
            .and_then(|stack| stack.last())
            .map(|p| p.to)
            .unwrap_or(deal.stage)
    }

    fn overlaid(&self, deal: &Deal) -> Deal {
        let mut deal = deal.clone();
        deal.stage = self.effective_stage(&deal);
        deal
    }
}
