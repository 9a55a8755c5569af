use std::collections::{HashMap, HashSet};

use crate::deal::Deal;
use crate::ids::DealId;
use crate::ledger::OrderLedger;
use crate::stage::Stage;

/// What a reconcile pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Ids appended that the ledger did not hold anywhere.
    pub added: Vec<DealId>,
    /// Ids dropped because the authoritative list no longer has them.
    pub removed: Vec<DealId>,
    /// Ids that left one stage sequence and were appended to another.
    pub relocated: Vec<DealId>,
    /// Stray repeated occurrences that were dropped.
    pub deduplicated: usize,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.relocated.is_empty()
            && self.deduplicated == 0
    }
}

/// Align ledger membership with `deals` without disturbing surviving order.
///
/// Ids whose deal is gone, or whose deal now sits in another stage, leave
/// their sequence. Deals missing from their stage's sequence are appended
/// oldest first, ties broken by id. Running it twice with the same input
/// changes nothing the second time.
pub fn reconcile(ledger: &mut OrderLedger, deals: &[Deal]) -> ReconcileReport {
    let mut assigned: HashMap<DealId, &Deal> = HashMap::with_capacity(deals.len());
    for deal in deals {
        assigned.entry(deal.id).or_insert(deal);
    }

    let mut report = ReconcileReport::default();
    let mut placed: HashSet<DealId> = HashSet::with_capacity(deals.len());
    let mut dropped: Vec<DealId> = Vec::new();

    for stage in Stage::ALL {
        ledger.column_mut(stage).retain(|id| {
            let belongs = assigned.get(id).is_some_and(|deal| deal.stage == stage);
            if belongs && placed.insert(*id) {
                return true;
            }
            if belongs {
                report.deduplicated += 1;
            } else {
                dropped.push(*id);
            }
            false
        });
    }

    let mut missing: Vec<&Deal> = assigned
        .values()
        .copied()
        .filter(|deal| !placed.contains(&deal.id))
        .collect();
    missing.sort_by_key(|deal| deal.creation_key());

    let dropped_set: HashSet<DealId> = dropped.iter().copied().collect();
    for deal in missing {
        ledger.column_mut(deal.stage).push(deal.id);
        if dropped_set.contains(&deal.id) {
            report.relocated.push(deal.id);
        } else {
            report.added.push(deal.id);
        }
    }

    let mut seen_removed = HashSet::new();
    report.removed = dropped
        .into_iter()
        .filter(|id| !assigned.contains_key(id) && seen_removed.insert(*id))
        .collect();

    report
}
