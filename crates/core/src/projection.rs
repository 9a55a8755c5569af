use std::collections::{BTreeMap, HashMap, HashSet};

use crate::deal::Deal;
use crate::ids::DealId;
use crate::ledger::OrderLedger;
use crate::stage::Stage;

/// Group `deals` by their stage, in ledger order, for rendering.
///
/// Stage membership comes from each deal's own stage; the ledger only
/// contributes order. Deals the ledger does not place in their stage are
/// appended oldest first. Ledger ids with no matching deal are skipped.
pub fn ordered_deals_by_stage<'a>(
    ledger: &OrderLedger,
    deals: &'a [Deal],
) -> BTreeMap<Stage, Vec<&'a Deal>> {
    let by_id: HashMap<DealId, &Deal> = deals.iter().map(|deal| (deal.id, deal)).collect();
    let mut shown: HashSet<DealId> = HashSet::with_capacity(deals.len());

    let mut board: BTreeMap<Stage, Vec<&Deal>> = BTreeMap::new();
    for (stage, ids) in ledger.iter() {
        let column = board.entry(stage).or_default();
        for id in ids {
            if let Some(deal) = by_id.get(id) {
                if deal.stage == stage && shown.insert(*id) {
                    column.push(deal);
                }
            }
        }
    }

    let mut stragglers: Vec<&Deal> = deals.iter().filter(|deal| !shown.contains(&deal.id)).collect();
    stragglers.sort_by_key(|deal| deal.creation_key());
    for deal in stragglers {
        if shown.insert(deal.id) {
            board.entry(deal.stage).or_default().push(deal);
        }
    }

    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::reconcile;

    #[test]
    fn follows_ledger_order() {
        let d1 = Deal::new("a", 1, Stage::Lead, 1);
        let d2 = Deal::new("b", 2, Stage::Lead, 2);
        let deals = vec![d1.clone(), d2.clone()];
        let mut ledger = OrderLedger::empty();
        reconcile(&mut ledger, &deals);
        ledger.move_within_stage(Stage::Lead, d2.id, Some(d1.id)).unwrap();

        let board = ordered_deals_by_stage(&ledger, &deals);
        let lead: Vec<DealId> = board[&Stage::Lead].iter().map(|d| d.id).collect();
        assert_eq!(lead, vec![d2.id, d1.id]);
        assert!(board[&Stage::Won].is_empty());
    }

    #[test]
    fn shadow_stage_wins_over_ledger_membership() {
        let mut d1 = Deal::new("a", 1, Stage::Lead, 1);
        let mut ledger = OrderLedger::empty();
        reconcile(&mut ledger, std::slice::from_ref(&d1));

        d1.stage = Stage::Won;
        let deals = vec![d1.clone()];
        let board = ordered_deals_by_stage(&ledger, &deals);

        assert!(board[&Stage::Lead].is_empty());
        assert_eq!(board[&Stage::Won][0].id, d1.id);
    }

    #[test]
    fn skips_ids_without_deals() {
        let d1 = Deal::new("a", 1, Stage::Lead, 1);
        let mut ledger = OrderLedger::empty();
        reconcile(&mut ledger, std::slice::from_ref(&d1));

        let board = ordered_deals_by_stage(&ledger, &[]);
        assert!(board.values().all(Vec::is_empty));
        assert_eq!(ledger.len(), 1);
    }
}
