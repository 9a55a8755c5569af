use std::collections::HashSet;

use dealboard_core::{reconcile, Deal, DealId, OrderLedger, Stage};
use dealboard_engine::{dispatch, DropOutcome, EntityStore, HoverTarget, PendingTransition};
use dealboard_harness::TestBoard;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn random_stage(rng: &mut StdRng) -> Stage {
    Stage::ALL[rng.gen_range(0..Stage::ALL.len())]
}

fn random_target(rng: &mut StdRng, t: &TestBoard) -> HoverTarget {
    let stage = random_stage(rng);
    match t.ids(stage).choose(rng) {
        Some(anchor) if rng.gen_bool(0.6) => HoverTarget::Card { stage, deal_id: *anchor },
        _ => HoverTarget::Column(stage),
    }
}

fn all_ids(ledger: &OrderLedger) -> Vec<DealId> {
    ledger.iter().flat_map(|(_, ids)| ids.iter().copied()).collect()
}

// ============================================================================
// Gesture sequences against a live board
// ============================================================================

async fn run_gestures(seed: u64, steps: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let stages: Vec<Stage> = (0..8).map(|_| random_stage(&mut rng)).collect();
    let (mut t, _) = TestBoard::with_stages(&stages).await?;
    let mut in_flight: Vec<PendingTransition> = Vec::new();

    for step in 0..steps {
        match rng.gen_range(0..10) {
            0..=3 => {
                let ids = all_ids(t.board.ledger());
                let Some(deal_id) = ids.choose(&mut rng).copied() else {
                    continue;
                };
                let target = random_target(&mut rng, &t);
                if let DropOutcome::TransferStarted(pending) = t.drag(deal_id, target) {
                    in_flight.push(pending);
                }
            }
            4 => {
                let ids = all_ids(t.board.ledger());
                if let Some(deal_id) = ids.choose(&mut rng).copied() {
                    t.board.on_drag_start(deal_id);
                    let target = random_target(&mut rng, &t);
                    t.board.on_drag_over_target(target);
                    t.board.on_drag_cancel();
                }
            }
            5 | 6 => {
                if in_flight.is_empty() {
                    continue;
                }
                let pending = in_flight.swap_remove(rng.gen_range(0..in_flight.len()));
                if rng.gen_bool(0.3) {
                    t.remote.fail_next_writes(1).await;
                }
                if rng.gen_bool(0.2) {
                    t.remote.fail_next_lists(1).await;
                }
                let settled = dispatch(&t.remote, pending).await;
                t.board.settle(settled);
            }
            7 => {
                let snapshot = t.remote.snapshot().await;
                if let Some(deal) = snapshot.choose(&mut rng) {
                    let stage = random_stage(&mut rng);
                    t.remote.set_stage(deal.id, stage).await;
                }
            }
            8 => {
                if rng.gen_bool(0.5) {
                    let stage = random_stage(&mut rng);
                    t.remote.create(&format!("extra {step}"), stage).await;
                } else {
                    let snapshot = t.remote.snapshot().await;
                    if let Some(deal) = snapshot.choose(&mut rng) {
                        t.remote.remove(deal.id).await;
                    }
                }
            }
            _ => {
                if rng.gen_bool(0.2) {
                    t.remote.fail_next_lists(1).await;
                }
                let _ = t.refetch().await;
            }
        }

        t.check_invariants()
            .map_err(|e| format!("seed {seed}, step {step}: {e}"))?;
    }

    // Drain everything and converge on the remote's view.
    t.remote.fail_next_lists(0).await;
    for pending in in_flight.drain(..) {
        t.board.complete(&t.remote, pending).await;
        t.check_invariants()?;
    }
    t.refetch().await?;
    t.check_invariants()?;

    assert_eq!(t.board.pending_transitions(), 0);
    let remote = t.remote.list_deals().await?;
    assert_eq!(t.board.ledger().len(), remote.len());
    for deal in &remote {
        assert_eq!(t.board.ledger().stage_of(deal.id), Some(deal.stage), "seed {seed}");
    }
    Ok(())
}

#[tokio::test]
async fn random_gestures_keep_ledger_consistent() -> Result<(), Box<dyn std::error::Error>> {
    for seed in 0..24 {
        run_gestures(seed, 120).await?;
    }
    Ok(())
}

#[tokio::test]
async fn rollback_restores_pre_drag_membership() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..30 {
        let stages: Vec<Stage> = (0..6).map(|_| random_stage(&mut rng)).collect();
        let (mut t, ids) = TestBoard::with_stages(&stages).await?;
        let deal_id = *ids.choose(&mut rng).ok_or("no deals")?;
        let origin = t.board.stage_of(deal_id).ok_or("missing deal")?;
        let mut to = random_stage(&mut rng);
        while to == origin {
            to = random_stage(&mut rng);
        }
        let others_before: Vec<Vec<DealId>> = Stage::ALL
            .iter()
            .map(|stage| t.ids(*stage).into_iter().filter(|id| *id != deal_id).collect())
            .collect();

        t.remote.fail_next_writes(1).await;
        t.drag_and_settle(deal_id, HoverTarget::Column(to)).await;

        assert_eq!(t.board.stage_of(deal_id), Some(origin));
        assert_eq!(t.board.ledger().stage_of(deal_id), Some(origin));
        let others_after: Vec<Vec<DealId>> = Stage::ALL
            .iter()
            .map(|stage| t.ids(*stage).into_iter().filter(|id| *id != deal_id).collect())
            .collect();
        assert_eq!(others_before, others_after);
        t.check_invariants()?;
    }
    Ok(())
}

// ============================================================================
// Reconciler properties
// ============================================================================

fn random_deals(rng: &mut StdRng, n: usize) -> Vec<Deal> {
    (0..n)
        .map(|i| Deal::new(format!("d{i}"), 100, random_stage(rng), rng.gen_range(0..50)))
        .collect()
}

/// Shuffle every stage sequence through the public move API.
fn scramble(rng: &mut StdRng, ledger: &mut OrderLedger) {
    for stage in Stage::ALL {
        let ids = ledger.sequence(stage).to_vec();
        for _ in 0..ids.len() {
            let (Some(id), anchor) = (ids.choose(rng).copied(), ids.choose(rng).copied()) else {
                continue;
            };
            let before = if rng.gen_bool(0.2) { None } else { anchor };
            let _ = ledger.move_within_stage(stage, id, before);
        }
    }
}

#[test]
fn reconcile_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..50 {
        let deals = random_deals(&mut rng, 20);
        let mut ledger = OrderLedger::empty();
        reconcile(&mut ledger, &deals);
        scramble(&mut rng, &mut ledger);

        let mut changed = deals.clone();
        changed.retain(|_| rng.gen_bool(0.8));
        for deal in changed.iter_mut() {
            if rng.gen_bool(0.2) {
                deal.stage = random_stage(&mut rng);
            }
        }
        changed.extend(random_deals(&mut rng, 4));

        reconcile(&mut ledger, &changed);
        let once = ledger.clone();
        let report = reconcile(&mut ledger, &changed);

        assert!(report.is_empty(), "{report:?}");
        assert_eq!(ledger, once);
    }
}

#[test]
fn reconcile_keeps_relative_order_of_survivors() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..50 {
        let deals = random_deals(&mut rng, 20);
        let mut ledger = OrderLedger::empty();
        reconcile(&mut ledger, &deals);
        scramble(&mut rng, &mut ledger);
        let before = ledger.clone();

        let mut changed = deals.clone();
        changed.retain(|_| rng.gen_bool(0.7));
        for deal in changed.iter_mut() {
            if rng.gen_bool(0.25) {
                deal.stage = random_stage(&mut rng);
            }
        }
        changed.extend(random_deals(&mut rng, 5));

        reconcile(&mut ledger, &changed);

        for stage in Stage::ALL {
            let after = ledger.sequence(stage);
            let survivors: Vec<DealId> = before
                .sequence(stage)
                .iter()
                .copied()
                .filter(|id| after.contains(id))
                .collect();
            // Survivors form a prefix in their old relative order.
            assert_eq!(&after[..survivors.len()], survivors.as_slice());
        }

        let expected: HashSet<(DealId, Stage)> = changed.iter().map(|d| (d.id, d.stage)).collect();
        let actual: HashSet<(DealId, Stage)> = ledger
            .iter()
            .flat_map(|(stage, ids)| ids.iter().map(move |id| (*id, stage)))
            .collect();
        assert_eq!(actual, expected);
    }
}
