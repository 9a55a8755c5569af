//! Optimistic stage changes.
//!
//! A transition is applied locally first (`begin`), sent to the entity
//! store (`dispatch`, the only await point), and folded back in when it
//! settles (`settle`). The ledger position chosen at `begin` is never
//! rolled back; a failed write only reverts stage membership.

use dealboard_core::{
    reconcile, Deal, DealId, NoticeId, OrderLedger, ReconcileReport, Stage, TransitionId,
};
use tracing::{debug, warn};

use crate::error::{EngineError, RemoteError};
use crate::notice::{Notice, NoticeQueue};
use crate::remote::EntityStore;
use crate::shadow::OptimisticShadow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransition {
    pub id: TransitionId,
    pub deal_id: DealId,
    pub from: Stage,
    pub to: Stage,
    pub before: Option<DealId>,
}

#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    /// Write landed and the refetch returned this list.
    Confirmed(Vec<Deal>),
    /// Write landed but the refetch failed.
    ConfirmedStale,
    /// Write failed.
    Rejected(RemoteError),
}

#[derive(Debug, Clone)]
pub struct SettledTransition {
    pub pending: PendingTransition,
    pub outcome: TransitionOutcome,
}

/// Send one stage write and, if it lands, refetch the deal list.
/// Single attempt; never retried.
pub async fn dispatch<S: EntityStore + ?Sized>(
    store: &S,
    pending: PendingTransition,
) -> SettledTransition {
    let outcome = match store.update_deal_stage(pending.deal_id, pending.to).await {
        Ok(()) => match store.list_deals().await {
            Ok(deals) => TransitionOutcome::Confirmed(deals),
            Err(e) => {
                warn!(transition = %pending.id, error = %e, "stage write landed but refetch failed");
                TransitionOutcome::ConfirmedStale
            }
        },
        Err(e) => TransitionOutcome::Rejected(e),
    };
    SettledTransition { pending, outcome }
}

pub struct TransitionCoordinator {
    shadow: OptimisticShadow,
    notices: NoticeQueue,
}

impl TransitionCoordinator {
    pub fn new(authoritative: Vec<Deal>, notice_capacity: usize) -> Self {
        Self {
            shadow: OptimisticShadow::new(authoritative),
            notices: NoticeQueue::new(notice_capacity),
        }
    }

    pub fn shadow(&self) -> &OptimisticShadow {
        &self.shadow
    }

    pub fn notices(&self) -> &NoticeQueue {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut NoticeQueue {
        &mut self.notices
    }

    /// Apply a stage change to the shadow and the ledger. Nothing is
    /// touched if validation fails.
    pub fn begin(
        &mut self,
        ledger: &mut OrderLedger,
        deal_id: DealId,
        from: Stage,
        to: Stage,
        before: Option<DealId>,
    ) -> Result<PendingTransition, EngineError> {
        if from == to {
            return Err(EngineError::SameStage(deal_id, to));
        }
        let actual = self
            .shadow
            .stage_of(deal_id)
            .ok_or(EngineError::DealNotFound(deal_id))?;
        if actual != from {
            return Err(EngineError::StageMismatch {
                deal_id,
                expected: from,
                actual,
            });
        }

        ledger.move_across_stage(deal_id, from, to, before)?;
        let id = self.shadow.apply(deal_id, from, to);
        debug!(transition = %id, deal = %deal_id, %from, %to, "stage transition applied optimistically");

        Ok(PendingTransition {
            id,
            deal_id,
            from,
            to,
            before,
        })
    }

    /// Fold a settled write back into the shadow and reconcile the ledger.
    pub fn settle(&mut self, ledger: &mut OrderLedger, settled: SettledTransition) -> ReconcileReport {
        let SettledTransition { pending, outcome } = settled;
        match outcome {
            TransitionOutcome::Confirmed(deals) => {
                self.shadow.confirm(pending.deal_id, pending.id);
                self.shadow.replace_authoritative(deals);
                debug!(transition = %pending.id, "stage transition confirmed");
            }
            TransitionOutcome::ConfirmedStale => {
                self.shadow.confirm(pending.deal_id, pending.id);
                self.shadow.patch_authoritative(pending.deal_id, pending.to);
            }
            TransitionOutcome::Rejected(error) => {
                let reverted = self.shadow.revert(pending.deal_id, pending.id);
                warn!(
                    transition = %pending.id,
                    deal = %pending.deal_id,
                    to = %pending.to,
                    reverted,
                    error = %error,
                    "stage write rejected, reverting"
                );
                let notice = self.rejection_notice(&pending, &error);
                self.notices.push(notice);
            }
        }
        self.reconcile(ledger)
    }

    pub fn refresh(&mut self, ledger: &mut OrderLedger, deals: Vec<Deal>) -> ReconcileReport {
        self.shadow.replace_authoritative(deals);
        self.reconcile(ledger)
    }

    /// Reconcile against the shadow view: authoritative list plus pending overrides.
    pub fn reconcile(&self, ledger: &mut OrderLedger) -> ReconcileReport {
        let report = reconcile(ledger, &self.shadow.deals());
        if !report.is_empty() {
            debug!(
                added = report.added.len(),
                removed = report.removed.len(),
                relocated = report.relocated.len(),
                "ledger reconciled"
            );
        }
        report
    }

    fn rejection_notice(&self, pending: &PendingTransition, error: &RemoteError) -> Notice {
        let title = self
            .shadow
            .deal(pending.deal_id)
            .map(|deal| deal.title)
            .unwrap_or_else(|| "deal".to_string());
        Notice {
            id: NoticeId::new(),
            deal_id: pending.deal_id,
            stage: pending.to,
            message: format!("Couldn't move \"{title}\" to {}: {error}", pending.to),
        }
    }
}
