pub mod config;
pub mod drag;
pub mod error;
pub mod notice;
pub mod remote;
pub mod shadow;
pub mod transition;

pub use config::BoardConfig;
pub use drag::{CancelReason, DragController, DragSession, DropIntent, HoverTarget};
pub use error::{EngineError, RemoteError};
pub use notice::{Notice, NoticeQueue};
pub use remote::EntityStore;
pub use shadow::{OptimisticShadow, PendingStage};
pub use transition::{
    dispatch, PendingTransition, SettledTransition, TransitionCoordinator, TransitionOutcome,
};

use std::collections::BTreeMap;

use dealboard_core::{
    ordered_deals_by_stage, Deal, DealId, NoticeId, OrderLedger, ReconcileReport, Stage,
};
use dealboard_storage::{load_ledger, reset_ledger, save_ledger, LedgerStore, SqliteLedgerStore};
use tracing::{debug, info, warn};

/// Result of releasing a drag gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// No gesture was active.
    Ignored,
    Cancelled(CancelReason),
    /// Released where it started; nothing changed and nothing was sent.
    NoOp,
    Reordered { stage: Stage, deal_id: DealId },
    /// Applied optimistically. The stage write has not been sent: the caller
    /// must pass this to `Board::complete`, or `dispatch` it and `settle` the
    /// result. Until then the deal keeps its optimistic stage.
    TransferStarted(PendingTransition),
}

/// One mounted pipeline board: the order ledger, its durable store, the
/// active drag gesture, and in-flight stage transitions.
///
/// The board never talks to the entity store on its own. Every
/// `PendingTransition` it hands out, from `on_drop` or `transition`, must be
/// driven through `complete` (or `dispatch` + `settle`); a dropped one leaves
/// its optimistic override in the shadow.
pub struct Board<L: LedgerStore = SqliteLedgerStore> {
    board_key: String,
    store: L,
    ledger: OrderLedger,
    drag: DragController,
    coordinator: TransitionCoordinator,
}

impl Board<SqliteLedgerStore> {
    /// Open the configured ledger database and mount the board on `deals`.
    pub fn open(config: &BoardConfig, deals: Vec<Deal>) -> Result<Self, EngineError> {
        config.validate()?;
        let store = match &config.ledger_path {
            Some(path) => SqliteLedgerStore::open(path)?,
            None => SqliteLedgerStore::open_in_memory()?,
        };
        Ok(Self::mount(config, store, deals))
    }
}

impl<L: LedgerStore> Board<L> {
    /// Load the stored ledger (empty if absent or unreadable), reconcile it
    /// against `deals`, and persist the result.
    pub fn mount(config: &BoardConfig, store: L, deals: Vec<Deal>) -> Self {
        let ledger = load_ledger(&store, &config.board_key);
        let mut board = Self {
            board_key: config.board_key.clone(),
            store,
            ledger,
            drag: DragController::new(),
            coordinator: TransitionCoordinator::new(deals, config.notice_capacity),
        };
        let report = board.coordinator.reconcile(&mut board.ledger);
        board.persist();
        info!(
            board = %board.board_key,
            deals = board.ledger.len(),
            added = report.added.len(),
            removed = report.removed.len(),
            "board mounted"
        );
        board
    }

    pub fn board_key(&self) -> &str {
        &self.board_key
    }

    pub fn ledger(&self) -> &OrderLedger {
        &self.ledger
    }

    pub fn store(&self) -> &L {
        &self.store
    }

    pub fn shadow(&self) -> &OptimisticShadow {
        self.coordinator.shadow()
    }

    /// Deals with optimistic stage overrides applied.
    pub fn shadow_deals(&self) -> Vec<Deal> {
        self.coordinator.shadow().deals()
    }

    pub fn stage_of(&self, deal_id: DealId) -> Option<Stage> {
        self.coordinator.shadow().stage_of(deal_id)
    }

    /// Render-ready columns in manual order.
    pub fn ordered_deals_by_stage(&self) -> BTreeMap<Stage, Vec<Deal>> {
        let deals = self.shadow_deals();
        ordered_deals_by_stage(&self.ledger, &deals)
            .into_iter()
            .map(|(stage, column)| (stage, column.into_iter().cloned().collect()))
            .collect()
    }

    pub fn pending_transitions(&self) -> usize {
        self.coordinator.shadow().pending_count()
    }

    // ========================================================================
    // Gesture entry points
    // ========================================================================

    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.session()
    }

    pub fn on_drag_start(&mut self, deal_id: DealId) -> bool {
        self.drag.start(deal_id, &self.ledger)
    }

    pub fn on_drag_over_target(&mut self, target: HoverTarget) -> bool {
        self.drag.hover(target)
    }

    pub fn on_drag_cancel(&mut self) -> bool {
        let cancelled = self.drag.cancel();
        if cancelled {
            debug!(board = %self.board_key, "drag cancelled");
        }
        cancelled
    }

    /// Release the active gesture. Reorders are applied and persisted here;
    /// transfers are applied optimistically and returned for dispatch.
    #[must_use = "a started transfer must be dispatched and settled"]
    pub fn on_drop(&mut self) -> DropOutcome {
        let Some(intent) = self.drag.release(&self.ledger) else {
            return DropOutcome::Ignored;
        };
        match intent {
            DropIntent::Cancel(reason) => DropOutcome::Cancelled(reason),
            DropIntent::NoOp => DropOutcome::NoOp,
            DropIntent::Reorder {
                stage,
                deal_id,
                before,
            } => match self.ledger.move_within_stage(stage, deal_id, before) {
                Ok(true) => {
                    self.persist();
                    DropOutcome::Reordered { stage, deal_id }
                }
                Ok(false) => DropOutcome::NoOp,
                Err(e) => {
                    debug!(board = %self.board_key, error = %e, "reorder target invalid");
                    DropOutcome::Cancelled(CancelReason::TargetVanished)
                }
            },
            DropIntent::Transfer {
                deal_id,
                from,
                to,
                before,
            } => match self.transition(deal_id, from, to, before) {
                Ok(pending) => DropOutcome::TransferStarted(pending),
                Err(e) => {
                    debug!(board = %self.board_key, error = %e, "transfer target invalid");
                    DropOutcome::Cancelled(CancelReason::TargetVanished)
                }
            },
        }
    }

    // ========================================================================
    // Stage transitions
    // ========================================================================

    /// Move a deal to another stage optimistically and persist the new order.
    /// The returned transition still has to be dispatched and settled.
    #[must_use = "the stage write is only sent by dispatching the returned transition"]
    pub fn transition(
        &mut self,
        deal_id: DealId,
        from: Stage,
        to: Stage,
        before: Option<DealId>,
    ) -> Result<PendingTransition, EngineError> {
        let pending = self.coordinator.begin(&mut self.ledger, deal_id, from, to, before)?;
        self.persist();
        Ok(pending)
    }

    /// Fold a settled write back in. Never fails; a rejected write becomes a notice.
    pub fn settle(&mut self, settled: SettledTransition) -> ReconcileReport {
        let report = self.coordinator.settle(&mut self.ledger, settled);
        if !report.is_empty() {
            self.persist();
        }
        report
    }

    /// Dispatch `pending` against `store` and settle it.
    pub async fn complete<S: EntityStore + ?Sized>(
        &mut self,
        store: &S,
        pending: PendingTransition,
    ) -> ReconcileReport {
        let settled = dispatch(store, pending).await;
        self.settle(settled)
    }

    // ========================================================================
    // Refresh & reset
    // ========================================================================

    /// Adopt a freshly fetched deal list and reconcile.
    pub fn refresh(&mut self, deals: Vec<Deal>) -> ReconcileReport {
        let report = self.coordinator.refresh(&mut self.ledger, deals);
        if !report.is_empty() {
            self.persist();
        }
        report
    }

    /// Fetch the deal list from `store` and reconcile. On failure the board
    /// keeps its last-known state.
    pub async fn refetch<S: EntityStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<ReconcileReport, EngineError> {
        let deals = store.list_deals().await.inspect_err(|e| {
            warn!(board = %self.board_key, error = %e, "refetch failed, keeping last-known deals");
        })?;
        Ok(self.refresh(deals))
    }

    /// Forget manual order: drop the stored record and rebuild membership in
    /// creation order.
    pub fn reset(&mut self) {
        reset_ledger(&mut self.store, &self.board_key);
        self.ledger = OrderLedger::empty();
        self.coordinator.reconcile(&mut self.ledger);
        self.persist();
        info!(board = %self.board_key, "board ledger reset");
    }

    // ========================================================================
    // Notices
    // ========================================================================

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.coordinator.notices().iter()
    }

    pub fn dismiss_notice(&mut self, id: NoticeId) -> bool {
        self.coordinator.notices_mut().dismiss(id)
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.coordinator.notices_mut().take_all()
    }

    fn persist(&mut self) {
        save_ledger(&mut self.store, &self.board_key, &self.ledger);
    }
}
