//! Drag gesture state machine.
//!
//! Idle until a known deal is picked up, Dragging while hover events
//! arrive, back to Idle on release or cancel. Nothing here mutates the
//! ledger; release only resolves the gesture into an intent.

use dealboard_core::{DealId, OrderLedger, Stage};
use tracing::debug;

/// What the pointer is currently over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTarget {
    /// Empty space in a column; a drop here means "end of column".
    Column(Stage),
    /// A card in a column; a drop here means "immediately before this card".
    Card { stage: Stage, deal_id: DealId },
}

impl HoverTarget {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Column(stage) | Self::Card { stage, .. } => *stage,
        }
    }

    pub fn anchor(&self) -> Option<DealId> {
        match self {
            Self::Column(_) => None,
            Self::Card { deal_id, .. } => Some(*deal_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub deal_id: DealId,
    pub origin: Stage,
    pub hover: Option<HoverTarget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Cancelled by the caller.
    Aborted,
    /// Released without ever hovering a target.
    NoTarget,
    /// The dragged deal left its origin stage mid-gesture.
    DealVanished,
    /// The hovered card is no longer in the hovered column.
    TargetVanished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropIntent {
    Cancel(CancelReason),
    NoOp,
    Reorder {
        stage: Stage,
        deal_id: DealId,
        before: Option<DealId>,
    },
    Transfer {
        deal_id: DealId,
        from: Stage,
        to: Stage,
        before: Option<DealId>,
    },
}

#[derive(Debug, Default)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Pick up `deal_id`. Ignored while another gesture is active or when
    /// the ledger does not know the deal.
    pub fn start(&mut self, deal_id: DealId, ledger: &OrderLedger) -> bool {
        if let Some(active) = &self.session {
            debug!(deal = %deal_id, active = %active.deal_id, "pick-up ignored, drag in progress");
            return false;
        }
        let Some(origin) = ledger.stage_of(deal_id) else {
            debug!(deal = %deal_id, "pick-up ignored, unknown deal");
            return false;
        };
        self.session = Some(DragSession {
            deal_id,
            origin,
            hover: None,
        });
        true
    }

    pub fn hover(&mut self, target: HoverTarget) -> bool {
        match &mut self.session {
            Some(session) => {
                session.hover = Some(target);
                true
            }
            None => false,
        }
    }

    /// Abort the active gesture. Returns false when there was none.
    pub fn cancel(&mut self) -> bool {
        self.session.take().is_some()
    }

    /// End the active gesture and resolve it against the current ledger.
    /// `None` when no gesture was active.
    pub fn release(&mut self, ledger: &OrderLedger) -> Option<DropIntent> {
        let session = self.session.take()?;
        let intent = resolve(&session, ledger);
        debug!(deal = %session.deal_id, ?intent, "drop resolved");
        Some(intent)
    }
}

fn resolve(session: &DragSession, ledger: &OrderLedger) -> DropIntent {
    let Some(target) = session.hover else {
        return DropIntent::Cancel(CancelReason::NoTarget);
    };
    if ledger.stage_of(session.deal_id) != Some(session.origin) {
        return DropIntent::Cancel(CancelReason::DealVanished);
    }
    if let HoverTarget::Card { stage, deal_id } = target {
        if deal_id == session.deal_id {
            return DropIntent::NoOp;
        }
        if ledger.stage_of(deal_id) != Some(stage) {
            return DropIntent::Cancel(CancelReason::TargetVanished);
        }
    }

    let to = target.stage();
    let before = target.anchor();
    if to != session.origin {
        return DropIntent::Transfer {
            deal_id: session.deal_id,
            from: session.origin,
            to,
            before,
        };
    }
    if ledger.is_in_place(to, session.deal_id, before) {
        return DropIntent::NoOp;
    }
    DropIntent::Reorder {
        stage: to,
        deal_id: session.deal_id,
        before,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealboard_core::{reconcile, Deal};

    fn board(deals: &[Deal]) -> OrderLedger {
        let mut ledger = OrderLedger::empty();
        reconcile(&mut ledger, deals);
        ledger
    }

    #[test]
    fn reorder_before_card() {
        let d1 = Deal::new("a", 1, Stage::Lead, 1);
        let d2 = Deal::new("b", 1, Stage::Lead, 2);
        let ledger = board(&[d1.clone(), d2.clone()]);
        let mut drag = DragController::new();

        assert!(drag.start(d2.id, &ledger));
        assert!(drag.hover(HoverTarget::Card { stage: Stage::Lead, deal_id: d1.id }));
        let intent = drag.release(&ledger).unwrap();

        assert_eq!(
            intent,
            DropIntent::Reorder { stage: Stage::Lead, deal_id: d2.id, before: Some(d1.id) }
        );
        assert!(!drag.is_dragging());
    }

    #[test]
    fn other_column_is_a_transfer() {
        let d1 = Deal::new("a", 1, Stage::Lead, 1);
        let ledger = board(std::slice::from_ref(&d1));
        let mut drag = DragController::new();

        drag.start(d1.id, &ledger);
        drag.hover(HoverTarget::Column(Stage::Qualified));

        assert_eq!(
            drag.release(&ledger),
            Some(DropIntent::Transfer {
                deal_id: d1.id,
                from: Stage::Lead,
                to: Stage::Qualified,
                before: None,
            })
        );
    }

    #[test]
    fn release_where_it_started_is_noop() {
        let d1 = Deal::new("a", 1, Stage::Lead, 1);
        let d2 = Deal::new("b", 1, Stage::Lead, 2);
        let ledger = board(&[d1.clone(), d2.clone()]);
        let mut drag = DragController::new();

        drag.start(d1.id, &ledger);
        drag.hover(HoverTarget::Card { stage: Stage::Lead, deal_id: d2.id });
        assert_eq!(drag.release(&ledger), Some(DropIntent::NoOp));

        drag.start(d1.id, &ledger);
        drag.hover(HoverTarget::Card { stage: Stage::Lead, deal_id: d1.id });
        assert_eq!(drag.release(&ledger), Some(DropIntent::NoOp));

        drag.start(d2.id, &ledger);
        drag.hover(HoverTarget::Column(Stage::Lead));
        assert_eq!(drag.release(&ledger), Some(DropIntent::NoOp));
    }

    #[test]
    fn second_pickup_is_ignored() {
        let d1 = Deal::new("a", 1, Stage::Lead, 1);
        let d2 = Deal::new("b", 1, Stage::Won, 2);
        let ledger = board(&[d1.clone(), d2.clone()]);
        let mut drag = DragController::new();

        assert!(drag.start(d1.id, &ledger));
        assert!(!drag.start(d2.id, &ledger));
        assert_eq!(drag.session().map(|s| s.deal_id), Some(d1.id));
    }

    #[test]
    fn unknown_deal_cannot_be_picked_up() {
        let ledger = OrderLedger::empty();
        let mut drag = DragController::new();
        assert!(!drag.start(DealId::new(), &ledger));
        assert!(!drag.hover(HoverTarget::Column(Stage::Won)));
        assert_eq!(drag.release(&ledger), None);
    }

    #[test]
    fn release_without_target_cancels() {
        let d1 = Deal::new("a", 1, Stage::Lead, 1);
        let ledger = board(std::slice::from_ref(&d1));
        let mut drag = DragController::new();

        drag.start(d1.id, &ledger);
        assert_eq!(drag.release(&ledger), Some(DropIntent::Cancel(CancelReason::NoTarget)));
    }

    #[test]
    fn vanished_targets_cancel() {
        let d1 = Deal::new("a", 1, Stage::Lead, 1);
        let d2 = Deal::new("b", 1, Stage::Won, 2);
        let mut drag = DragController::new();

        let ledger = board(&[d1.clone(), d2.clone()]);
        drag.start(d1.id, &ledger);
        drag.hover(HoverTarget::Card { stage: Stage::Won, deal_id: d2.id });
        let without_d2 = board(std::slice::from_ref(&d1));
        assert_eq!(
            drag.release(&without_d2),
            Some(DropIntent::Cancel(CancelReason::TargetVanished))
        );

        drag.start(d1.id, &ledger);
        drag.hover(HoverTarget::Column(Stage::Won));
        let without_d1 = board(std::slice::from_ref(&d2));
        assert_eq!(
            drag.release(&without_d1),
            Some(DropIntent::Cancel(CancelReason::DealVanished))
        );
    }

    #[test]
    fn cancel_discards_session() {
        let d1 = Deal::new("a", 1, Stage::Lead, 1);
        let ledger = board(std::slice::from_ref(&d1));
        let mut drag = DragController::new();

        drag.start(d1.id, &ledger);
        drag.hover(HoverTarget::Column(Stage::Won));
        assert!(drag.cancel());
        assert!(!drag.cancel());
        assert_eq!(drag.release(&ledger), None);
    }
}
