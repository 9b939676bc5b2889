//! Revocation of confirmed/processing orders.

use tracing::{debug, info};

use forgeerp_core::{OrderState, Workflow};
use forgeerp_invoicing::InvoiceState;
use forgeerp_stock::{MoveState, ShipmentId, ShipmentState};

use crate::buttons::revoke_visible;
use crate::error::{RevokeError, RevokeResult};
use crate::guard::{validate_invoices, validate_moves};
use crate::order::{OrderKind, RevocableOrder};
use crate::ports::{Platform, StockService};

/// Order workflow with the revoke extension: a confirmed order can be
/// finished directly.
pub fn revoke_workflow() -> Workflow {
    Workflow::base().extend([(OrderState::Confirmed, OrderState::Done)])
}

/// Options of the revoke action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevokeOptions {
    /// Also cancel and reconcile the invoices (sale orders only).
    pub manage_invoices: bool,
}

/// What a revocation changed on one order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevokeOutcome {
    pub cancelled_shipments: usize,
    pub cancelled_moves: usize,
    pub ignored_moves: usize,
    pub cancelled_invoices: usize,
    pub ignored_invoices: usize,
}

/// Runs the revoke procedures against a platform.
pub struct Revoker<'p, P> {
    platform: &'p P,
    workflow: Workflow,
}

impl<'p, P> Revoker<'p, P> {
    pub fn new(platform: &'p P) -> Self {
        Self {
            platform,
            workflow: revoke_workflow(),
        }
    }

    /// Revoke each order in turn.
    ///
    /// Every order is one unit of work: a failing order is left untouched and
    /// stops the batch, orders revoked before it stay revoked.
    pub fn revoke<O>(&self, ids: &[O::Id], options: RevokeOptions) -> RevokeResult<Vec<RevokeOutcome>>
    where
        O: RevocableOrder,
        P: Platform<O>,
    {
        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = self
                .platform
                .atomically(|| self.revoke_one::<O>(*id, options))?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    fn revoke_one<O>(&self, id: O::Id, options: RevokeOptions) -> RevokeResult<RevokeOutcome>
    where
        O: RevocableOrder,
        P: Platform<O>,
    {
        let order: O = self.platform.load(id)?;
        if !revoke_visible(order.state()) {
            return Err(RevokeError::NotRevocable {
                record: order.rec_name(),
                state: order.state(),
            });
        }

        validate_moves(self.platform, &order)?;
        let manage_invoices = options.manage_invoices && O::KIND == OrderKind::Sale;
        if options.manage_invoices && !manage_invoices {
            debug!(order = %id, "invoices are not managed when revoking purchases");
        }

        let mut outcome = RevokeOutcome::default();
        if manage_invoices {
            validate_invoices(self.platform, &order)?;
            let (cancelled, ignored) = self.handle_invoices::<O>(id)?;
            outcome.cancelled_invoices = cancelled;
            outcome.ignored_invoices = ignored;
        }

        let shipments = self.handle_shipments::<O>(id)?;
        outcome.cancelled_shipments = shipments.cancelled_shipments;
        outcome.cancelled_moves = shipments.cancelled_moves;
        outcome.ignored_moves = shipments.ignored_moves;

        let order: O = self.platform.load(id)?;
        if order.state() != OrderState::Done {
            self.platform.transition(id, OrderState::Done, &self.workflow)?;
        }

        info!(
            order = %id,
            cancelled_shipments = outcome.cancelled_shipments,
            cancelled_moves = outcome.cancelled_moves,
            ignored_moves = outcome.ignored_moves,
            ignored_invoices = outcome.ignored_invoices,
            "order revoked"
        );
        Ok(outcome)
    }

    /// Cancel the unstarted shipments and moves of the order and mark every
    /// unreconciled cancelled move as ignored.
    pub fn handle_shipments<O>(&self, id: O::Id) -> RevokeResult<RevokeOutcome>
    where
        O: RevocableOrder,
        P: Platform<O>,
    {
        let order: O = self.platform.load(id)?;
        let mut outcome = RevokeOutcome::default();

        if O::KIND == OrderKind::Sale {
            let waiting = shipments_in(self.platform, order.shipments(), ShipmentState::Waiting)?;
            self.platform.draft_shipments(&waiting)?;
        }

        let mut drafts = shipments_in(self.platform, order.shipments(), ShipmentState::Draft)?;
        drafts.extend(shipments_in(self.platform, order.shipment_returns(), ShipmentState::Draft)?);
        self.platform.cancel_shipments(&drafts)?;
        outcome.cancelled_shipments = drafts.len();

        let order: O = self.platform.load(id)?;
        let mut draft_moves = Vec::new();
        for move_id in order.line_moves() {
            if self.platform.stock_move(move_id)?.state == MoveState::Draft {
                draft_moves.push(move_id);
            }
        }
        if !draft_moves.is_empty() {
            self.platform.cancel_moves(&draft_moves)?;
        }
        outcome.cancelled_moves = draft_moves.len();

        let order: O = self.platform.load(id)?;
        let mut pending = Vec::new();
        for move_id in order.line_moves() {
            if self.platform.stock_move(move_id)?.is_pending_exception() {
                pending.push(move_id);
            }
        }
        self.platform.handle_shipment_exception(id, &pending, &[])?;
        outcome.ignored_moves = pending.len();

        debug!(order = %id, pending = pending.len(), "shipment exception handled");
        Ok(outcome)
    }

    /// Cancel the draft invoices of the order and mark every unreconciled
    /// cancelled invoice as ignored. Returns `(cancelled, ignored)`.
    pub fn handle_invoices<O>(&self, id: O::Id) -> RevokeResult<(usize, usize)>
    where
        O: RevocableOrder,
        P: Platform<O>,
    {
        let order: O = self.platform.load(id)?;
        let mut drafts = Vec::new();
        for invoice_id in order.invoices() {
            if self.platform.invoice(*invoice_id)?.state == InvoiceState::Draft {
                drafts.push(*invoice_id);
            }
        }
        self.platform.cancel_invoices(&drafts)?;

        let order: O = self.platform.load(id)?;
        let mut pending = Vec::new();
        for invoice_id in order.invoices() {
            if self.platform.invoice(*invoice_id)?.is_pending_exception() {
                pending.push(*invoice_id);
            }
        }
        self.platform.handle_invoice_exception(id, &pending, &[])?;

        debug!(order = %id, pending = pending.len(), "invoice exception handled");
        Ok((drafts.len(), pending.len()))
    }
}

fn shipments_in<S>(stock: &S, ids: &[ShipmentId], state: ShipmentState) -> RevokeResult<Vec<ShipmentId>>
where
    S: StockService + ?Sized,
{
    let mut matching = Vec::new();
    for id in ids {
        if stock.shipment(*id)?.state == state {
            matching.push(*id);
        }
    }
    Ok(matching)
}
