//! Precondition guard of the revocation.
//!
//! The blocking rules differ between sale and purchase orders and are kept
//! apart on purpose: sales tolerate waiting shipments (they are reset to
//! draft) and inspect the warehouse-side moves, purchases only reject
//! shipments being received.

use forgeerp_core::Entity;
use forgeerp_stock::{MoveCollection, Shipment, ShipmentState};

use crate::error::{RevokeError, RevokeResult};
use crate::order::{OrderKind, RevocableOrder};
use crate::ports::{InvoiceService, StockService};

/// Offending records listed in an error message.
pub const MAX_LISTED: usize = 5;

/// Which shipment documents of an order a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipmentSet {
    Shipments,
    Returns,
}

/// Blocking rules of one order kind.
#[derive(Debug, Clone, Copy)]
pub struct GuardPolicy {
    /// Move collection inspected on each shipment set.
    pub move_checks: [(ShipmentSet, MoveCollection); 2],
    pub shipment_blocks: fn(ShipmentState) -> bool,
}

fn sale_shipment_blocks(state: ShipmentState) -> bool {
    !matches!(
        state,
        ShipmentState::Cancelled | ShipmentState::Waiting | ShipmentState::Draft | ShipmentState::Done
    )
}

fn purchase_shipment_blocks(state: ShipmentState) -> bool {
    matches!(state, ShipmentState::Assigned | ShipmentState::Received)
}

impl GuardPolicy {
    pub fn for_kind(kind: OrderKind) -> Self {
        match kind {
            OrderKind::Sale => Self {
                move_checks: [
                    (ShipmentSet::Shipments, MoveCollection::Inventory),
                    (ShipmentSet::Returns, MoveCollection::Incoming),
                ],
                shipment_blocks: sale_shipment_blocks,
            },
            OrderKind::Purchase => Self {
                move_checks: [
                    (ShipmentSet::Shipments, MoveCollection::Incoming),
                    (ShipmentSet::Returns, MoveCollection::Outgoing),
                ],
                shipment_blocks: purchase_shipment_blocks,
            },
        }
    }
}

/// Join record names for an error message: at most [`MAX_LISTED`] names,
/// followed by `...` when there are more.
pub fn list_names(names: &[String]) -> String {
    let mut listed = names
        .iter()
        .take(MAX_LISTED)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if names.len() > MAX_LISTED {
        listed.push_str("...");
    }
    listed
}

fn load_set<O, S>(stock: &S, order: &O, set: ShipmentSet) -> RevokeResult<Vec<Shipment>>
where
    O: RevocableOrder,
    S: StockService + ?Sized,
{
    let ids = match set {
        ShipmentSet::Shipments => order.shipments(),
        ShipmentSet::Returns => order.shipment_returns(),
    };
    ids.iter()
        .map(|id| stock.shipment(*id).map_err(RevokeError::from))
        .collect()
}

/// Names of the moves and shipments that prevent revoking `order`: moves
/// first, then shipments and returns.
pub fn blocking_moves<O, S>(stock: &S, order: &O) -> RevokeResult<Vec<String>>
where
    O: RevocableOrder,
    S: StockService + ?Sized,
{
    let policy = GuardPolicy::for_kind(O::KIND);
    let mut moves = Vec::new();
    for (set, collection) in policy.move_checks {
        for shipment in load_set(stock, order, set)? {
            for id in shipment.moves(collection) {
                let mv = stock.stock_move(*id)?;
                if !mv.state.allows_revoke() {
                    moves.push(mv.rec_name());
                }
            }
        }
    }

    let mut picks = Vec::new();
    for set in [ShipmentSet::Shipments, ShipmentSet::Returns] {
        for shipment in load_set(stock, order, set)? {
            if (policy.shipment_blocks)(shipment.state) {
                picks.push(shipment.rec_name());
            }
        }
    }

    moves.extend(picks);
    Ok(moves)
}

/// Fail when shipments or moves of `order` are being handled.
pub fn validate_moves<O, S>(stock: &S, order: &O) -> RevokeResult<()>
where
    O: RevocableOrder,
    S: StockService + ?Sized,
{
    let offenders = blocking_moves(stock, order)?;
    if offenders.is_empty() {
        return Ok(());
    }
    Err(RevokeError::MovesInProgress {
        record: order.rec_name(),
        names: list_names(&offenders),
    })
}

/// Fail when invoices of `order` are neither draft nor settled.
pub fn validate_invoices<O, I>(invoicing: &I, order: &O) -> RevokeResult<()>
where
    O: RevocableOrder,
    I: InvoiceService + ?Sized,
{
    let mut offenders = Vec::new();
    for id in order.invoices() {
        let invoice = invoicing.invoice(*id)?;
        if !invoice.state.allows_revoke() {
            offenders.push(invoice.rec_name());
        }
    }
    if offenders.is_empty() {
        return Ok(());
    }
    Err(RevokeError::InvoicesInProgress {
        record: order.rec_name(),
        names: list_names(&offenders),
    })
}
