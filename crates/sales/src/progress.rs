//! Shipping and invoicing progress of a sale, derived from its documents.

use forgeerp_invoicing::{Invoice, InvoiceState};
use forgeerp_stock::{Move, MoveState};

use crate::order::{SaleInvoiceState, SaleShipmentState};

/// Shipping progress given every stock move of the sale lines.
pub fn shipment_state<'a>(line_moves: impl IntoIterator<Item = &'a Move>) -> SaleShipmentState {
    let mut any = false;
    let mut settled = true;
    for mv in line_moves {
        any = true;
        if mv.is_pending_exception() {
            return SaleShipmentState::Exception;
        }
        let finished = mv.state == MoveState::Done
            || (mv.state == MoveState::Cancelled && mv.resolution.is_classified());
        settled &= finished;
    }
    match (any, settled) {
        (false, _) => SaleShipmentState::None,
        (true, true) => SaleShipmentState::Sent,
        (true, false) => SaleShipmentState::Waiting,
    }
}

/// Invoicing progress given every invoice of the sale.
pub fn invoice_state<'a>(invoices: impl IntoIterator<Item = &'a Invoice>) -> SaleInvoiceState {
    let mut live = 0usize;
    let mut paid = 0usize;
    for invoice in invoices {
        if invoice.is_pending_exception() {
            return SaleInvoiceState::Exception;
        }
        if invoice.state == InvoiceState::Cancelled {
            continue;
        }
        live += 1;
        if invoice.state == InvoiceState::Paid {
            paid += 1;
        }
    }
    if live == 0 {
        SaleInvoiceState::None
    } else if paid == live {
        SaleInvoiceState::Paid
    } else {
        SaleInvoiceState::Pending
    }
}
