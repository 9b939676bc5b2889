//! Order persistence and exception handling, shared by sales and purchases.

use std::collections::{HashMap, HashSet};

use forgeerp_core::{AggregateId, DomainError, DomainResult, OrderState, Workflow};
use forgeerp_invoicing::InvoiceId;
use forgeerp_purchasing::{PurchaseId, PurchaseLine, PurchaseOrder};
use forgeerp_revoke::{ExceptionResolver, LineOverrides, OrderRepository, RevocableOrder};
use forgeerp_sales::{SaleId, SaleLine, SaleOrder};
use forgeerp_stock::{Move, MoveId};

use super::{ErpState, InMemoryErp};

/// Storage hooks of an order type.
pub trait StoredOrder: RevocableOrder {
    const LABEL: &'static str;

    fn table(state: &ErpState) -> &HashMap<Self::Id, Self>;
    fn table_mut(state: &mut ErpState) -> &mut HashMap<Self::Id, Self>;

    fn apply_transition(&mut self, workflow: &Workflow, to: OrderState) -> DomainResult<()>;
    fn duplicate_header(&self) -> Self;
    fn push_line_copy(&mut self, line: &Self::Line, overrides: LineOverrides);
    fn line_moves_mut(&mut self, origin: AggregateId) -> Option<&mut Vec<MoveId>>;
    fn followed_up_mut(&mut self) -> &mut Vec<MoveId>;
    fn bump(&mut self);

    /// Recompute the derived progress of the order after its documents changed.
    fn refresh(state: &mut ErpState, id: Self::Id) -> DomainResult<()>;
}

impl StoredOrder for SaleOrder {
    const LABEL: &'static str = "sale";

    fn table(state: &ErpState) -> &HashMap<SaleId, SaleOrder> {
        &state.sales
    }

    fn table_mut(state: &mut ErpState) -> &mut HashMap<SaleId, SaleOrder> {
        &mut state.sales
    }

    fn apply_transition(&mut self, workflow: &Workflow, to: OrderState) -> DomainResult<()> {
        self.transition(workflow, to)
    }

    fn duplicate_header(&self) -> Self {
        self.duplicate()
    }

    fn push_line_copy(&mut self, line: &SaleLine, overrides: LineOverrides) {
        self.push_copied_line(line.duplicate(overrides.quantity, Some(overrides.unit)));
    }

    fn line_moves_mut(&mut self, origin: AggregateId) -> Option<&mut Vec<MoveId>> {
        self.line_mut(forgeerp_sales::SaleLineId(origin))
            .ok()
            .map(|l| &mut l.moves)
    }

    fn followed_up_mut(&mut self) -> &mut Vec<MoveId> {
        &mut self.followed_up_moves
    }

    fn bump(&mut self) {
        self.touch();
    }

    fn refresh(state: &mut ErpState, id: SaleId) -> DomainResult<()> {
        state.refresh_sale(id)
    }
}

impl StoredOrder for PurchaseOrder {
    const LABEL: &'static str = "purchase";

    fn table(state: &ErpState) -> &HashMap<PurchaseId, PurchaseOrder> {
        &state.purchases
    }

    fn table_mut(state: &mut ErpState) -> &mut HashMap<PurchaseId, PurchaseOrder> {
        &mut state.purchases
    }

    fn apply_transition(&mut self, workflow: &Workflow, to: OrderState) -> DomainResult<()> {
        self.transition(workflow, to)
    }

    fn duplicate_header(&self) -> Self {
        self.duplicate()
    }

    fn push_line_copy(&mut self, line: &PurchaseLine, overrides: LineOverrides) {
        self.push_copied_line(line.duplicate(overrides.quantity, Some(overrides.unit)));
    }

    fn line_moves_mut(&mut self, origin: AggregateId) -> Option<&mut Vec<MoveId>> {
        self.line_mut(forgeerp_purchasing::PurchaseLineId(origin))
            .ok()
            .map(|l| &mut l.moves)
    }

    fn followed_up_mut(&mut self) -> &mut Vec<MoveId> {
        &mut self.followed_up_moves
    }

    fn bump(&mut self) {
        self.touch();
    }

    fn refresh(_state: &mut ErpState, _id: PurchaseId) -> DomainResult<()> {
        Ok(())
    }
}

impl ErpState {
    pub(super) fn order<O: StoredOrder>(&self, id: O::Id) -> DomainResult<&O> {
        O::table(self)
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("{} {id}", O::LABEL)))
    }

    pub(super) fn order_mut<O: StoredOrder>(&mut self, id: O::Id) -> DomainResult<&mut O> {
        O::table_mut(self)
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("{} {id}", O::LABEL)))
    }

    /// Register `mv` on the order line it originates from.
    pub(super) fn attach_line_move(&mut self, mv: &Move) -> DomainResult<()> {
        let Some(origin) = mv.origin else {
            return Ok(());
        };
        for sale in self.sales.values_mut() {
            if let Some(moves) = sale.line_moves_mut(origin) {
                moves.push(mv.id);
                sale.touch();
                return Ok(());
            }
        }
        for purchase in self.purchases.values_mut() {
            if let Some(moves) = purchase.line_moves_mut(origin) {
                moves.push(mv.id);
                purchase.touch();
                return Ok(());
            }
        }
        Err(DomainError::not_found(format!("order line {origin}")))
    }
}

impl<O: StoredOrder> OrderRepository<O> for InMemoryErp {
    fn load(&self, id: O::Id) -> DomainResult<O> {
        self.read().order::<O>(id).cloned()
    }

    fn transition(&self, id: O::Id, to: OrderState, workflow: &Workflow) -> DomainResult<()> {
        self.write().order_mut::<O>(id)?.apply_transition(workflow, to)
    }

    fn copy_order(&self, id: O::Id) -> DomainResult<O::Id> {
        let mut state = self.write();
        let copy = state.order::<O>(id)?.duplicate_header();
        let new_id = copy.order_id();
        O::table_mut(&mut state).insert(new_id, copy);
        Ok(new_id)
    }

    fn copy_line(
        &self,
        line: &O::Line,
        target: O::Id,
        overrides: LineOverrides,
    ) -> DomainResult<()> {
        self.write()
            .order_mut::<O>(target)?
            .push_line_copy(line, overrides);
        Ok(())
    }

    fn record_follow_up(&self, id: O::Id, moves: &[MoveId]) -> DomainResult<()> {
        let mut state = self.write();
        let order = state.order_mut::<O>(id)?;
        order.followed_up_mut().extend_from_slice(moves);
        order.bump();
        Ok(())
    }
}

fn check_subset<T: Eq + core::hash::Hash + core::fmt::Display>(
    domain: &[T],
    recreate: &[T],
) -> DomainResult<()> {
    let domain: HashSet<&T> = domain.iter().collect();
    match recreate.iter().find(|r| !domain.contains(r)) {
        Some(outside) => Err(DomainError::validation(format!(
            "{outside} is not among the records to reconcile"
        ))),
        None => Ok(()),
    }
}

impl<O: StoredOrder> ExceptionResolver<O> for InMemoryErp {
    fn handle_shipment_exception(
        &self,
        order: O::Id,
        domain_moves: &[MoveId],
        recreate_moves: &[MoveId],
    ) -> DomainResult<()> {
        check_subset(domain_moves, recreate_moves)?;
        let mut state = self.write();
        let line_moves: HashSet<MoveId> =
            state.order::<O>(order)?.line_moves().into_iter().collect();

        for move_id in domain_moves {
            if !line_moves.contains(move_id) {
                return Err(DomainError::validation(format!(
                    "move {move_id} does not belong to {} {order}",
                    O::LABEL
                )));
            }
            let recreate = recreate_moves.contains(move_id);
            let mv = state.stock_move_mut(*move_id)?;
            mv.resolve(recreate)?;
            if recreate {
                let fresh = mv.recreated();
                state.moves.insert(fresh.id, fresh.clone());
                state.attach_line_move(&fresh)?;
            }
        }
        state.order_mut::<O>(order)?.bump();
        O::refresh(&mut state, order)
    }

    fn handle_invoice_exception(
        &self,
        order: O::Id,
        domain_invoices: &[InvoiceId],
        recreate_invoices: &[InvoiceId],
    ) -> DomainResult<()> {
        check_subset(domain_invoices, recreate_invoices)?;
        let mut state = self.write();
        let invoices: HashSet<InvoiceId> =
            state.order::<O>(order)?.invoices().iter().copied().collect();

        for invoice_id in domain_invoices {
            if !invoices.contains(invoice_id) {
                return Err(DomainError::validation(format!(
                    "invoice {invoice_id} does not belong to {} {order}",
                    O::LABEL
                )));
            }
            state
                .invoice_mut(*invoice_id)?
                .resolve(recreate_invoices.contains(invoice_id))?;
        }
        state.order_mut::<O>(order)?.bump();
        O::refresh(&mut state, order)
    }
}
