//! Sale processing: shipments, invoices and progress.

use chrono::NaiveDate;
use tracing::debug;

use forgeerp_core::{CompanyId, DomainError, DomainResult, OrderState, Resolution, Workflow};
use forgeerp_invoicing::{Invoice, InvoiceId, InvoiceLine, InvoiceState};
use forgeerp_revoke::{RevocableOrder, SaleExceptionSource};
use forgeerp_sales::{
    InvoiceMethod, SaleId, SaleInvoiceState, SaleOrder, SaleShipmentState, ShipmentMethod,
    invoice_state, shipment_state,
};
use forgeerp_stock::{
    Move, MoveCollection, MoveId, MoveState, Shipment, ShipmentId, ShipmentKind, ShipmentState,
};

use super::{ErpState, InMemoryErp};

/// Move to put on a shipment, and whether it still has to be linked to its line.
type Planned = (Move, bool);

impl ErpState {
    /// Recompute the shipping and invoicing progress of a sale.
    pub(super) fn refresh_sale(&mut self, id: SaleId) -> DomainResult<()> {
        let sale = self.order::<SaleOrder>(id)?;
        let moves = sale
            .line_moves()
            .into_iter()
            .map(|m| self.stock_move(m))
            .collect::<DomainResult<Vec<_>>>()?;
        let invoices = sale
            .invoices
            .iter()
            .map(|i| self.invoice(*i))
            .collect::<DomainResult<Vec<_>>>()?;
        let shipping = shipment_state(moves);
        let invoicing = invoice_state(invoices);

        let sale = self.order_mut::<SaleOrder>(id)?;
        sale.shipment_state = shipping;
        sale.invoice_state = invoicing;
        Ok(())
    }

    pub(super) fn refresh_sales_invoicing(&mut self, invoice: InvoiceId) -> DomainResult<()> {
        let sales: Vec<SaleId> = self
            .sales
            .values()
            .filter(|s| s.invoices.contains(&invoice))
            .map(SaleOrder::id_typed)
            .collect();
        for id in sales {
            self.refresh_sale(id)?;
        }
        Ok(())
    }

    pub(super) fn refresh_sales_shipping(&mut self, shipment: ShipmentId) -> DomainResult<()> {
        let sales: Vec<SaleId> = self
            .sales
            .values()
            .filter(|s| s.shipments.contains(&shipment) || s.shipment_returns.contains(&shipment))
            .map(SaleOrder::id_typed)
            .collect();
        for id in sales {
            self.refresh_sale(id)?;
        }
        Ok(())
    }

    pub(super) fn refresh_sales_with_moves(&mut self, moves: &[MoveId]) -> DomainResult<()> {
        let sales: Vec<SaleId> = self
            .sales
            .values()
            .filter(|s| s.line_moves().iter().any(|m| moves.contains(m)))
            .map(SaleOrder::id_typed)
            .collect();
        for id in sales {
            self.refresh_sale(id)?;
        }
        Ok(())
    }

    fn process_sale(&mut self, id: SaleId) -> DomainResult<()> {
        let workflow = Workflow::base();
        let sale = self.order::<SaleOrder>(id)?;
        match sale.state() {
            OrderState::Confirmed => {
                self.order_mut::<SaleOrder>(id)?
                    .transition(&workflow, OrderState::Processing)?;
            }
            OrderState::Processing => {}
            OrderState::Done | OrderState::Cancelled => return Ok(()),
            other => {
                return Err(DomainError::invariant(format!(
                    "sale \"{}\" is {other} and cannot be processed",
                    sale.rec_name()
                )));
            }
        }

        if self.order::<SaleOrder>(id)?.invoice_method == InvoiceMethod::Order {
            self.invoice_sale(id)?;
        }
        self.refresh_sale(id)?;

        let sale = self.order::<SaleOrder>(id)?;
        let ship = match sale.shipment_method {
            ShipmentMethod::Order => true,
            ShipmentMethod::Invoice => sale.invoice_state == SaleInvoiceState::Paid,
            ShipmentMethod::Manual => false,
        };
        if ship {
            self.ship_sale(id)?;
        }
        self.refresh_sale(id)?;

        let sale = self.order::<SaleOrder>(id)?;
        let shipped = matches!(
            sale.shipment_state,
            SaleShipmentState::Sent | SaleShipmentState::None
        );
        let invoiced = matches!(
            sale.invoice_state,
            SaleInvoiceState::Paid | SaleInvoiceState::None
        );
        if shipped && invoiced {
            debug!(sale = %id, "sale fully shipped and invoiced");
            self.order_mut::<SaleOrder>(id)?
                .transition(&workflow, OrderState::Done)?;
        }
        Ok(())
    }

    /// Invoice every orderable line, unless a live or ignored invoice exists.
    fn invoice_sale(&mut self, id: SaleId) -> DomainResult<()> {
        let sale = self.order::<SaleOrder>(id)?;
        for invoice in &sale.invoices {
            let invoice = self.invoice(*invoice)?;
            let replaced = invoice.state == InvoiceState::Cancelled
                && invoice.resolution == Resolution::Recreated;
            if !replaced {
                return Ok(());
            }
        }
        let lines: Vec<InvoiceLine> = sale
            .lines()
            .iter()
            .filter(|l| l.line_type.is_orderable() && l.quantity != 0.0)
            .map(|l| InvoiceLine {
                product: l.product,
                description: l.description.clone(),
                quantity: l.quantity,
                unit_price: l.unit_price,
                stock_moves: Vec::new(),
            })
            .collect();
        if lines.is_empty() {
            return Ok(());
        }
        let invoice = self.insert_invoice(Invoice::new(lines));
        self.order_mut::<SaleOrder>(id)?.invoices.push(invoice);
        Ok(())
    }

    /// Put the unshipped quantities of the sale on new shipments.
    ///
    /// Lines without moves get fresh moves; recreated draft moves that are on
    /// no shipment yet are shipped as they are.
    fn ship_sale(&mut self, id: SaleId) -> DomainResult<()> {
        let sale = self.order::<SaleOrder>(id)?;
        let mut outgoing: Vec<Planned> = Vec::new();
        let mut incoming: Vec<Planned> = Vec::new();
        for line in sale.lines() {
            let Some(product) = line.product.filter(|_| line.line_type.is_orderable()) else {
                continue;
            };
            let product = self.product(product)?;
            if !product.is_stockable() || line.quantity == 0.0 {
                continue;
            }
            let planned = if line.quantity > 0.0 {
                &mut outgoing
            } else {
                &mut incoming
            };
            if line.moves.is_empty() {
                let unit = line.unit.unwrap_or_else(|| product.sale_uom());
                let mv = Move::new(product.id, product.name.clone(), line.quantity.abs(), unit)
                    .with_origin(line.origin());
                planned.push((mv, true));
                continue;
            }
            for move_id in &line.moves {
                let mv = self.stock_move(*move_id)?;
                if mv.state == MoveState::Draft && mv.shipment.is_none() {
                    planned.push((mv.clone(), false));
                }
            }
        }

        if !outgoing.is_empty() {
            let number = self.next_number("OUT-");
            let mut moves = Vec::with_capacity(outgoing.len() * 2);
            for (mv, _) in &outgoing {
                let inventory = Move {
                    id: MoveId::generate(),
                    origin: None,
                    ..mv.clone()
                };
                moves.push((MoveCollection::Inventory, inventory));
                moves.push((MoveCollection::Outgoing, mv.clone()));
            }
            let shipment = Shipment::new(ShipmentKind::CustomerOut, number)
                .with_state(ShipmentState::Waiting);
            let shipment = self.insert_shipment(shipment, moves);
            self.order_mut::<SaleOrder>(id)?.shipments.push(shipment);
        }
        if !incoming.is_empty() {
            let number = self.next_number("RET-");
            let moves = incoming
                .iter()
                .map(|(mv, _)| (MoveCollection::Incoming, mv.clone()))
                .collect();
            let shipment =
                self.insert_shipment(Shipment::new(ShipmentKind::CustomerReturn, number), moves);
            self.order_mut::<SaleOrder>(id)?.shipment_returns.push(shipment);
        }

        for (mv, fresh) in outgoing.iter().chain(&incoming) {
            if *fresh {
                self.attach_line_move(mv)?;
            }
        }
        Ok(())
    }
}

/// Sale entry and lookup.
impl InMemoryErp {
    pub fn add_sale(&self, sale: SaleOrder) -> SaleId {
        let id = sale.id_typed();
        self.write().sales.insert(id, sale);
        id
    }

    pub fn sale(&self, id: SaleId) -> DomainResult<SaleOrder> {
        self.read().order::<SaleOrder>(id).cloned()
    }

    /// Quote and confirm a draft sale, numbering it on the way.
    pub fn confirm_sale(&self, id: SaleId) -> DomainResult<()> {
        let workflow = Workflow::base();
        let mut state = self.write();
        let number = state.next_number("S-");
        let sale = state.order_mut::<SaleOrder>(id)?;
        sale.transition(&workflow, OrderState::Quotation)?;
        sale.transition(&workflow, OrderState::Confirmed)?;
        sale.number.get_or_insert(number);
        Ok(())
    }
}

impl SaleExceptionSource for InMemoryErp {
    fn find_exception_sales(
        &self,
        company: CompanyId,
        cutoff: NaiveDate,
    ) -> DomainResult<Vec<SaleId>> {
        let state = self.read();
        let mut found: Vec<(NaiveDate, SaleId)> = state
            .sales
            .values()
            .filter(|s| s.company() == company && s.state() == OrderState::Processing)
            .filter(|s| {
                s.shipment_state == SaleShipmentState::Exception
                    || s.invoice_state == SaleInvoiceState::Exception
            })
            .filter_map(|s| s.sale_date.filter(|d| *d <= cutoff).map(|d| (d, s.id_typed())))
            .collect();
        found.sort();
        Ok(found.into_iter().map(|(_, id)| id).collect())
    }

    fn process(&self, id: SaleId) -> DomainResult<()> {
        self.write().process_sale(id)
    }
}
