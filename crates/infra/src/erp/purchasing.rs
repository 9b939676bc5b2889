//! Purchase processing and supplier shipments.

use forgeerp_core::{DomainError, DomainResult, OrderState, Workflow};
use forgeerp_purchasing::{PurchaseId, PurchaseOrder};
use forgeerp_revoke::RevocableOrder;
use forgeerp_stock::{
    Move, MoveCollection, MoveId, MoveState, Shipment, ShipmentId, ShipmentKind, ShipmentState,
};

use super::{ErpState, InMemoryErp};

impl ErpState {
    /// Create the draft stock moves of a confirmed purchase.
    ///
    /// Moves are not put on shipments; the warehouse groups them into
    /// supplier shipments when goods arrive.
    fn process_purchase(&mut self, id: PurchaseId) -> DomainResult<()> {
        let workflow = Workflow::base();
        let purchase = self.order::<PurchaseOrder>(id)?;
        match purchase.state() {
            OrderState::Confirmed => {}
            OrderState::Processing => return Ok(()),
            other => {
                return Err(DomainError::invariant(format!(
                    "purchase \"{}\" is {other} and cannot be processed",
                    purchase.rec_name()
                )));
            }
        }

        let mut moves = Vec::new();
        for line in purchase.lines() {
            let Some(product) = line.product.filter(|_| line.line_type.is_orderable()) else {
                continue;
            };
            let product = self.product(product)?;
            if !product.is_stockable() || line.quantity == 0.0 || !line.moves.is_empty() {
                continue;
            }
            let unit = line.unit.unwrap_or_else(|| product.purchase_uom());
            moves.push(
                Move::new(product.id, product.name.clone(), line.quantity.abs(), unit)
                    .with_origin(line.origin()),
            );
        }
        for mv in moves {
            self.moves.insert(mv.id, mv.clone());
            self.attach_line_move(&mv)?;
        }
        self.order_mut::<PurchaseOrder>(id)?
            .transition(&workflow, OrderState::Processing)
    }
}

/// Purchase entry and supplier shipments.
impl InMemoryErp {
    pub fn add_purchase(&self, purchase: PurchaseOrder) -> PurchaseId {
        let id = purchase.id_typed();
        self.write().purchases.insert(id, purchase);
        id
    }

    pub fn purchase(&self, id: PurchaseId) -> DomainResult<PurchaseOrder> {
        self.read().order::<PurchaseOrder>(id).cloned()
    }

    /// Quote and confirm a draft purchase, numbering it on the way.
    pub fn confirm_purchase(&self, id: PurchaseId) -> DomainResult<()> {
        let workflow = Workflow::base();
        let mut state = self.write();
        let number = state.next_number("P-");
        let purchase = state.order_mut::<PurchaseOrder>(id)?;
        purchase.transition(&workflow, OrderState::Quotation)?;
        purchase.transition(&workflow, OrderState::Confirmed)?;
        purchase.number.get_or_insert(number);
        Ok(())
    }

    pub fn process_purchase(&self, id: PurchaseId) -> DomainResult<()> {
        self.write().process_purchase(id)
    }

    /// Group draft moves of a purchase into a new draft supplier shipment.
    ///
    /// `kind` must be [`ShipmentKind::SupplierIn`] (moves become incoming
    /// moves) or [`ShipmentKind::SupplierReturn`] (moves become outgoing).
    pub fn add_supplier_shipment(
        &self,
        purchase: PurchaseId,
        kind: ShipmentKind,
        moves: &[MoveId],
    ) -> DomainResult<ShipmentId> {
        let collection = match kind {
            ShipmentKind::SupplierIn => MoveCollection::Incoming,
            ShipmentKind::SupplierReturn => MoveCollection::Outgoing,
            other => {
                return Err(DomainError::validation(format!(
                    "{other:?} is not a supplier shipment"
                )));
            }
        };
        let mut state = self.write();
        let line_moves = state.order::<PurchaseOrder>(purchase)?.line_moves();
        let mut grouped = Vec::with_capacity(moves.len());
        for move_id in moves {
            let mv = state.stock_move(*move_id)?;
            if !line_moves.contains(move_id) || mv.shipment.is_some() {
                return Err(DomainError::validation(format!(
                    "move {move_id} cannot be shipped for purchase {purchase}"
                )));
            }
            grouped.push((collection, mv.clone()));
        }

        let prefix = if collection == MoveCollection::Incoming {
            "IN-"
        } else {
            "RTN-"
        };
        let number = state.next_number(prefix);
        let shipment = state.insert_shipment(Shipment::new(kind, number), grouped);
        let order = state.order_mut::<PurchaseOrder>(purchase)?;
        if collection == MoveCollection::Incoming {
            order.shipments.push(shipment);
        } else {
            order.shipment_returns.push(shipment);
        }
        order.touch();
        Ok(shipment)
    }

    /// Receive a draft supplier shipment: its incoming moves are done.
    pub fn receive_shipment(&self, id: ShipmentId) -> DomainResult<()> {
        let mut state = self.write();
        let shipment = state.shipment_mut(id)?;
        if shipment.kind != ShipmentKind::SupplierIn || shipment.state != ShipmentState::Draft {
            return Err(DomainError::invariant(format!(
                "shipment \"{}\" cannot be received",
                shipment.number
            )));
        }
        shipment.state = ShipmentState::Received;
        let moves = shipment.incoming_moves.clone();
        for move_id in moves {
            state.stock_move_mut(move_id)?.state = MoveState::Done;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgeerp_core::CompanyId;
    use forgeerp_products::{Product, Uom, UomCategoryId};
    use forgeerp_purchasing::PurchaseLine;
    use forgeerp_revoke::StockService;

    fn confirmed_purchase(erp: &InMemoryErp) -> PurchaseId {
        let unit = erp.add_uom(Uom::new("Unit", "u", UomCategoryId::generate(), 1.0));
        let product = erp.add_product(Product::new("Bolt", unit));
        let mut purchase = PurchaseOrder::new(CompanyId::new());
        purchase
            .add_line(PurchaseLine::product_line(product, "Bolt", 50.0, unit, 3))
            .unwrap();
        let id = erp.add_purchase(purchase);
        erp.confirm_purchase(id).unwrap();
        id
    }

    #[test]
    fn processing_creates_draft_line_moves() {
        let erp = InMemoryErp::new();
        let id = confirmed_purchase(&erp);
        erp.process_purchase(id).unwrap();

        let purchase = erp.purchase(id).unwrap();
        assert_eq!(purchase.state(), OrderState::Processing);
        let moves = purchase.line_moves();
        assert_eq!(moves.len(), 1);
        let mv = erp.stock_move(moves[0]).unwrap();
        assert_eq!(mv.state, MoveState::Draft);
        assert_eq!(mv.quantity, 50.0);
        assert_eq!(mv.shipment, None);
    }

    #[test]
    fn received_shipments_complete_their_moves() {
        let erp = InMemoryErp::new();
        let id = confirmed_purchase(&erp);
        erp.process_purchase(id).unwrap();
        let moves = erp.purchase(id).unwrap().line_moves();

        let shipment = erp
            .add_supplier_shipment(id, ShipmentKind::SupplierIn, &moves)
            .unwrap();
        erp.receive_shipment(shipment).unwrap();

        assert_eq!(erp.purchase(id).unwrap().shipments, vec![shipment]);
        assert_eq!(erp.shipment(shipment).unwrap().state, ShipmentState::Received);
        assert_eq!(erp.stock_move(moves[0]).unwrap().state, MoveState::Done);
    }

    #[test]
    fn moves_cannot_be_shipped_twice() {
        let erp = InMemoryErp::new();
        let id = confirmed_purchase(&erp);
        erp.process_purchase(id).unwrap();
        let moves = erp.purchase(id).unwrap().line_moves();

        erp.add_supplier_shipment(id, ShipmentKind::SupplierIn, &moves)
            .unwrap();
        let err = erp
            .add_supplier_shipment(id, ShipmentKind::SupplierReturn, &moves)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
