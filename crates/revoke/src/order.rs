//! The view of an order the revoke procedures work on.
//!
//! Sale and purchase orders differ in which shipments they own, which unit
//! their lines use and which guard rules apply; everything else is shared.

use core::fmt::{Debug, Display};
use core::hash::Hash;

use forgeerp_core::{AggregateId, Entity, LineType, OrderState};
use forgeerp_invoicing::InvoiceId;
use forgeerp_products::{Product, ProductId, UomId};
use forgeerp_purchasing::{PurchaseId, PurchaseLine, PurchaseOrder};
use forgeerp_sales::{SaleId, SaleLine, SaleOrder};
use forgeerp_stock::{MoveId, ShipmentId};

/// Order variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderKind {
    Sale,
    Purchase,
}

pub trait OrderLineView {
    /// Id stamped as origin on the line's stock moves.
    fn origin(&self) -> AggregateId;
    fn line_type(&self) -> LineType;
    fn product(&self) -> Option<ProductId>;
    fn moves(&self) -> &[MoveId];
}

pub trait RevocableOrder: Clone + Debug {
    type Id: Copy + Eq + Hash + Debug + Display;
    type Line: OrderLineView + Clone + Debug;

    const KIND: OrderKind;

    fn order_id(&self) -> Self::Id;
    fn rec_name(&self) -> String;
    fn state(&self) -> OrderState;
    fn lines(&self) -> &[Self::Line];
    fn shipments(&self) -> &[ShipmentId];
    fn shipment_returns(&self) -> &[ShipmentId];
    fn invoices(&self) -> &[InvoiceId];
    fn followed_up_moves(&self) -> &[MoveId];

    /// Unit in which lines of this order kind express quantities of `product`.
    fn order_uom(product: &Product) -> UomId;

    /// Every stock move of every line, in line order.
    fn line_moves(&self) -> Vec<MoveId> {
        self.lines()
            .iter()
            .flat_map(|l| l.moves().iter().copied())
            .collect()
    }
}

impl OrderLineView for SaleLine {
    fn origin(&self) -> AggregateId {
        SaleLine::origin(self)
    }

    fn line_type(&self) -> LineType {
        self.line_type
    }

    fn product(&self) -> Option<ProductId> {
        self.product
    }

    fn moves(&self) -> &[MoveId] {
        &self.moves
    }
}

impl RevocableOrder for SaleOrder {
    type Id = SaleId;
    type Line = SaleLine;

    const KIND: OrderKind = OrderKind::Sale;

    fn order_id(&self) -> SaleId {
        self.id_typed()
    }

    fn rec_name(&self) -> String {
        Entity::rec_name(self)
    }

    fn state(&self) -> OrderState {
        SaleOrder::state(self)
    }

    fn lines(&self) -> &[SaleLine] {
        SaleOrder::lines(self)
    }

    fn shipments(&self) -> &[ShipmentId] {
        &self.shipments
    }

    fn shipment_returns(&self) -> &[ShipmentId] {
        &self.shipment_returns
    }

    fn invoices(&self) -> &[InvoiceId] {
        &self.invoices
    }

    fn followed_up_moves(&self) -> &[MoveId] {
        &self.followed_up_moves
    }

    fn order_uom(product: &Product) -> UomId {
        product.sale_uom()
    }
}

impl OrderLineView for PurchaseLine {
    fn origin(&self) -> AggregateId {
        PurchaseLine::origin(self)
    }

    fn line_type(&self) -> LineType {
        self.line_type
    }

    fn product(&self) -> Option<ProductId> {
        self.product
    }

    fn moves(&self) -> &[MoveId] {
        &self.moves
    }
}

impl RevocableOrder for PurchaseOrder {
    type Id = PurchaseId;
    type Line = PurchaseLine;

    const KIND: OrderKind = OrderKind::Purchase;

    fn order_id(&self) -> PurchaseId {
        self.id_typed()
    }

    fn rec_name(&self) -> String {
        Entity::rec_name(self)
    }

    fn state(&self) -> OrderState {
        PurchaseOrder::state(self)
    }

    fn lines(&self) -> &[PurchaseLine] {
        PurchaseOrder::lines(self)
    }

    fn shipments(&self) -> &[ShipmentId] {
        &self.shipments
    }

    fn shipment_returns(&self) -> &[ShipmentId] {
        &self.shipment_returns
    }

    fn invoices(&self) -> &[InvoiceId] {
        &self.invoices
    }

    fn followed_up_moves(&self) -> &[MoveId] {
        &self.followed_up_moves
    }

    fn order_uom(product: &Product) -> UomId {
        product.purchase_uom()
    }
}
