use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use forgeerp_core::{
    AggregateId, AggregateRoot, CompanyId, DomainError, DomainResult, Entity, LineType,
    OrderState, Workflow, record_id,
};
use forgeerp_invoicing::InvoiceId;
use forgeerp_products::{ProductId, UomId};
use forgeerp_stock::{MoveId, ShipmentId};

record_id!(
    /// Sale order identifier.
    SaleId
);

record_id!(
    /// Sale line identifier.
    SaleLineId
);

/// When shipments are created for a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipmentMethod {
    Manual,
    #[default]
    Order,
    Invoice,
}

/// When invoices are created for a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceMethod {
    Manual,
    #[default]
    Order,
    Shipment,
}

/// Shipping progress of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleShipmentState {
    #[default]
    None,
    Waiting,
    Sent,
    Exception,
}

/// Invoicing progress of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleInvoiceState {
    #[default]
    None,
    Pending,
    Paid,
    Exception,
}

/// Sale order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
    pub id: SaleLineId,
    pub line_type: LineType,
    pub product: Option<ProductId>,
    pub description: String,
    pub quantity: f64,
    pub unit: Option<UomId>,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: i64,
    /// Stock moves generated for the line.
    pub moves: Vec<MoveId>,
}

impl SaleLine {
    pub fn product_line(
        product: ProductId,
        description: impl Into<String>,
        quantity: f64,
        unit: UomId,
        unit_price: i64,
    ) -> Self {
        Self {
            id: SaleLineId::generate(),
            line_type: LineType::Line,
            product: Some(product),
            description: description.into(),
            quantity,
            unit: Some(unit),
            unit_price,
            moves: Vec::new(),
        }
    }

    pub fn comment(description: impl Into<String>) -> Self {
        Self {
            id: SaleLineId::generate(),
            line_type: LineType::Comment,
            product: None,
            description: description.into(),
            quantity: 0.0,
            unit: None,
            unit_price: 0,
            moves: Vec::new(),
        }
    }

    /// Id stamped on the stock moves of the line.
    pub fn origin(&self) -> AggregateId {
        self.id.0
    }

    /// Copy of the line for another order, with its own quantity and unit.
    pub fn duplicate(&self, quantity: f64, unit: Option<UomId>) -> Self {
        Self {
            id: SaleLineId::generate(),
            quantity,
            unit,
            moves: Vec::new(),
            ..self.clone()
        }
    }
}

/// Aggregate root: SaleOrder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleOrder {
    id: SaleId,
    company: CompanyId,
    pub number: Option<String>,
    pub reference: Option<String>,
    state: OrderState,
    pub sale_date: Option<NaiveDate>,
    pub shipment_method: ShipmentMethod,
    pub invoice_method: InvoiceMethod,
    lines: Vec<SaleLine>,
    pub shipments: Vec<ShipmentId>,
    pub shipment_returns: Vec<ShipmentId>,
    pub invoices: Vec<InvoiceId>,
    pub shipment_state: SaleShipmentState,
    pub invoice_state: SaleInvoiceState,
    /// Ignored moves already carried into a follow-up order.
    pub followed_up_moves: Vec<MoveId>,
    version: u64,
}

impl SaleOrder {
    pub fn new(company: CompanyId) -> Self {
        Self {
            id: SaleId::generate(),
            company,
            number: None,
            reference: None,
            state: OrderState::Draft,
            sale_date: None,
            shipment_method: ShipmentMethod::default(),
            invoice_method: InvoiceMethod::default(),
            lines: Vec::new(),
            shipments: Vec::new(),
            shipment_returns: Vec::new(),
            invoices: Vec::new(),
            shipment_state: SaleShipmentState::None,
            invoice_state: SaleInvoiceState::None,
            followed_up_moves: Vec::new(),
            version: 0,
        }
    }

    pub fn id_typed(&self) -> SaleId {
        self.id
    }

    pub fn company(&self) -> CompanyId {
        self.company
    }

    pub fn state(&self) -> OrderState {
        self.state
    }

    pub fn lines(&self) -> &[SaleLine] {
        &self.lines
    }

    pub fn line_mut(&mut self, id: SaleLineId) -> DomainResult<&mut SaleLine> {
        self.lines
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| DomainError::not_found(format!("sale line {id}")))
    }

    pub fn is_modifiable(&self) -> bool {
        matches!(self.state, OrderState::Draft | OrderState::Quotation)
    }

    pub fn add_line(&mut self, line: SaleLine) -> DomainResult<SaleLineId> {
        if !self.is_modifiable() {
            return Err(DomainError::invariant(
                "cannot modify order once it is confirmed",
            ));
        }
        if line.line_type.is_orderable() && line.product.is_none() {
            return Err(DomainError::validation("product line without product"));
        }
        let id = line.id;
        self.lines.push(line);
        self.version += 1;
        Ok(id)
    }

    /// Move the order to `to`, if `workflow` allows it.
    pub fn transition(&mut self, workflow: &Workflow, to: OrderState) -> DomainResult<()> {
        workflow.check(self.state, to)?;
        if to == OrderState::Confirmed && self.lines.is_empty() {
            return Err(DomainError::validation("cannot confirm order without lines"));
        }
        self.state = to;
        self.version += 1;
        Ok(())
    }

    /// Draft copy of the order header: no lines, no documents, fresh progress.
    pub fn duplicate(&self) -> Self {
        Self {
            id: SaleId::generate(),
            number: None,
            state: OrderState::Draft,
            sale_date: None,
            lines: Vec::new(),
            shipments: Vec::new(),
            shipment_returns: Vec::new(),
            invoices: Vec::new(),
            shipment_state: SaleShipmentState::None,
            invoice_state: SaleInvoiceState::None,
            followed_up_moves: Vec::new(),
            version: 0,
            ..self.clone()
        }
    }

    /// Attach a line to a duplicated order, bypassing the draft-only rule of
    /// [`SaleOrder::add_line`].
    pub fn push_copied_line(&mut self, line: SaleLine) {
        self.lines.push(line);
        self.version += 1;
    }

    /// Bump the version after a persisted change of a related record.
    pub fn touch(&mut self) {
        self.version += 1;
    }
}

impl AggregateRoot for SaleOrder {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Entity for SaleOrder {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn rec_name(&self) -> String {
        match (&self.number, &self.reference) {
            (Some(number), Some(reference)) => format!("{number}[{reference}]"),
            (Some(number), None) => number.clone(),
            (None, _) => format!("({})", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_order() -> SaleOrder {
        let mut order = SaleOrder::new(CompanyId::new());
        order
            .add_line(SaleLine::product_line(
                ProductId::generate(),
                "Widget",
                2.0,
                UomId::generate(),
                1000,
            ))
            .unwrap();
        order
    }

    #[test]
    fn full_lifecycle_draft_to_processing() {
        let workflow = Workflow::base();
        let mut order = test_order();
        order.transition(&workflow, OrderState::Quotation).unwrap();
        order.transition(&workflow, OrderState::Confirmed).unwrap();
        order.transition(&workflow, OrderState::Processing).unwrap();
        assert_eq!(order.state(), OrderState::Processing);
        assert_eq!(order.version(), 4);
    }

    #[test]
    fn cannot_modify_confirmed_order() {
        let workflow = Workflow::base();
        let mut order = test_order();
        order.transition(&workflow, OrderState::Quotation).unwrap();
        order.transition(&workflow, OrderState::Confirmed).unwrap();

        let err = order.add_line(SaleLine::comment("late")).unwrap_err();
        assert_eq!(
            err,
            DomainError::invariant("cannot modify order once it is confirmed")
        );
    }

    #[test]
    fn cannot_confirm_order_without_lines() {
        let workflow = Workflow::base();
        let mut order = SaleOrder::new(CompanyId::new());
        order.transition(&workflow, OrderState::Quotation).unwrap();
        let err = order
            .transition(&workflow, OrderState::Confirmed)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn transitions_outside_the_workflow_are_rejected() {
        let mut order = test_order();
        let err = order
            .transition(&Workflow::base(), OrderState::Done)
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(order.state(), OrderState::Draft);
    }

    #[test]
    fn duplicate_starts_a_fresh_draft_without_lines() {
        let workflow = Workflow::base();
        let mut order = test_order();
        order.number = Some("S-1".to_string());
        order.reference = Some("PO-77".to_string());
        order.transition(&workflow, OrderState::Quotation).unwrap();
        order.shipments.push(ShipmentId::generate());

        let copy = order.duplicate();
        assert_ne!(copy.id_typed(), order.id_typed());
        assert_eq!(copy.state(), OrderState::Draft);
        assert!(copy.lines().is_empty());
        assert!(copy.shipments.is_empty());
        assert_eq!(copy.number, None);
        assert_eq!(copy.reference.as_deref(), Some("PO-77"));
        assert_eq!(copy.company(), order.company());
    }

    #[test]
    fn duplicated_line_gets_new_quantity_and_no_moves() {
        let mut line =
            SaleLine::product_line(ProductId::generate(), "Widget", 10.0, UomId::generate(), 5);
        line.moves.push(MoveId::generate());
        let unit = UomId::generate();

        let copy = line.duplicate(7.0, Some(unit));
        assert_ne!(copy.id, line.id);
        assert_eq!(copy.quantity, 7.0);
        assert_eq!(copy.unit, Some(unit));
        assert!(copy.moves.is_empty());
        assert_eq!(copy.product, line.product);
    }

    #[test]
    fn rec_name_prefers_number() {
        let mut order = test_order();
        assert!(order.rec_name().starts_with('('));
        order.number = Some("S-9".to_string());
        assert_eq!(order.rec_name(), "S-9");
    }
}
