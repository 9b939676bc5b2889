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
    /// Purchase order identifier.
    PurchaseId
);

record_id!(
    /// Purchase line identifier.
    PurchaseLineId
);

/// Purchase order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub id: PurchaseLineId,
    pub line_type: LineType,
    pub product: Option<ProductId>,
    pub description: String,
    pub quantity: f64,
    pub unit: Option<UomId>,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: i64,
    pub moves: Vec<MoveId>,
}

impl PurchaseLine {
    pub fn product_line(
        product: ProductId,
        description: impl Into<String>,
        quantity: f64,
        unit: UomId,
        unit_price: i64,
    ) -> Self {
        Self {
            id: PurchaseLineId::generate(),
            line_type: LineType::Line,
            product: Some(product),
            description: description.into(),
            quantity,
            unit: Some(unit),
            unit_price,
            moves: Vec::new(),
        }
    }

    pub fn layout(line_type: LineType, description: impl Into<String>) -> Self {
        Self {
            id: PurchaseLineId::generate(),
            line_type,
            product: None,
            description: description.into(),
            quantity: 0.0,
            unit: None,
            unit_price: 0,
            moves: Vec::new(),
        }
    }

    pub fn origin(&self) -> AggregateId {
        self.id.0
    }

    pub fn duplicate(&self, quantity: f64, unit: Option<UomId>) -> Self {
        Self {
            id: PurchaseLineId::generate(),
            quantity,
            unit,
            moves: Vec::new(),
            ..self.clone()
        }
    }
}

/// Aggregate root: PurchaseOrder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    id: PurchaseId,
    company: CompanyId,
    pub number: Option<String>,
    pub reference: Option<String>,
    state: OrderState,
    pub purchase_date: Option<NaiveDate>,
    lines: Vec<PurchaseLine>,
    pub shipments: Vec<ShipmentId>,
    pub shipment_returns: Vec<ShipmentId>,
    pub invoices: Vec<InvoiceId>,
    /// Ignored moves already carried into a follow-up order.
    pub followed_up_moves: Vec<MoveId>,
    version: u64,
}

impl PurchaseOrder {
    pub fn new(company: CompanyId) -> Self {
        Self {
            id: PurchaseId::generate(),
            company,
            number: None,
            reference: None,
            state: OrderState::Draft,
            purchase_date: None,
            lines: Vec::new(),
            shipments: Vec::new(),
            shipment_returns: Vec::new(),
            invoices: Vec::new(),
            followed_up_moves: Vec::new(),
            version: 0,
        }
    }

    pub fn id_typed(&self) -> PurchaseId {
        self.id
    }

    pub fn company(&self) -> CompanyId {
        self.company
    }

    pub fn state(&self) -> OrderState {
        self.state
    }

    pub fn lines(&self) -> &[PurchaseLine] {
        &self.lines
    }

    pub fn line_mut(&mut self, id: PurchaseLineId) -> DomainResult<&mut PurchaseLine> {
        self.lines
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| DomainError::not_found(format!("purchase line {id}")))
    }

    pub fn add_line(&mut self, line: PurchaseLine) -> DomainResult<PurchaseLineId> {
        if !matches!(self.state, OrderState::Draft | OrderState::Quotation) {
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

    pub fn transition(&mut self, workflow: &Workflow, to: OrderState) -> DomainResult<()> {
        workflow.check(self.state, to)?;
        if to == OrderState::Confirmed && self.lines.is_empty() {
            return Err(DomainError::validation("cannot confirm order without lines"));
        }
        self.state = to;
        self.version += 1;
        Ok(())
    }

    /// Draft copy of the order header: no lines, no documents.
    pub fn duplicate(&self) -> Self {
        Self {
            id: PurchaseId::generate(),
            number: None,
            state: OrderState::Draft,
            purchase_date: None,
            lines: Vec::new(),
            shipments: Vec::new(),
            shipment_returns: Vec::new(),
            invoices: Vec::new(),
            followed_up_moves: Vec::new(),
            version: 0,
            ..self.clone()
        }
    }

    pub fn push_copied_line(&mut self, line: PurchaseLine) {
        self.lines.push(line);
        self.version += 1;
    }

    pub fn touch(&mut self) {
        self.version += 1;
    }
}

impl AggregateRoot for PurchaseOrder {
    type Id = PurchaseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Entity for PurchaseOrder {
    type Id = PurchaseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn rec_name(&self) -> String {
        match &self.number {
            Some(number) => number.clone(),
            None => format!("({})", self.id),
        }
    }
}
