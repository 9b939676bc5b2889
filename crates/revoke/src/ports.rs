//! Services of the ERP consumed by the revoke procedures.
//!
//! Implementations live in the infrastructure layer; the procedures only
//! depend on these contracts.

use chrono::NaiveDate;

use forgeerp_core::{CompanyId, DomainResult, OrderState, Workflow};
use forgeerp_invoicing::{Invoice, InvoiceId};
use forgeerp_products::{Product, ProductId, UomConverter, UomId};
use forgeerp_sales::SaleId;
use forgeerp_stock::{Move, MoveId, Shipment, ShipmentId};

use crate::order::RevocableOrder;

/// Field overrides applied when copying an order line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineOverrides {
    pub quantity: f64,
    pub unit: UomId,
}

/// Order persistence.
pub trait OrderRepository<O: RevocableOrder> {
    fn load(&self, id: O::Id) -> DomainResult<O>;

    /// Move the order to `to`, checked against `workflow`.
    fn transition(&self, id: O::Id, to: OrderState, workflow: &Workflow) -> DomainResult<()>;

    /// Copy the order header (without lines) as a new draft order.
    fn copy_order(&self, id: O::Id) -> DomainResult<O::Id>;

    /// Copy `line` onto the order `target`, overriding quantity and unit.
    fn copy_line(&self, line: &O::Line, target: O::Id, overrides: LineOverrides)
    -> DomainResult<()>;

    /// Remember that `moves` were carried into a follow-up order.
    fn record_follow_up(&self, id: O::Id, moves: &[MoveId]) -> DomainResult<()>;
}

/// Shipments and stock moves.
pub trait StockService {
    fn shipment(&self, id: ShipmentId) -> DomainResult<Shipment>;
    fn stock_move(&self, id: MoveId) -> DomainResult<Move>;

    /// Put waiting shipments back to draft.
    fn draft_shipments(&self, ids: &[ShipmentId]) -> DomainResult<()>;
    /// Cancel draft shipments; no-op for cancelled ones.
    fn cancel_shipments(&self, ids: &[ShipmentId]) -> DomainResult<()>;
    /// Cancel draft moves.
    fn cancel_moves(&self, ids: &[MoveId]) -> DomainResult<()>;
}

/// Invoices.
pub trait InvoiceService {
    fn invoice(&self, id: InvoiceId) -> DomainResult<Invoice>;
    /// Cancel draft invoices; no-op for cancelled ones.
    fn cancel_invoices(&self, ids: &[InvoiceId]) -> DomainResult<()>;
}

pub trait ProductCatalog {
    fn product(&self, id: ProductId) -> DomainResult<Product>;
}

/// Reconciles an order against its cancelled records.
///
/// Every record of the domain is classified: those in the recreate subset as
/// recreated, the others as ignored. With an empty recreate subset nothing
/// else changes.
pub trait ExceptionResolver<O: RevocableOrder> {
    fn handle_shipment_exception(
        &self,
        order: O::Id,
        domain_moves: &[MoveId],
        recreate_moves: &[MoveId],
    ) -> DomainResult<()>;

    fn handle_invoice_exception(
        &self,
        order: O::Id,
        domain_invoices: &[InvoiceId],
        recreate_invoices: &[InvoiceId],
    ) -> DomainResult<()>;
}

/// Transaction boundary: the changes made by `work` are committed when it
/// succeeds and rolled back when it fails.
pub trait UnitOfWork {
    fn atomically<T, E>(&self, work: impl FnOnce() -> Result<T, E>) -> Result<T, E>;
}

/// Sale-side services used by the exception sweep.
pub trait SaleExceptionSource {
    /// Processing sales of `company` dated on or before `cutoff` whose
    /// shipments or invoices are in exception, oldest first.
    fn find_exception_sales(&self, company: CompanyId, cutoff: NaiveDate)
    -> DomainResult<Vec<SaleId>>;

    /// Run the regular processing step of the sale.
    fn process(&self, id: SaleId) -> DomainResult<()>;
}

/// Everything the procedures need for orders of type `O`.
pub trait Platform<O: RevocableOrder>:
    OrderRepository<O>
    + StockService
    + InvoiceService
    + ProductCatalog
    + ExceptionResolver<O>
    + UnitOfWork
    + UomConverter
{
}

impl<O, T> Platform<O> for T
where
    O: RevocableOrder,
    T: OrderRepository<O>
        + StockService
        + InvoiceService
        + ProductCatalog
        + ExceptionResolver<O>
        + UnitOfWork
        + UomConverter,
{
}
