//! Sales Orders domain module.
//!
//! This crate contains business rules for sale orders, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod configuration;
pub mod order;
pub mod progress;

pub use configuration::{DEFAULT_EXCEPTION_MARGIN_DAYS, SaleConfiguration};
pub use order::{
    InvoiceMethod, SaleId, SaleInvoiceState, SaleLine, SaleLineId, SaleOrder,
    SaleShipmentState, ShipmentMethod,
};
pub use progress::{invoice_state, shipment_state};
