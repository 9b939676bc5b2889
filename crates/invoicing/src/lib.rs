//! Invoicing domain module.
//!
//! This crate contains the state rules of customer/supplier invoices,
//! implemented purely as deterministic domain logic (no IO, no storage).

pub mod invoice;

pub use invoice::{Invoice, InvoiceId, InvoiceLine, InvoiceState};
