//! Errors raised by the revoke procedures.

use thiserror::Error;

use forgeerp_core::{DomainError, OrderState};

pub type RevokeResult<T> = Result<T, RevokeError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RevokeError {
    /// Shipments or moves of the order are being handled physically.
    #[error("cannot revoke \"{record}\" because it has moves or shipments in progress: {names}")]
    MovesInProgress { record: String, names: String },

    /// Invoices of the order are neither draft nor settled.
    #[error("cannot revoke \"{record}\" because it has invoices in progress: {names}")]
    InvoicesInProgress { record: String, names: String },

    /// Only confirmed or processing orders can be revoked.
    #[error("cannot revoke \"{record}\" in state {state}")]
    NotRevocable { record: String, state: OrderState },

    #[error(transparent)]
    Domain(#[from] DomainError),
}
