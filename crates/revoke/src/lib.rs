//! Order revocation for sale and purchase orders.
//!
//! - [`guard`]: decides whether an order can be revoked.
//! - [`revoke`]: unwinds a confirmed/processing order (cancels unstarted
//!   shipments, moves and, for sales, invoices) and reconciles the cancelled
//!   records as ignored.
//! - [`pending`]: builds follow-up orders for the ignored quantities.
//! - [`sweep`]: periodic best-effort fix of sales stuck in exception.
//!
//! The ERP services these procedures drive (cancellation, exception
//! handling, copies, unit conversion) are consumed through the traits of
//! [`ports`].

pub mod buttons;
pub mod error;
pub mod guard;
pub mod order;
pub mod pending;
pub mod ports;
pub mod revoke;
pub mod sweep;

pub use buttons::{create_pending_moves_visible, revoke_visible};
pub use error::{RevokeError, RevokeResult};
pub use guard::{GuardPolicy, ShipmentSet};
pub use order::{OrderKind, OrderLineView, RevocableOrder};
pub use pending::{PendingMovesCreator, aggregate_ignored, ignored_moves};
pub use ports::{
    ExceptionResolver, InvoiceService, LineOverrides, OrderRepository, Platform, ProductCatalog,
    SaleExceptionSource, StockService, UnitOfWork,
};
pub use revoke::{RevokeOptions, RevokeOutcome, Revoker, revoke_workflow};
pub use sweep::{ExceptionSweep, SweepConfig, SweepReport, SweepStep};
