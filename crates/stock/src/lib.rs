//! Stock domain module (fulfillment records and shipments).
//!
//! This crate contains the state rules of stock moves and shipments,
//! implemented purely as deterministic domain logic (no IO, no storage).

pub mod stock_move;
pub mod shipment;

pub use stock_move::{Move, MoveId, MoveState};
pub use shipment::{MoveCollection, Shipment, ShipmentId, ShipmentKind, ShipmentState};
