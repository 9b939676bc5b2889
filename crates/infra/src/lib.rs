//! Infrastructure adapters.
//!
//! [`erp::InMemoryErp`] implements every service the revoke procedures
//! consume, on top of a single in-memory (JSON serializable) state. It is
//! used by the scenario tests and by the `forgeerp-exception-sweep` binary.

pub mod erp;

pub use erp::{ErpState, InMemoryErp};
