//! `forgeerp-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the order,
//! stock and invoicing modules (no infrastructure concerns).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod line;
pub mod resolution;
pub mod workflow;

pub use aggregate::AggregateRoot;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, CompanyId};
pub use line::LineType;
pub use resolution::Resolution;
pub use workflow::{OrderState, Workflow};
