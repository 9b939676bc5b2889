//! Products domain module (catalog + units of measure).
//!
//! Products know their canonical sale and purchase units; quantities move
//! between units through a [`UomConverter`].

pub mod product;
pub mod uom;

pub use product::{Product, ProductId, ProductKind};
pub use uom::{Uom, UomCategoryId, UomConverter, UomId, UomTable};
