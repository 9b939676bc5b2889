//! Units of measure and quantity conversion.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use forgeerp_core::{DomainError, DomainResult, record_id};

record_id!(
    /// Unit of measure identifier.
    UomId
);

record_id!(
    /// Unit category identifier (units only convert within a category).
    UomCategoryId
);

/// Unit of measure.
///
/// `factor` is the size of the unit expressed in the reference unit of its
/// category (the reference unit has factor 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Uom {
    pub id: UomId,
    pub name: String,
    pub symbol: String,
    pub category: UomCategoryId,
    pub factor: f64,
    /// Rounding precision applied by rounded conversions.
    pub rounding: f64,
}

impl Uom {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        category: UomCategoryId,
        factor: f64,
    ) -> Self {
        Self {
            id: UomId::generate(),
            name: name.into(),
            symbol: symbol.into(),
            category,
            factor,
            rounding: 1.0,
        }
    }

    /// Round `quantity` to the unit precision.
    pub fn round(&self, quantity: f64) -> f64 {
        if self.rounding <= 0.0 {
            return quantity;
        }
        (quantity / self.rounding).round() * self.rounding
    }
}

/// Unit conversion service.
pub trait UomConverter {
    /// Convert `quantity` expressed in `from` to `to`.
    ///
    /// Conversion is linear; `round = false` keeps the exact fractional value.
    fn compute_qty(&self, from: UomId, quantity: f64, to: UomId, round: bool)
    -> DomainResult<f64>;
}

/// In-memory table of units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UomTable {
    units: HashMap<UomId, Uom>,
}

impl UomTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uom: Uom) -> UomId {
        let id = uom.id;
        self.units.insert(id, uom);
        id
    }

    pub fn get(&self, id: UomId) -> DomainResult<&Uom> {
        self.units
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("unit {id}")))
    }
}

impl UomConverter for UomTable {
    fn compute_qty(
        &self,
        from: UomId,
        quantity: f64,
        to: UomId,
        round: bool,
    ) -> DomainResult<f64> {
        if from == to {
            return Ok(quantity);
        }
        let from_uom = self.get(from)?;
        let to_uom = self.get(to)?;
        if from_uom.category != to_uom.category {
            return Err(DomainError::validation(format!(
                "cannot convert {} to {}: incompatible units",
                from_uom.name, to_uom.name
            )));
        }
        if to_uom.factor == 0.0 {
            return Err(DomainError::invariant(format!(
                "unit {} has a zero factor",
                to_uom.name
            )));
        }

        let amount = quantity * from_uom.factor / to_uom.factor;
        Ok(if round { to_uom.round(amount) } else { amount })
    }
}
