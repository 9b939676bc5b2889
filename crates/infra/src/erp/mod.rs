//! In-memory ERP.

mod invoicing;
mod orders;
mod purchasing;
mod sales;
mod stock;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use forgeerp_core::{DomainError, DomainResult};
use forgeerp_invoicing::{Invoice, InvoiceId};
use forgeerp_products::{Product, ProductId, Uom, UomConverter, UomId, UomTable};
use forgeerp_purchasing::{PurchaseId, PurchaseOrder};
use forgeerp_revoke::{ProductCatalog, UnitOfWork};
use forgeerp_sales::{SaleConfiguration, SaleId, SaleOrder};
use forgeerp_stock::{Move, MoveId, Shipment, ShipmentId};

/// Every record of the in-memory ERP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErpState {
    pub uoms: UomTable,
    pub products: HashMap<ProductId, Product>,
    pub sales: HashMap<SaleId, SaleOrder>,
    pub purchases: HashMap<PurchaseId, PurchaseOrder>,
    pub shipments: HashMap<ShipmentId, Shipment>,
    pub moves: HashMap<MoveId, Move>,
    pub invoices: HashMap<InvoiceId, Invoice>,
    #[serde(default)]
    pub sale_configuration: SaleConfiguration,
    #[serde(default)]
    sequence: u64,
}

impl ErpState {
    /// Next document number with the given prefix.
    fn next_number(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{prefix}{}", self.sequence)
    }

    fn stock_move(&self, id: MoveId) -> DomainResult<&Move> {
        self.moves
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("move {id}")))
    }

    fn stock_move_mut(&mut self, id: MoveId) -> DomainResult<&mut Move> {
        self.moves
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("move {id}")))
    }

    fn shipment(&self, id: ShipmentId) -> DomainResult<&Shipment> {
        self.shipments
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("shipment {id}")))
    }

    fn shipment_mut(&mut self, id: ShipmentId) -> DomainResult<&mut Shipment> {
        self.shipments
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("shipment {id}")))
    }

    fn invoice(&self, id: InvoiceId) -> DomainResult<&Invoice> {
        self.invoices
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("invoice {id}")))
    }

    fn invoice_mut(&mut self, id: InvoiceId) -> DomainResult<&mut Invoice> {
        self.invoices
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("invoice {id}")))
    }

    fn product(&self, id: ProductId) -> DomainResult<&Product> {
        self.products
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("product {id}")))
    }
}

/// In-memory ERP.
///
/// Intended for tests and offline runs against a JSON state dump. Not
/// optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryErp {
    state: RwLock<ErpState>,
}

impl InMemoryErp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: ErpState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Load a state dump written by [`InMemoryErp::save_json`].
    pub fn load_json(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading ERP state from {}", path.display()))?;
        let state: ErpState = serde_json::from_str(&raw)
            .with_context(|| format!("parsing ERP state from {}", path.display()))?;
        Ok(Self::from_state(state))
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let raw = serde_json::to_string_pretty(&*self.read())
            .context("serializing ERP state")?;
        std::fs::write(path, raw)
            .with_context(|| format!("writing ERP state to {}", path.display()))?;
        Ok(())
    }

    /// Copy of the whole state.
    pub fn snapshot(&self) -> ErpState {
        self.read().clone()
    }

    pub fn sale_configuration(&self) -> SaleConfiguration {
        self.read().sale_configuration
    }

    pub fn set_sale_configuration(&self, configuration: SaleConfiguration) {
        self.write().sale_configuration = configuration;
    }

    pub fn add_uom(&self, uom: Uom) -> UomId {
        self.write().uoms.insert(uom)
    }

    pub fn add_product(&self, product: Product) -> ProductId {
        let id = product.id;
        self.write().products.insert(id, product);
        id
    }

    fn read(&self) -> RwLockReadGuard<'_, ErpState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ErpState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UnitOfWork for InMemoryErp {
    fn atomically<T, E>(&self, work: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let before = self.read().clone();
        let result = work();
        if result.is_err() {
            debug!("unit of work failed, rolling back");
            *self.write() = before;
        }
        result
    }
}

impl ProductCatalog for InMemoryErp {
    fn product(&self, id: ProductId) -> DomainResult<Product> {
        self.read().product(id).cloned()
    }
}

impl UomConverter for InMemoryErp {
    fn compute_qty(
        &self,
        from: UomId,
        quantity: f64,
        to: UomId,
        round: bool,
    ) -> DomainResult<f64> {
        self.read().uoms.compute_qty(from, quantity, to, round)
    }
}
