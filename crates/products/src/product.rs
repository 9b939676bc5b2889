use serde::{Deserialize, Serialize};

use forgeerp_core::{Entity, record_id};

use crate::uom::UomId;

record_id!(
    /// Product identifier.
    ProductId
);

/// Product kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    #[default]
    Goods,
    Assets,
    Service,
}

/// Catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub code: Option<String>,
    pub name: String,
    pub kind: ProductKind,
    pub default_uom: UomId,
    /// Unit used on sale lines. Falls back to `default_uom`.
    pub sale_uom: Option<UomId>,
    /// Unit used on purchase lines. Falls back to `default_uom`.
    pub purchase_uom: Option<UomId>,
}

impl Product {
    pub fn new(name: impl Into<String>, default_uom: UomId) -> Self {
        Self {
            id: ProductId::generate(),
            code: None,
            name: name.into(),
            kind: ProductKind::Goods,
            default_uom,
            sale_uom: None,
            purchase_uom: None,
        }
    }

    pub fn with_sale_uom(mut self, uom: UomId) -> Self {
        self.sale_uom = Some(uom);
        self
    }

    pub fn with_purchase_uom(mut self, uom: UomId) -> Self {
        self.purchase_uom = Some(uom);
        self
    }

    pub fn with_kind(mut self, kind: ProductKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn sale_uom(&self) -> UomId {
        self.sale_uom.unwrap_or(self.default_uom)
    }

    pub fn purchase_uom(&self) -> UomId {
        self.purchase_uom.unwrap_or(self.default_uom)
    }

    pub fn is_stockable(&self) -> bool {
        !matches!(self.kind, ProductKind::Service)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn rec_name(&self) -> String {
        match &self.code {
            Some(code) => format!("[{code}] {}", self.name),
            None => self.name.clone(),
        }
    }
}
