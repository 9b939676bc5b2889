#![allow(dead_code)]

use chrono::NaiveDate;

use forgeerp_core::CompanyId;
use forgeerp_infra::InMemoryErp;
use forgeerp_products::{Product, ProductId, Uom, UomCategoryId, UomId};
use forgeerp_purchasing::{PurchaseId, PurchaseLine, PurchaseOrder};
use forgeerp_revoke::{SaleExceptionSource, StockService};
use forgeerp_sales::{SaleId, SaleLine, SaleOrder};
use forgeerp_stock::{Move, Shipment};

/// An ERP with one company, units and a stockable product.
pub struct Fixture {
    pub erp: InMemoryErp,
    pub company: CompanyId,
    pub unit: UomId,
    pub dozen: UomId,
    pub widget: ProductId,
}

impl Fixture {
    pub fn new() -> Self {
        let erp = InMemoryErp::new();
        let category = UomCategoryId::generate();
        let unit = erp.add_uom(Uom::new("Unit", "u", category, 1.0));
        let dozen = erp.add_uom(Uom::new("Dozen", "dz", category, 12.0));
        let widget = erp.add_product(Product::new("Widget", unit).with_purchase_uom(dozen));
        Self {
            erp,
            company: CompanyId::new(),
            unit,
            dozen,
            widget,
        }
    }

    pub fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    /// Draft sale of `quantity` widgets followed by a comment line.
    pub fn draft_sale(&self, quantity: f64) -> SaleOrder {
        let mut sale = SaleOrder::new(self.company);
        sale.sale_date = Some(Self::date(1));
        sale.add_line(SaleLine::product_line(self.widget, "Widget", quantity, self.unit, 250))
            .unwrap();
        sale.add_line(SaleLine::comment("Deliver to the back door"))
            .unwrap();
        sale
    }

    /// Confirm and process `sale`.
    pub fn process_sale(&self, sale: SaleOrder) -> SaleId {
        let id = self.erp.add_sale(sale);
        self.erp.confirm_sale(id).unwrap();
        self.erp.process(id).unwrap();
        id
    }

    pub fn processed_sale(&self, quantity: f64) -> SaleId {
        self.process_sale(self.draft_sale(quantity))
    }

    /// Confirmed and processed purchase of `quantity` widgets, in units.
    pub fn processed_purchase(&self, quantity: f64) -> PurchaseId {
        let mut purchase = PurchaseOrder::new(self.company);
        purchase
            .add_line(PurchaseLine::product_line(self.widget, "Widget", quantity, self.unit, 90))
            .unwrap();
        let id = self.erp.add_purchase(purchase);
        self.erp.confirm_purchase(id).unwrap();
        self.erp.process_purchase(id).unwrap();
        id
    }

    pub fn first_shipment(&self, sale: SaleId) -> Shipment {
        let sale = self.erp.sale(sale).unwrap();
        self.erp.shipment(sale.shipments[0]).unwrap()
    }

    pub fn moves_of(&self, ids: &[forgeerp_stock::MoveId]) -> Vec<Move> {
        ids.iter()
            .map(|id| self.erp.stock_move(*id).unwrap())
            .collect()
    }
}
