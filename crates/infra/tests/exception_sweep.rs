mod common;

use common::Fixture;
use forgeerp_core::{CompanyId, OrderState, Resolution};
use forgeerp_infra::InMemoryErp;
use forgeerp_invoicing::InvoiceState;
use forgeerp_products::Product;
use forgeerp_revoke::{ExceptionSweep, InvoiceService, StockService, SweepConfig, SweepStep};
use forgeerp_sales::{SaleConfiguration, SaleId, SaleInvoiceState, SaleLine, SaleShipmentState};
use forgeerp_stock::ShipmentState;

/// Processed sale whose waiting shipment was cancelled by the warehouse.
fn sale_in_exception(fx: &Fixture, day: u32) -> SaleId {
    let mut draft = fx.draft_sale(5.0);
    draft.sale_date = Some(Fixture::date(day));
    let sale = fx.process_sale(draft);
    let shipment = fx.first_shipment(sale).id;
    fx.erp.draft_shipments(&[shipment]).unwrap();
    fx.erp.cancel_shipments(&[shipment]).unwrap();
    sale
}

/// Processed sale of 10 widgets with 2 taken back, whose return was cancelled.
fn sale_with_cancelled_return(fx: &Fixture) -> SaleId {
    let mut draft = fx.draft_sale(10.0);
    draft
        .add_line(SaleLine::product_line(fx.widget, "Widget", -2.0, fx.unit, 250))
        .unwrap();
    let sale = fx.process_sale(draft);
    let ret = fx.erp.sale(sale).unwrap().shipment_returns[0];
    fx.erp.cancel_shipments(&[ret]).unwrap();
    sale
}

fn config(fx: &Fixture) -> SweepConfig {
    SweepConfig::new(fx.company, &fx.erp.sale_configuration())
}

#[test]
fn cancelled_shipment_puts_the_sale_in_exception() {
    let fx = Fixture::new();
    let sale = sale_in_exception(&fx, 1);
    assert_eq!(
        fx.erp.sale(sale).unwrap().shipment_state,
        SaleShipmentState::Exception
    );
}

#[test]
fn old_exceptions_are_fixed() {
    let fx = Fixture::new();
    let sale = sale_in_exception(&fx, 1);

    let report = ExceptionSweep::new(&fx.erp, config(&fx))
        .run(Fixture::date(20))
        .unwrap();
    assert_eq!(report.selected, vec![sale]);
    assert_eq!(report.fixed, vec![sale]);
    assert!(report.skipped.is_empty());

    let fixed = fx.erp.sale(sale).unwrap();
    assert_eq!(fixed.state(), OrderState::Processing);
    assert_eq!(fixed.shipment_state, SaleShipmentState::Sent);
    assert_eq!(fixed.invoice_state, SaleInvoiceState::None);
    let mv = fx.erp.stock_move(fixed.lines()[0].moves[0]).unwrap();
    assert_eq!(mv.resolution, Resolution::Ignored);
    let invoice = fx.erp.invoice(fixed.invoices[0]).unwrap();
    assert_eq!(invoice.state, InvoiceState::Cancelled);
    assert_eq!(invoice.resolution, Resolution::Ignored);
}

#[test]
fn recent_exceptions_wait_for_the_margin() {
    let fx = Fixture::new();
    let old = sale_in_exception(&fx, 1);
    let recent = sale_in_exception(&fx, 15);

    let report = ExceptionSweep::new(&fx.erp, config(&fx))
        .run(Fixture::date(20))
        .unwrap();
    assert_eq!(report.selected, vec![old]);
    assert_eq!(
        fx.erp.sale(recent).unwrap().shipment_state,
        SaleShipmentState::Exception
    );

    fx.erp.set_sale_configuration(SaleConfiguration {
        sale_exception_margin: Some(3),
    });
    let report = ExceptionSweep::new(&fx.erp, config(&fx))
        .run(Fixture::date(20))
        .unwrap();
    assert_eq!(report.selected, vec![recent]);
}

#[test]
fn other_companies_are_not_swept() {
    let fx = Fixture::new();
    sale_in_exception(&fx, 1);
    let elsewhere = SweepConfig::new(CompanyId::new(), &SaleConfiguration::default());

    let report = ExceptionSweep::new(&fx.erp, elsewhere)
        .run(Fixture::date(20))
        .unwrap();
    assert!(report.selected.is_empty());
}

#[test]
fn a_failing_sale_is_skipped_and_the_others_fixed() {
    let fx = Fixture::new();
    let broken = {
        let mut draft = fx.draft_sale(2.0);
        let gadget = fx.erp.add_product(Product::new("Gadget", fx.unit));
        draft
            .add_line(SaleLine::product_line(gadget, "Gadget", 1.0, fx.unit, 10))
            .unwrap();
        let sale = fx.process_sale(draft);
        let shipment = fx.first_shipment(sale).id;
        fx.erp.draft_shipments(&[shipment]).unwrap();
        fx.erp.cancel_shipments(&[shipment]).unwrap();
        (sale, gadget)
    };
    let healthy = sale_in_exception(&fx, 2);

    let mut state = fx.erp.snapshot();
    state.products.remove(&broken.1);
    let erp = InMemoryErp::from_state(state);

    let report = ExceptionSweep::new(&erp, config(&fx))
        .run(Fixture::date(20))
        .unwrap();
    assert_eq!(report.selected, vec![broken.0, healthy]);
    assert_eq!(report.fixed, vec![healthy]);
    assert_eq!(report.skipped.len(), 1);
    let (sale, step, error) = &report.skipped[0];
    assert_eq!(*sale, broken.0);
    assert_eq!(*step, SweepStep::Process);
    assert!(error.contains("product"), "{error}");

    assert_eq!(
        erp.sale(broken.0).unwrap().shipment_state,
        SaleShipmentState::Exception
    );
}

#[test]
fn failed_validation_does_not_stop_the_sale() {
    let fx = Fixture::new();
    let sale = sale_with_cancelled_return(&fx);
    let shipment = fx.first_shipment(sale);
    let backorder = fx
        .erp
        .complete_shipment(shipment.id, &[(shipment.outgoing_moves[0], 3.0)])
        .unwrap()
        .unwrap();
    fx.erp.assign_shipment(backorder).unwrap();
    assert_eq!(
        fx.erp.sale(sale).unwrap().shipment_state,
        SaleShipmentState::Exception
    );

    let report = ExceptionSweep::new(&fx.erp, config(&fx))
        .run(Fixture::date(20))
        .unwrap();
    assert_eq!(report.fixed, vec![sale]);
    assert!(report.skipped.is_empty());

    assert_eq!(
        fx.erp.shipment(backorder).unwrap().state,
        ShipmentState::Assigned
    );
    let swept = fx.erp.sale(sale).unwrap();
    let returned = fx.erp.stock_move(swept.lines()[2].moves[0]).unwrap();
    assert_eq!(returned.resolution, Resolution::Ignored);
    assert_eq!(swept.shipment_state, SaleShipmentState::Waiting);
}

#[test]
fn failed_shipment_handling_skips_the_invoices() {
    let fx = Fixture::new();
    let sale = sale_with_cancelled_return(&fx);
    let shipment = fx.first_shipment(sale);
    let invoice = fx.erp.sale(sale).unwrap().invoices[0];

    let mut state = fx.erp.snapshot();
    state.moves.remove(&shipment.inventory_moves[0]);
    let erp = InMemoryErp::from_state(state);

    let report = ExceptionSweep::new(&erp, config(&fx))
        .run(Fixture::date(20))
        .unwrap();
    assert!(report.fixed.is_empty());
    let (skipped, step, error) = &report.skipped[0];
    assert_eq!(*skipped, sale);
    assert_eq!(*step, SweepStep::Shipment);
    assert!(error.contains("move"), "{error}");

    assert_eq!(erp.shipment(shipment.id).unwrap().state, ShipmentState::Waiting);
    let invoice = erp.invoice(invoice).unwrap();
    assert_eq!(invoice.state, InvoiceState::Draft);
    assert_eq!(invoice.resolution, Resolution::Unclassified);
    assert_eq!(
        erp.sale(sale).unwrap().shipment_state,
        SaleShipmentState::Exception
    );
}

#[test]
fn failed_invoice_handling_keeps_the_shipment_fix() {
    let fx = Fixture::new();
    let sale = sale_with_cancelled_return(&fx);
    let invoice = fx.erp.sale(sale).unwrap().invoices[0];

    // The same invoice listed twice cannot be reconciled twice.
    let mut state = fx.erp.snapshot();
    state.sales.get_mut(&sale).unwrap().invoices.push(invoice);
    let erp = InMemoryErp::from_state(state);

    let report = ExceptionSweep::new(&erp, config(&fx))
        .run(Fixture::date(20))
        .unwrap();
    assert!(report.fixed.is_empty());
    let (skipped, step, error) = &report.skipped[0];
    assert_eq!(*skipped, sale);
    assert_eq!(*step, SweepStep::Invoice);
    assert!(error.contains("already reconciled"), "{error}");

    let swept = erp.sale(sale).unwrap();
    assert_eq!(swept.shipment_state, SaleShipmentState::Sent);
    let invoice = erp.invoice(invoice).unwrap();
    assert_eq!(invoice.state, InvoiceState::Draft);
    assert_eq!(invoice.resolution, Resolution::Unclassified);
}
