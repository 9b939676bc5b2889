mod common;

use common::Fixture;
use forgeerp_core::{OrderState, Resolution};
use forgeerp_invoicing::InvoiceState;
use forgeerp_revoke::{
    InvoiceService, RevokeError, RevokeOptions, Revoker, StockService, ignored_moves,
};
use forgeerp_sales::{SaleInvoiceState, SaleOrder, SaleShipmentState, ShipmentMethod};
use forgeerp_stock::{MoveState, ShipmentState};

#[test]
fn revoking_a_partially_shipped_sale_ignores_the_backorder() {
    let fx = Fixture::new();
    let sale = fx.processed_sale(10.0);
    let shipment = fx.first_shipment(sale);
    let backorder = fx
        .erp
        .complete_shipment(shipment.id, &[(shipment.outgoing_moves[0], 3.0)])
        .unwrap()
        .unwrap();
    assert_eq!(
        fx.erp.sale(sale).unwrap().shipment_state,
        SaleShipmentState::Waiting
    );

    let outcome = Revoker::new(&fx.erp)
        .revoke::<SaleOrder>(&[sale], RevokeOptions::default())
        .unwrap();
    assert_eq!(outcome[0].cancelled_shipments, 1);
    assert_eq!(outcome[0].ignored_moves, 1);

    let revoked = fx.erp.sale(sale).unwrap();
    assert_eq!(revoked.state(), OrderState::Done);
    assert_eq!(revoked.shipment_state, SaleShipmentState::Sent);
    assert_eq!(
        fx.erp.shipment(backorder).unwrap().state,
        ShipmentState::Cancelled
    );

    let ignored = ignored_moves(&fx.erp, &revoked).unwrap();
    assert_eq!(ignored.len(), 1);
    assert_eq!(ignored[0].quantity, 7.0);
    assert_eq!(ignored[0].state, MoveState::Cancelled);
}

#[test]
fn assigned_shipment_blocks_the_revocation() {
    let fx = Fixture::new();
    let sale = fx.processed_sale(10.0);
    let shipment = fx.first_shipment(sale);
    fx.erp.assign_shipment(shipment.id).unwrap();

    let err = Revoker::new(&fx.erp)
        .revoke::<SaleOrder>(&[sale], RevokeOptions::default())
        .unwrap_err();
    match err {
        RevokeError::MovesInProgress { record, names } => {
            assert_eq!(record, fx.erp.sale(sale).unwrap().number.unwrap());
            assert!(names.contains("10 Widget"), "{names}");
            assert!(names.ends_with(&shipment.number), "{names}");
        }
        other => panic!("unexpected error: {other}"),
    }

    let untouched = fx.erp.sale(sale).unwrap();
    assert_eq!(untouched.state(), OrderState::Processing);
    assert_eq!(untouched.shipment_state, SaleShipmentState::Waiting);
    assert_eq!(
        fx.erp.shipment(shipment.id).unwrap().state,
        ShipmentState::Assigned
    );
}

#[test]
fn draft_sales_cannot_be_revoked() {
    let fx = Fixture::new();
    let sale = fx.erp.add_sale(fx.draft_sale(1.0));

    let err = Revoker::new(&fx.erp)
        .revoke::<SaleOrder>(&[sale], RevokeOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        RevokeError::NotRevocable {
            state: OrderState::Draft,
            ..
        }
    ));
}

#[test]
fn confirmed_sales_are_finished_directly() {
    let fx = Fixture::new();
    let sale = fx.erp.add_sale(fx.draft_sale(2.0));
    fx.erp.confirm_sale(sale).unwrap();

    let outcome = Revoker::new(&fx.erp)
        .revoke::<SaleOrder>(&[sale], RevokeOptions::default())
        .unwrap();
    assert_eq!(outcome[0].ignored_moves, 0);
    assert_eq!(fx.erp.sale(sale).unwrap().state(), OrderState::Done);
}

#[test]
fn managed_invoices_are_cancelled_and_ignored() {
    let fx = Fixture::new();
    let mut draft = fx.draft_sale(4.0);
    draft.shipment_method = ShipmentMethod::Invoice;
    let sale = fx.process_sale(draft);
    let invoice = fx.erp.sale(sale).unwrap().invoices[0];

    let outcome = Revoker::new(&fx.erp)
        .revoke::<SaleOrder>(
            &[sale],
            RevokeOptions {
                manage_invoices: true,
            },
        )
        .unwrap();
    assert_eq!(outcome[0].cancelled_invoices, 1);
    assert_eq!(outcome[0].ignored_invoices, 1);

    let revoked = fx.erp.sale(sale).unwrap();
    assert_eq!(revoked.state(), OrderState::Done);
    assert_eq!(revoked.invoice_state, SaleInvoiceState::None);
    assert_eq!(revoked.invoices, vec![invoice]);
    let invoice = fx.erp.invoice(invoice).unwrap();
    assert_eq!(invoice.state, InvoiceState::Cancelled);
    assert_eq!(invoice.resolution, Resolution::Ignored);
    assert_eq!(invoice.stock_moves().count(), 0);
}

#[test]
fn invoices_are_left_alone_unless_managed() {
    let fx = Fixture::new();
    let sale = fx.processed_sale(4.0);
    let invoice = fx.erp.sale(sale).unwrap().invoices[0];

    Revoker::new(&fx.erp)
        .revoke::<SaleOrder>(&[sale], RevokeOptions::default())
        .unwrap();
    assert_eq!(fx.erp.invoice(invoice).unwrap().state, InvoiceState::Draft);
    assert_eq!(
        fx.erp.sale(sale).unwrap().invoice_state,
        SaleInvoiceState::Pending
    );
}

#[test]
fn validated_invoice_blocks_a_managed_revocation() {
    let fx = Fixture::new();
    let sale = fx.processed_sale(4.0);
    let invoice = fx.erp.sale(sale).unwrap().invoices[0];
    fx.erp.validate_invoice(invoice).unwrap();

    let err = Revoker::new(&fx.erp)
        .revoke::<SaleOrder>(
            &[sale],
            RevokeOptions {
                manage_invoices: true,
            },
        )
        .unwrap_err();
    assert!(matches!(err, RevokeError::InvoicesInProgress { .. }));
    assert_eq!(fx.erp.sale(sale).unwrap().state(), OrderState::Processing);
    assert_eq!(
        fx.erp.invoice(invoice).unwrap().state,
        InvoiceState::Validated
    );
}

#[test]
fn shipments_and_invoices_are_revoked_together() {
    let fx = Fixture::new();
    let sale = fx.processed_sale(6.0);
    let before = fx.erp.sale(sale).unwrap();
    let shipment = before.shipments[0];

    Revoker::new(&fx.erp)
        .revoke::<SaleOrder>(
            &[sale],
            RevokeOptions {
                manage_invoices: true,
            },
        )
        .unwrap();

    let revoked = fx.erp.sale(sale).unwrap();
    assert_eq!(revoked.state(), OrderState::Done);
    assert_eq!(revoked.shipment_state, SaleShipmentState::Sent);
    assert_eq!(revoked.invoice_state, SaleInvoiceState::None);
    let shipment = fx.erp.shipment(shipment).unwrap();
    assert_eq!(shipment.state, ShipmentState::Cancelled);
    for mv in fx.moves_of(&shipment.inventory_moves) {
        assert_eq!(mv.state, MoveState::Cancelled);
        assert_eq!(mv.resolution, Resolution::Unclassified);
    }
    for mv in fx.moves_of(&revoked.lines()[0].moves) {
        assert_eq!(mv.resolution, Resolution::Ignored);
    }
}

#[test]
fn a_failing_order_stops_the_batch_and_keeps_earlier_revocations() {
    let fx = Fixture::new();
    let first = fx.processed_sale(1.0);
    let blocked = fx.processed_sale(2.0);
    let last = fx.processed_sale(3.0);
    fx.erp
        .assign_shipment(fx.first_shipment(blocked).id)
        .unwrap();

    let result = Revoker::new(&fx.erp)
        .revoke::<SaleOrder>(&[first, blocked, last], RevokeOptions::default());
    assert!(matches!(result, Err(RevokeError::MovesInProgress { .. })));

    assert_eq!(fx.erp.sale(first).unwrap().state(), OrderState::Done);
    assert_eq!(fx.erp.sale(blocked).unwrap().state(), OrderState::Processing);
    assert_eq!(fx.erp.sale(last).unwrap().state(), OrderState::Processing);
    assert_eq!(
        fx.first_shipment(last).state,
        ShipmentState::Waiting
    );
}
